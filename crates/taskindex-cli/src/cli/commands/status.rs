//! Implementation of `taskindex status`.

use std::process::ExitCode;

use taskindex::TaskField;
use taskindex_config::discover_config_files;

use crate::cli::context::{CommandContext, error_exit};

/// Shows config files, effective settings and validation warnings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config_files = discover_config_files(&ctx.cwd);
    if config_files.is_empty() {
        println!("No configuration files found; using defaults.");
    } else {
        println!("Config files:");
        for path in &config_files {
            println!("   {}", path.display());
        }
    }
    println!();

    let config = &ctx.config;
    match config.settings_to_toml() {
        Ok(settings) => println!("{}", settings.trim_end()),
        Err(e) => {
            eprintln!("error: failed to render settings: {e}");
            return error_exit();
        }
    }
    println!();

    match &config.index.location {
        Some(path) => println!("Index location: {}", path.display()),
        None => println!("Index location: memory (pass --index to persist)"),
    }
    println!();

    let mut warnings: Vec<String> = config.validate().iter().map(ToString::to_string).collect();
    let field = &config.index.default_field;
    if !field.trim().is_empty() && TaskField::from_name(field).is_none() {
        warnings.push(format!("default_field = \"{field}\" is not a known field"));
    }

    if warnings.is_empty() {
        println!("No issues found.");
        return ExitCode::SUCCESS;
    }

    println!("Warnings ({}):", warnings.len());
    for warning in &warnings {
        println!("   {warning}");
    }
    ExitCode::FAILURE
}
