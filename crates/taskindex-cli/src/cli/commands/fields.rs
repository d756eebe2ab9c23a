//! Implementation of `taskindex fields`.

use std::process::ExitCode;

use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};
use taskindex::{InMemoryTaskList, suggest};

/// Lists the fields a pattern can name, with what each searches.
pub fn run() -> ExitCode {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Field", "Description"]);

    // Field proposals for an empty word cover every visible field.
    for field in suggest(&InMemoryTaskList::new(), "", 0) {
        table.add_row(vec![field.label, field.description.unwrap_or_default()]);
    }
    println!("{table}");
    ExitCode::SUCCESS
}
