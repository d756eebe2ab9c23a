//! taskindex: full-text search over task lists.
//!
//! Loads tasks from a JSON file into an in-memory task list, indexes them with
//! the `taskindex` crate, and answers searches, match checks and completion
//! requests from the command line.

#![warn(missing_docs)]

pub mod cli;
