//! CLI module for savkit
//!
//! Provides command-line interface for:
//! - dict: Describe a file's variables
//! - dump: Print a file's variables and rows as a table
//! - import: Write a JSON table (file or stdin) to a new file
//! - copy-dict: Create an empty file with another file's dictionary

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{copy_dictionary, describe, dump, import, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
