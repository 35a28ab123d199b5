//! CLI argument definitions using clap
//!
//! Commands:
//! - savkit dict <file>
//! - savkit dump <file>
//! - savkit import <table.json> <out>
//! - savkit copy-dict <source> <out>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// savkit - read and write SPSS-style data files
#[derive(Parser, Debug)]
#[command(name = "savkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Describe the variables of a data file
    Dict {
        /// Data file to read
        file: PathBuf,
    },

    /// Print variables and rows of a data file as a JSON table
    Dump {
        /// Data file to read
        file: PathBuf,
    },

    /// Write a JSON table to a new data file
    Import {
        /// JSON table description, or "-" for stdin
        table: PathBuf,
        /// Data file to create
        out: PathBuf,
    },

    /// Create an empty data file with the dictionary of another
    CopyDict {
        /// Data file whose dictionary is copied
        source: PathBuf,
        /// Data file to create
        out: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
