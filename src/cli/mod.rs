//! Command line shared by every plugin binary.
//!
//! ```text
//! <plugin> [-h|--help] [-D|--debug] [-v|--version] <verb> [-e <JSON>] [-k <KEY>]
//! ```
//!
//! Flags may appear before or after the verb.

use clap::{Parser, ValueEnum};
use derive_more::Display;

#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// JSON configuration of the target or store.
    #[arg(long, short = 'e', value_name = "JSON")]
    pub endpoint: Option<String>,

    /// Storage key of a previously stored archive.
    #[arg(long, short = 'k')]
    pub key: Option<String>,

    /// Log debugging information to stderr.
    #[arg(long, short = 'D')]
    pub debug: bool,

    /// Print the plugin name, version and author.
    #[arg(long, short = 'v')]
    pub version: bool,

    /// Action to perform.
    #[arg(value_enum)]
    pub verb: Option<Verb>,
}

/// The actions a plugin can be asked to perform.
#[derive(Copy, Clone, ValueEnum, Debug, Display, PartialEq, Eq)]
pub enum Verb {
    /// Print plugin metadata as JSON.
    #[display("info")]
    Info,
    /// Check the endpoint configuration.
    #[display("validate")]
    Validate,
    /// Write a raw backup of the target to stdout.
    #[display("backup")]
    Backup,
    /// Replay a raw backup read from stdin against the target.
    #[display("restore")]
    Restore,
    /// Persist an archive read from stdin and print its storage key.
    #[display("store")]
    Store,
    /// Write a stored archive to stdout.
    #[display("retrieve")]
    Retrieve,
    /// Delete a stored archive.
    #[display("purge")]
    Purge,
}
