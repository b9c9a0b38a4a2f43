//! CLI argument definitions for nestflat.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "nestflat",
    version,
    about = "Flatten nested block-type fields into composite fields with sub-tables",
    long_about = "Flatten a hierarchical (nested block-type) field into a composite field.\n\n\
                  Every top-level block type keeps its leaf fields; everything nested below\n\
                  it becomes a sub-table on that block type. Content is migrated for every\n\
                  configured locale."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Migrate one hierarchical field of a store snapshot.
    Migrate(MigrateArgs),

    /// Show the fields and record counts of a store snapshot.
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct MigrateArgs {
    /// Store snapshot (JSON) holding the field and its content.
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Id of the hierarchical field to migrate.
    #[arg(long = "field-id", value_name = "ID")]
    pub field_id: u64,

    /// Delete generated fields that received no content.
    #[arg(long = "clean")]
    pub clean: bool,

    /// Keep the source records after migrating them.
    #[arg(long = "keep-source")]
    pub keep_source: bool,

    /// Where to write the migrated snapshot (default: overwrite SNAPSHOT).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Store snapshot (JSON) to inspect.
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
