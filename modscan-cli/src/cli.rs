//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// modscan -- JAR module identity scanner.
///
/// Use `modscan <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "modscan", version, about, long_about = None)]
pub struct Cli {
    /// Path to the modscan.toml configuration file (defaults apply when omitted).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
    /// Markdown document.
    Markdown,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan JAR files and classify their module names.
    Scan(ScanArgs),

    /// Show the module identity of a single JAR.
    Describe(DescribeArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Scan directories of JARs (one level deep) or individual JAR files.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directories or JAR files to scan. Each directory is one scan object.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Local Maven repository used to resolve parent POMs.
    #[arg(long)]
    pub repository: Option<String>,

    /// Known module database (module.name=group:artifact[:version]).
    #[arg(long)]
    pub known: Option<String>,

    /// Accept module names derived from the file name.
    #[arg(long)]
    pub accept_file_name_derived: bool,

    /// Group alias, e.g. `io.projectreactor=reactor` (repeatable).
    #[arg(long = "alias", value_name = "GROUP=PREFIX")]
    pub aliases: Vec<String>,

    /// Number of concurrent analyses.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Label of the last object processed by a previous run (shown in the report).
    #[arg(long)]
    pub started_after: Option<String>,
}

// ---- describe ----

/// Resolve the module identity of a single JAR without coordinate lookup.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// JAR file to inspect.
    pub jar: PathBuf,

    /// Accept a module name derived from the file name.
    #[arg(long)]
    pub accept_file_name_derived: bool,
}

// ---- config ----

/// Manage modscan configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, scanner).
        #[arg(long)]
        section: Option<String>,
    },
}
