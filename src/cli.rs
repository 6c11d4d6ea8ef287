use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "tile-widgets",
    version,
    about = "Local widget computation over in-memory map tiles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (error|warn|info|debug|trace)
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the tiles of a request file and compute its widgets.
    Run(RunArgs),
    /// Check an expression against a set of symbol names.
    ValidateExpr(ValidateExprArgs),
    /// Evaluate an expression with numbers or columns bound to its symbols.
    EvalExpr(EvalExprArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    pub request: PathBuf,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub output: ReportFormat,
}

#[derive(Debug, Args)]
pub struct ValidateExprArgs {
    pub expression: String,

    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,
}

#[derive(Debug, Args)]
pub struct EvalExprArgs {
    pub expression: String,

    /// Binding as name=value or name=v1,v2,... (repeatable)
    #[arg(long = "var")]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Ndjson,
}
