use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Both,
}

impl ExportFormat {
    pub fn csv(self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::Both)
    }

    pub fn json(self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Both)
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "harvest",
    version,
    about = "Harvest every row of a paginated table, resumably",
    long_about = None
)]
pub struct Cli {
    /// DataTables server-side endpoint (overrides the config file)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Identifier of the table to harvest
    #[arg(long = "source")]
    pub source_id: String,

    /// Output prefix; files are written as PREFIX.csv, PREFIX.json and
    /// PREFIX.summary.json. Defaults to a filesystem-safe form of the source id
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// RON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ignore any existing checkpoint and start from scratch
    #[arg(long)]
    pub no_resume: bool,

    /// Keep the checkpoint even after a complete harvest
    #[arg(long)]
    pub keep_checkpoint: bool,

    #[arg(long, value_enum, default_value_t = ExportFormat::Both)]
    pub format: ExportFormat,

    /// Stop after this many pages
    #[arg(long)]
    pub page_limit: Option<u32>,

    /// Rows requested per page
    #[arg(long)]
    pub page_length: Option<u32>,

    /// Also write log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}
