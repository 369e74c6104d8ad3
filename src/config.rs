use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use encoding_rs::{Encoding, SHIFT_JIS};

use crate::csv_reader::CsvSource;
use crate::error::ConfigError;

/// Input file settings shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Path to the population CSV
    #[arg(short = 'i', long = "input", env = "POPDASH_INPUT", default_value = "c01.csv")]
    pub input: PathBuf,

    /// Text encoding of the CSV (e.g. cp932, shift_jis, utf-8)
    #[arg(short = 'e', long = "encoding", env = "POPDASH_ENCODING", default_value = "cp932")]
    pub encoding: String,
}

impl SourceArgs {
    pub fn source(&self) -> Result<CsvSource, ConfigError> {
        Ok(CsvSource::new(&self.input, resolve_encoding(&self.encoding)?))
    }
}

/// Interactive prefecture population dashboard
#[derive(Debug, Parser)]
#[command(name = "pop_dashboard", version, about)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// File receiving log output while the terminal UI is active
    #[arg(long = "log-file", env = "POPDASH_LOG_FILE", default_value = "pop_dashboard.log")]
    pub log_file: PathBuf,

    /// Input poll interval in milliseconds
    #[arg(long = "tick-rate", default_value_t = 200)]
    pub tick_rate_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Print one dashboard pass without a terminal UI
#[derive(Debug, Parser)]
#[command(name = "pop_report", version, about)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Prefecture to include; repeat for several (default: the first in the file)
    #[arg(short = 'p', long = "prefecture", conflicts_with = "none")]
    pub prefectures: Vec<String>,

    /// Select no prefecture at all
    #[arg(long = "none")]
    pub none: bool,

    /// Year to show (default: the earliest in the file)
    #[arg(short = 'y', long = "year")]
    pub year: Option<i32>,

    #[arg(long = "format", value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Resolve a WHATWG label, also accepting the Windows code page names.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ConfigError> {
    match label.trim().to_ascii_lowercase().as_str() {
        "cp932" | "ms932" | "windows-31j" => Ok(SHIFT_JIS),
        other => Encoding::for_label(other.as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string())),
    }
}
