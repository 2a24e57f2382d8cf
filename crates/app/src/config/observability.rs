//! Till log output settings
//!
//! Logs go to stderr; stdout carries receipts and tables.

use clap::Args;

/// How each log line is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// One short line per event, for a cashier's terminal.
    Compact,

    /// One JSON object per event, for shipping register logs elsewhere.
    Json,
}

/// Register logging, read from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `till_app=debug`
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log line format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
