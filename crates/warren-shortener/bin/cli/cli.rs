use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use warren_core::reserved::DEFAULT_RESERVED;
use warren_core::Direction;
use warren_shortener::settings::{DEFAULT_BASE_URL, DEFAULT_NAMESPACE};

pub const NAMESPACE_ENV: &str = "WARREN_NAMESPACE";
pub const RESERVED_ENV: &str = "WARREN_RESERVED";
pub const BASE_URL_ENV: &str = "WARREN_BASE_URL";
pub const MAX_RETRIES_ENV: &str = "WARREN_MAX_RETRIES";
pub const LOG_FORMAT_ENV: &str = "WARREN_LOG_FORMAT";

pub const DEFAULT_MAX_RETRIES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    #[value(name = "most")]
    Most,
    #[value(name = "least")]
    Least,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Most => Direction::Most,
            DirectionArg::Least => Direction::Least,
        }
    }
}

/// Reads shortener commands from stdin, one per line, and runs them against
/// an in-process store.
#[derive(Debug, Parser)]
#[command(name = "warren")]
pub struct CLI {
    #[arg(long, env = NAMESPACE_ENV, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Comma-separated codes that can never be assigned.
    #[arg(
        long,
        env = RESERVED_ENV,
        value_delimiter = ',',
        default_value = DEFAULT_RESERVED
    )]
    pub reserved: Vec<String>,

    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = MAX_RETRIES_ENV, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Print command results as JSON.
    #[arg(long)]
    pub json: bool,
}
