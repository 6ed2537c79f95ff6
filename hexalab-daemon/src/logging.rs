//! Logging initialization for hexalab-daemon.
//!
//! The filter directive is resolved once at startup, in this order:
//! `--log-level` flag, then `RUST_LOG`, then `general.log_level`.
//! Output goes to stdout as JSON lines or pretty text, or to stderr as
//! compact single lines when stdout is reserved for something else.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use hexalab_core::config::GeneralConfig;

/// Output format of the daemon's log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines on stdout.
    Json,
    /// Multi-line human-readable output on stdout.
    Pretty,
    /// Single-line human-readable output on stderr.
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json', 'pretty' or 'compact'",
                other
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        })
    }
}

/// Where the filter directive came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    Flag,
    Env,
    Config,
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub directive: String,
    pub source: FilterSource,
    pub format: LogFormat,
}

impl LogSettings {
    /// Resolve the settings from the config, the `--log-level` flag and the
    /// value of `RUST_LOG`.
    ///
    /// An empty `RUST_LOG` counts as unset.
    pub fn resolve(
        config: &GeneralConfig,
        flag_level: Option<&str>,
        rust_log: Option<String>,
    ) -> Result<Self> {
        let (directive, source) = match (flag_level, rust_log) {
            (Some(level), _) => (level.to_owned(), FilterSource::Flag),
            (None, Some(env)) if !env.trim().is_empty() => (env, FilterSource::Env),
            _ => (config.log_level.clone(), FilterSource::Config),
        };

        // reject bad directives before the subscriber is installed
        EnvFilter::try_new(&directive)
            .with_context(|| format!("invalid log filter '{}'", directive))?;

        Ok(Self {
            directive,
            source,
            format: config.log_format.parse()?,
        })
    }
}

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
pub fn init_tracing(settings: &LogSettings) -> Result<()> {
    let filter = EnvFilter::try_new(&settings.directive)
        .with_context(|| format!("invalid log filter '{}'", settings.directive))?;

    let layer = match settings.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| {
            anyhow::anyhow!(
                "failed to initialize {} tracing subscriber: {}",
                settings.format,
                e
            )
        })?;

    tracing::debug!(
        filter = %settings.directive,
        source = ?settings.source,
        format = %settings.format,
        "tracing initialized"
    );
    Ok(())
}
