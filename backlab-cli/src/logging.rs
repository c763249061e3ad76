//! Subscriber setup. Logs go to stderr so stdout stays machine-readable.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human-oriented output
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// `-v` forces `debug`, `-q` forces `warn`; otherwise `RUST_LOG`, then `info`.
pub fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

pub fn init(format: LogFormat, verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, quiet))
        .with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}
