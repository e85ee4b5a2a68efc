//! Command-line arguments and logging setup for the `rebate` binary.

use clap::{Args, Parser, ValueEnum};
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Reconcile fixture orders and print their receipts.
#[derive(Debug, Parser)]
#[command(name = "rebate", version)]
pub struct CliArgs {
    /// Fixture set to load products, promotions and orders from
    #[arg(short, long, default_value = "checkout")]
    pub fixture: String,

    /// Order to process; all orders in the set when omitted
    #[arg(short, long)]
    pub order: Option<String>,

    /// Coupon code to enter before saving, replacing any code on the order
    #[arg(short, long)]
    pub coupon: Option<String>,

    /// Drop adjustments that are no longer applicable when recomputing totals
    #[arg(long)]
    pub force: bool,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Install the global tracing subscriber. Logs go to stderr so receipts stay clean.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(logging: &LoggingArgs) -> Result<(), TryInitError> {
    match logging.log_format {
        LogFormat::Compact => init_with_layer(
            logging,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true),
        ),
        LogFormat::Json => init_with_layer(
            logging,
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        ),
    }
}

fn build_env_filter(logging: &LoggingArgs) -> EnvFilter {
    EnvFilter::try_new(&logging.log_level).unwrap_or_else(|_err| EnvFilter::new("warn"))
}

fn init_with_layer<L>(logging: &LoggingArgs, fmt_layer: L) -> Result<(), TryInitError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_env_filter(logging))
        .try_init()
}
