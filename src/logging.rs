use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "PROMPTY_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs the stderr log subscriber, filtered by `$PROMPTY_LOG`
/// (`warn` when unset or invalid).
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter_from(std::env::var(LOG_ENV).ok().as_deref()))
        .try_init()?;
    Ok(())
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
