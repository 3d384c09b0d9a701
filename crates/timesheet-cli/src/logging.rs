use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr log subscriber.
///
/// `TIMESHEET_LOG` takes `RUST_LOG`-style directives; otherwise `level`
/// (the config's `log.level`) applies.
pub fn init(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_env("TIMESHEET_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Ignore a second init; only one global subscriber can be installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
