use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Logs go to stderr so that tables printed on stdout stay clean.
///
/// `--verbose` enables debug output for this crate; `RUST_LOG` overrides the
/// level for everything else (e.g. `RUST_LOG=reqwest=trace`).
pub fn init_logging(verbose: bool) {
    let (app_level, default_directive) = if verbose {
        (LevelFilter::DEBUG, "taxrate=debug,warn")
    } else {
        (LevelFilter::ERROR, "error")
    };
    let app_filter = Targets::new()
        .with_target("taxrate", app_level)
        .with_default(LevelFilter::TRACE);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(app_filter)
        .with(env_filter)
        .init();
}
