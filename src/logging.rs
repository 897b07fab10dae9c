use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the stderr log subscriber
///
/// `RUST_LOG` overrides the default filter; `verbose` raises the default
/// from `warn` to `debug` for the Lantern crates.
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "warn,lantern=debug,lantern_core=debug,lantern_rag=debug,lantern_groq=debug,lantern_cli=debug"
    } else {
        "warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
