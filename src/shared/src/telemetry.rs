use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

// Global one-time initialization for the logging backend
static INIT: Once = Once::new();

/// Install the global fmt subscriber. `RUST_LOG` wins over `level` when set.
pub fn init(level: Level) {
    INIT.call_once(|| {
        install(level, true);
        tracing::info!("Tracing initialized at level = {}", level);
    });
}

/// Same as `init`, but names `component` in the startup line and drops the
/// target column so lines stay short in multi-component logs.
pub fn init_with_component(level: Level, component: &str) {
    INIT.call_once(|| {
        install(level, false);
        tracing::info!(
            "Tracing initialized at level = {} (component={})",
            level,
            component
        );
    });
}

/// Initialize from a textual level such as the one in `LoggingConfig`.
pub fn init_tracing(level: &str) {
    init(parse_level(level));
}

fn install(level: Level, with_target: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    // A global subscriber installed elsewhere (e.g. a test harness) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(with_target)
        .try_init();
}

pub fn parse_level(s: &str) -> Level {
    match s.to_ascii_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}
