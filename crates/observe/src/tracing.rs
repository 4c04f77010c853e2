use {
    crate::{Config, panic_hook},
    std::{io::IsTerminal as _, sync::Once},
    time::macros::format_description,
    tracing_subscriber::{EnvFilter, Layer, fmt::time::UtcTime, prelude::*},
};

/// Initializes the global tracing subscriber and the panic hook.
///
/// All log output goes to stderr. Stdout is left to the program's actual
/// results so they can be piped into other tools.
///
/// # Panics
///
/// Panics if a global subscriber was already installed.
pub fn initialize(config: &Config) {
    set_tracing_subscriber(config);
    panic_hook::install();
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(env_filter: &str) {
    // The tracing subscriber below is global object so initializing it again in the
    // same process by a different thread would fail.
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        set_tracing_subscriber(&Config::new(env_filter));
        panic_hook::install();
    });
}

fn set_tracing_subscriber(config: &Config) {
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ));

    let fmt_layer = if config.use_json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_timer(timer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(timer)
            .with_ansi(std::io::stderr().is_terminal())
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(EnvFilter::new(&config.env_filter)))
        .init();
    tracing::debug!(filter = %config.env_filter, "initialized tracing");
}
