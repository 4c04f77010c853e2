#[derive(Debug, Clone)]
pub struct Config {
    /// Filters spans and events based on a set of filter directives
    /// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
    pub(crate) env_filter: String,
    /// Output log events as JSON
    pub(crate) use_json_format: bool,
}

impl Config {
    pub fn new(env_filter: &str) -> Self {
        Self {
            env_filter: env_filter.into(),
            use_json_format: false,
        }
    }

    /// Emit one JSON object per log event instead of human readable lines.
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.use_json_format = enabled;
        self
    }
}
