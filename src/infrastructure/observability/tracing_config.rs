/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}

impl TracingConfig {
    /// JSON output follows `LOG_FORMAT=json` unless overridden.
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            json_format: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json_format |= json;
        self
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new(std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()))
    }
}
