use std::env;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `EnvFilter` directive.
pub const LOG_ENV: &str = "CURLSCRUB_LOG";

pub const DEFAULT_LEVEL: &str = "warn";

/// Pick the filter directive: `CURLSCRUB_LOG`, then `-v` count, then the
/// configured level, then `warn`.
pub fn filter_directive(env_value: Option<String>, verbosity: u8, configured: Option<&str>) -> String {
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return value;
    }
    match verbosity {
        0 => configured
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(DEFAULT_LEVEL)
            .to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout only carries
/// command output. Calling this twice is harmless.
pub fn init_logging(verbosity: u8, configured: Option<&str>) {
    let directive = filter_directive(env::var(LOG_ENV).ok(), verbosity, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
