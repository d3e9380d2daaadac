/// Environment variable names used by this crate for convenient
/// configuration of the ECS layer from services.
///
/// These are purely helpers; the mapper and device types remain decoupled
/// from environment access.

/// `@timestamp` strftime format, e.g. `%Y-%m-%dT%H:%M:%S%.3fZ`.
pub const ECS_LOG_DATETIME_FORMAT_ENV: &str = "ECS_LOG_DATETIME_FORMAT";

/// Maximum message length in characters; unset or empty means unlimited.
pub const ECS_LOG_MAX_MESSAGE_LENGTH_ENV: &str = "ECS_LOG_MAX_MESSAGE_LENGTH";

/// Value reported as `process.name`.
pub const ECS_LOG_PROGNAME_ENV: &str = "ECS_LOG_PROGNAME";

/// `true`/`1` to also print human-readable lines to stderr.
pub const ECS_LOG_CONSOLE_ENV: &str = "ECS_LOG_CONSOLE";

/// `true`/`1` to attach call-site backtraces to logged errors.
pub const ECS_LOG_ERROR_BACKTRACES_ENV: &str = "ECS_LOG_ERROR_BACKTRACES";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating unset and blank values alike.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
