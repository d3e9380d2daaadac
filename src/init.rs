use crate::device::EcsDevice;
use crate::env::{
    env_opt, env_or, ECS_LOG_CONSOLE_ENV, ECS_LOG_DATETIME_FORMAT_ENV,
    ECS_LOG_ERROR_BACKTRACES_ENV, ECS_LOG_MAX_MESSAGE_LENGTH_ENV, ECS_LOG_PROGNAME_ENV,
};
use crate::error::{ConfigError, InitError};
use crate::layer::EcsLayer;
use crate::mapper::{EcsMapper, DEFAULT_DATETIME_FORMAT};
use crate::options::FormatterOptions;
use std::num::NonZeroUsize;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the ECS logging layer.
///
/// **Fields**
/// - `datetime_format`: strftime format of `@timestamp`. A literal `Z` in it
///   makes the timestamp render from the UTC instant.
/// - `max_message_length`: messages longer than this many characters are cut.
/// - `progname`: value reported as `process.name`.
/// - `max_level`: most verbose level that is written.
/// - `error_backtraces`: attach the call-site backtrace to error fields.
/// - `enable_console`: if `true`, a `tracing_subscriber::fmt::Layer` printing
///   human-readable lines to stderr is installed next to the ECS layer.
#[derive(Clone, Debug)]
pub struct EcsConfig {
    pub datetime_format: String,
    pub max_message_length: Option<usize>,
    pub progname: Option<String>,
    pub max_level: Level,
    pub error_backtraces: bool,
    pub enable_console: bool,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            max_message_length: None,
            progname: None,
            max_level: Level::INFO,
            error_backtraces: false,
            enable_console: false,
        }
    }
}

impl EcsConfig {
    /// Build a configuration from the `ECS_LOG_*` environment variables,
    /// falling back to [`EcsConfig::default`] for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_message_length = match env_opt(ECS_LOG_MAX_MESSAGE_LENGTH_ENV) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidMaxMessageLength(raw.clone()))?,
            ),
            None => None,
        };

        let enable_console = env_flag(ECS_LOG_CONSOLE_ENV);
        let error_backtraces = env_flag(ECS_LOG_ERROR_BACKTRACES_ENV);

        Ok(Self {
            datetime_format: env_or(ECS_LOG_DATETIME_FORMAT_ENV, &defaults.datetime_format),
            max_message_length,
            progname: env_opt(ECS_LOG_PROGNAME_ENV).or(defaults.progname),
            max_level: defaults.max_level,
            error_backtraces,
            enable_console,
        })
    }

    /// Build the mapper described by this configuration.
    ///
    /// **Returns**
    /// - `Err(ConfigError::InvalidMaxMessageLength)` for a length of zero.
    /// - `Err(ConfigError::InvalidDatetimeFormat)` for an unusable format.
    pub fn mapper(&self) -> Result<EcsMapper, ConfigError> {
        let mut options = FormatterOptions::default();
        if let Some(length) = self.max_message_length {
            let length = NonZeroUsize::new(length)
                .ok_or_else(|| ConfigError::InvalidMaxMessageLength(length.to_string()))?;
            options = options.with_max_message_length(length);
        }
        EcsMapper::new(options, self.datetime_format.clone())
    }
}

fn env_flag(key: &str) -> bool {
    matches!(
        env_or(key, "false").trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Initialize the global `tracing` subscriber with an ECS layer writing
/// JSON lines to stdout.
///
/// **Parameters**
/// - `config`: [`EcsConfig`] controlling the mapper and the layer.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`EcsLayer`] (and optionally a
/// `fmt` layer on stderr) as the global default subscriber.
pub fn init_tracing_with_config(config: EcsConfig) -> Result<(), InitError> {
    let mapper = config.mapper()?;
    let mut layer = EcsLayer::new(EcsDevice::json_lines(mapper, std::io::stdout()))
        .with_max_level(config.max_level)
        .with_error_backtraces(config.error_backtraces);
    if let Some(progname) = &config.progname {
        layer = layer.with_progname(progname.clone());
    }

    // The two branches produce different subscriber types.
    if config.enable_console {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Initialize tracing from the `ECS_LOG_*` environment variables.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`EcsConfig::from_env`]. This is the recommended entrypoint for typical
/// services.
pub fn init_tracing() -> Result<(), InitError> {
    init_tracing_with_config(EcsConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_a_utc_mapper() {
        let mapper = EcsConfig::default().mapper().unwrap();
        assert!(mapper.normalizes_to_utc());
        assert_eq!(mapper.options().max_message_length, None);
    }

    #[test]
    fn zero_message_length_is_rejected() {
        let config = EcsConfig {
            max_message_length: Some(0),
            ..EcsConfig::default()
        };
        assert!(matches!(
            config.mapper(),
            Err(ConfigError::InvalidMaxMessageLength(_))
        ));
    }

    #[test]
    fn message_length_reaches_the_mapper() {
        let config = EcsConfig {
            max_message_length: Some(80),
            ..EcsConfig::default()
        };
        let mapper = config.mapper().unwrap();
        assert_eq!(mapper.options().max_message_length, NonZeroUsize::new(80));
    }

    #[test]
    fn error_backtraces_follow_the_environment() {
        std::env::set_var(ECS_LOG_ERROR_BACKTRACES_ENV, "Yes");
        assert!(EcsConfig::from_env().unwrap().error_backtraces);
        std::env::set_var(ECS_LOG_ERROR_BACKTRACES_ENV, "off");
        assert!(!EcsConfig::from_env().unwrap().error_backtraces);
        std::env::remove_var(ECS_LOG_ERROR_BACKTRACES_ENV);
        assert!(!EcsConfig::default().error_backtraces);
    }
}
