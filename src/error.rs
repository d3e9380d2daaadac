/// Error type returned when mapper or layer configuration is rejected.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid datetime format: {0:?}")]
    InvalidDatetimeFormat(String),

    #[error("invalid max message length: {0:?} (expected a positive integer)")]
    InvalidMaxMessageLength(String),
}

/// Error type returned when a mapped document cannot be written.
#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("failed to serialize ECS document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write ECS document: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type returned by [`init_tracing`](crate::init::init_tracing).
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to install global subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}
