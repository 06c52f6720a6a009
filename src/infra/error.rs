use thiserror::Error;

/// Failures from the process environment rather than the advert rules:
/// the database, the tracing stack, signal handling, configuration.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("database failure: {message}")]
    Database { message: String },
    #[error("could not initialize telemetry: {0}")]
    Telemetry(String),
    #[error("invalid deployment configuration: {message}")]
    Configuration { message: String },
}

impl InfraError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
