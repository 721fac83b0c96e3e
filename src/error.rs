use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Authentication error: {0}")]
    #[diagnostic(code(calnote::authentication))]
    Authentication(String),

    #[error("Calendar API error: {0}")]
    #[diagnostic(code(calnote::calendar_api))]
    CalendarApi(String),

    #[error("Command error: {0}")]
    #[diagnostic(code(calnote::command))]
    Command(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calnote::config))]
    Config(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(calnote::environment))]
    Environment(String),

    #[error(transparent)]
    #[diagnostic(code(calnote::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calnote::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calnote::other))]
    Other(String),
}

// Implement From for TOML serialization errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type CalResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Authentication(message.to_string())
}

/// Helper to create calendar API errors
pub fn calendar_error(message: &str) -> Error {
    Error::CalendarApi(message.to_string())
}

/// Helper to create command errors
pub fn command_error(message: &str) -> Error {
    Error::Command(message.to_string())
}

/// Helper to create other errors
#[allow(dead_code)]
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
