use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Rejected configuration value (e.g. an unparsable filter directive).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A global subscriber was already installed for this process.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

pub type Result<T> = std::result::Result<T, Error>;
