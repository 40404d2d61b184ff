use thiserror::Error;

#[derive(Error, Debug)]
pub enum JanitorError {
    #[error("GitLab API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid duration '{0}': expected something like 7d, 2h30m or '-'")]
    Duration(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, JanitorError>;
