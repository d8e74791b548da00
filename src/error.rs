use thiserror::Error;

/// Boxed cause carried by remote repository failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum BbdepsError {
    #[error("{operation}: {source}")]
    Repository {
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Package \"{0}\" is not present in package-lock.json")]
    PackageNotFound(String),

    #[error("Malformed manifest: {0}")]
    Manifest(String),

    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, BbdepsError>;
