use thiserror::Error;

/// Errors returned by [`LunarClient`](crate::LunarClient).
#[derive(Debug, Error)]
pub enum ClientError {
  /// The request could not be sent or the response body could not be read.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The backend answered with a non-success status.
  #[error("backend returned {status}: {message}")]
  Status { status: u16, message: String },

  /// The response body was not the expected JSON.
  #[error("failed to decode response from {endpoint}: {source}")]
  Decode {
    endpoint: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid backend url: {0}")]
  InvalidUrl(#[from] url::ParseError),

  /// Configuration is unusable (missing user id, unreadable config file, ...).
  #[error("invalid configuration: {message}")]
  Config { message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;
