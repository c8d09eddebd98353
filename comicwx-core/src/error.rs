use thiserror::Error;

/// Errors produced while fetching, validating or rendering comics and weather.
///
/// Each variant corresponds to one class of HTTP response; see [`Error::kind`].
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed caller input (bad zipcode, dimensions, comic id).
    #[error("{0}")]
    Validation(String),

    /// The requested resource does not exist upstream or is out of range.
    #[error("{0}")]
    NotFound(String),

    /// An upstream service was unreachable, answered with a non-success
    /// status, or returned a payload we could not understand.
    #[error("{upstream} request failed: {message}")]
    Upstream {
        upstream: &'static str,
        message: String,
    },

    /// An upstream service did not answer within the configured timeout.
    #[error("{0} did not respond in time")]
    Timeout(&'static str),

    /// Missing or inconsistent configuration.
    #[error("{0}")]
    Config(String),

    /// Anything else that went wrong assembling a response.
    #[error("{0}")]
    Internal(String),
}

/// Coarse classification of [`Error`], used by callers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Upstream,
    Timeout,
    Internal,
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(upstream: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            upstream,
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Config(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Internal(format!("image processing failed: {err}"))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
