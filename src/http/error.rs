use std::sync::Arc;

use thiserror::Error;

use crate::http::protocol::status::StatusCode;

/// Failures raised while buffering or decoding a request body.
///
/// Cloneable so that a failed initialization can be handed back to every
/// later caller on the same request.
#[derive(Debug, Clone, Error)]
pub enum BodyError {
    /// The underlying body stream failed while being buffered
    #[error("failed to read request body: {0}")]
    Read(Arc<std::io::Error>),

    /// Percent-decoding or text decoding failed
    #[error("failed to decode request body: {0}")]
    Decode(String),

    /// The declared charset is not one we can decode
    #[error("unsupported character encoding: {0}")]
    UnsupportedCharset(String),

    /// Malformed multipart structure
    #[error("malformed multipart body: {0}")]
    Multipart(String),

    /// The multipart body exceeded the configured ceiling
    #[error("request body exceeds the {limit} byte limit")]
    SizeLimitExceeded { limit: u64 },

    /// Spilling a part to, or reading it back from, the upload repository failed
    #[error("upload storage failure: {0}")]
    Storage(Arc<std::io::Error>),
}

impl BodyError {
    pub fn read(err: std::io::Error) -> Self {
        BodyError::Read(Arc::new(err))
    }

    pub fn storage(err: std::io::Error) -> Self {
        BodyError::Storage(Arc::new(err))
    }

    /// Status a server should answer with when this error reaches it.
    pub fn status(&self) -> StatusCode {
        match self {
            BodyError::SizeLimitExceeded { .. } => StatusCode::PayloadTooLarge,
            BodyError::UnsupportedCharset(_) => StatusCode::UnsupportedMediaType,
            BodyError::Storage(_) => StatusCode::InternalServerError,
            BodyError::Read(_) | BodyError::Decode(_) | BodyError::Multipart(_) => {
                StatusCode::BadRequest
            }
        }
    }
}

impl From<multer::Error> for BodyError {
    fn from(err: multer::Error) -> Self {
        match err {
            multer::Error::StreamSizeExceeded { limit } => BodyError::SizeLimitExceeded { limit },
            other => BodyError::Multipart(other.to_string()),
        }
    }
}
