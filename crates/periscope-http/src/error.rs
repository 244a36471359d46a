use http::header::{InvalidHeaderName, InvalidHeaderValue};

/// Errors produced while sending a request through an [`HttpService`](crate::HttpService)
#[derive(thiserror::Error, Debug)]
pub enum HttpServiceError {
    #[error("HTTP Error: {:?}", .0)]
    Http(#[from] http::Error),
    #[error("Invalid header name: {}", .0)]
    InvalidHeaderName(#[from] InvalidHeaderName),
    #[error("Invalid header value for '{name}'")]
    InvalidHeaderValue {
        name: String,
        source: InvalidHeaderValue,
    },
    #[error("Request timed out")]
    TimedOut,
    #[error("Decode error: {:?}", .0)]
    Decode(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("Body error: {:?}", .0)]
    Body(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("Connect error: {:?}", .0)]
    Connect(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("Unexpected HTTP error: {:?}", .0)]
    Unexpected(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl HttpServiceError {
    pub const fn is_connect(&self) -> bool {
        matches!(self, HttpServiceError::Connect(_))
    }
    pub const fn is_timeout(&self) -> bool {
        matches!(self, HttpServiceError::TimedOut)
    }
    /// True for failures caused by the caller's header configuration rather than the network
    pub const fn is_header(&self) -> bool {
        matches!(
            self,
            HttpServiceError::InvalidHeaderName(_) | HttpServiceError::InvalidHeaderValue { .. }
        )
    }
}
