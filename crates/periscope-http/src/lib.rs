#![warn(missing_docs)]

//! [`tower`] HTTP services used to reach GraphQL endpoints

use std::{fmt::Debug, time::Duration};

/// Installs ring as the default rustls crypto provider for every binary linking this crate.
#[ctor::ctor]
fn install_ring_crypto_provider() {
    // already installed is the only failure mode
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();
}

use buildstructor::Builder;
use bytes::Bytes;
use derive_getters::Getters;
pub use http_body::Body;
pub use http_body_util::{BodyExt, Empty, Full};
use tower::{timeout::error::Elapsed, util::BoxCloneService};

pub mod body;
mod error;
pub mod headers;
mod reqwest;
pub mod timeout;

pub use error::HttpServiceError;
pub use reqwest::ReqwestService;

/// Request type every periscope HTTP service accepts
pub type HttpRequest = http::Request<Full<Bytes>>;
/// Response type every periscope HTTP service produces
pub type HttpResponse<T = Full<Bytes>> = http::Response<T>;
/// Type-erased, cloneable HTTP service; the injection point for network access
pub type HttpService = BoxCloneService<HttpRequest, HttpResponse, HttpServiceError>;

/// Settings for building a [`ReqwestService`]
#[derive(Clone, Debug, Builder, Default, Getters)]
pub struct HttpServiceConfig {
    accept_invalid_certificates: Option<bool>,
    timeout: Option<Duration>,
}

impl From<Box<dyn std::error::Error + Send + Sync>> for HttpServiceError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        match err.downcast::<Elapsed>() {
            Ok(_) => HttpServiceError::TimedOut,
            Err(err) => match err.downcast::<HttpServiceError>() {
                Ok(err) => *err,
                Err(err) => HttpServiceError::Unexpected(err),
            },
        }
    }
}
