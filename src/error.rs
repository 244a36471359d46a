use periscope_http::HttpServiceError;

use crate::{
    config::ConfigError,
    directive::ToggleError,
    headers::HeaderSetError,
    introspection::{IntrospectionError, SchemaBuildError},
};

/// Any error the workbench can return, for callers that want a single type
#[derive(thiserror::Error, Debug)]
pub enum WorkbenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Headers(#[from] HeaderSetError),
    #[error(transparent)]
    Toggle(#[from] ToggleError),
    #[error(transparent)]
    Introspection(#[from] IntrospectionError),
    #[error(transparent)]
    Schema(#[from] SchemaBuildError),
    #[error(transparent)]
    Http(#[from] HttpServiceError),
}

pub type WorkbenchResult<T> = std::result::Result<T, WorkbenchError>;
