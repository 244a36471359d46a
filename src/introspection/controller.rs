use std::{sync::Arc, time::Duration};

use periscope_graphql::{GraphQLLayer, GraphQLRequest, GraphQLServiceError};
use periscope_http::{
    HttpService, HttpServiceError, headers::RequestHeadersLayer, timeout::TimeoutLayer,
};
use tokio::{sync::watch, task::JoinHandle};
use tower::{Layer, ServiceBuilder, ServiceExt};
use url::Url;

use super::{INTROSPECTION_QUERY, SchemaBuildError, SchemaDocument};
use crate::headers::{HeaderMap, SensitiveHeaders};

/// Message shown for every failure the endpoint did not describe itself
pub const GENERIC_FAILURE: &str = "Error introspecting schema";

/// What an introspection is run against. Compared by value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntrospectionInput {
    pub url: String,
    pub headers: HeaderMap,
}

impl IntrospectionInput {
    pub fn new(url: impl Into<String>, headers: HeaderMap) -> IntrospectionInput {
        IntrospectionInput {
            url: url.into(),
            headers,
        }
    }
}

/// The introspection lifecycle as the display layer sees it
#[derive(Clone, Debug, PartialEq)]
pub enum IntrospectionState {
    Loading,
    Ready(Arc<SchemaDocument>),
    Failed(String),
}

impl IntrospectionState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, IntrospectionState::Loading)
    }

    pub fn schema(&self) -> Option<&SchemaDocument> {
        match self {
            IntrospectionState::Ready(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            IntrospectionState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Why one introspection did not produce a schema
#[derive(thiserror::Error, Debug)]
pub enum IntrospectionError {
    #[error("{message}")]
    GraphQL { message: String },
    #[error("endpoint responded with an empty errors list")]
    EmptyErrors,
    #[error("endpoint responded without data")]
    MissingData,
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid request headers: {0}")]
    InvalidHeaders(#[from] HttpServiceError),
    #[error("introspection request failed: {0}")]
    Transport(#[from] GraphQLServiceError),
    #[error(transparent)]
    Schema(#[from] SchemaBuildError),
}

impl IntrospectionError {
    /// The text published in [`IntrospectionState::Failed`]. Only errors the
    /// endpoint reported are passed through; everything else is generic.
    pub fn user_message(&self) -> String {
        match self {
            IntrospectionError::GraphQL { message } => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

#[derive(Debug)]
struct Published {
    generation: u64,
    state: IntrospectionState,
}

/// Re-introspects the endpoint whenever it is triggered and publishes the outcome.
///
/// Every trigger moves the state to [`IntrospectionState::Loading`] and starts
/// one request. Requests are never aborted; instead each carries the generation
/// it was started under, and its outcome is committed only if no newer trigger
/// has happened since. The generation check and the commit happen under the
/// same watch-channel lock, so a trigger can never interleave between them.
#[derive(Debug)]
pub struct IntrospectionController {
    http_service: HttpService,
    sensitive: SensitiveHeaders,
    timeout: Option<Duration>,
    published: Arc<watch::Sender<Published>>,
}

impl IntrospectionController {
    pub fn new(
        http_service: HttpService,
        sensitive: SensitiveHeaders,
        timeout: Option<Duration>,
    ) -> IntrospectionController {
        let (published, _) = watch::channel(Published {
            generation: 0,
            state: IntrospectionState::Loading,
        });
        IntrospectionController {
            http_service,
            sensitive,
            timeout,
            published: Arc::new(published),
        }
    }

    /// Starts introspecting `input`, superseding any request still in flight.
    ///
    /// The returned handle resolves once this request's outcome has been
    /// committed or discarded. Must be called within a tokio runtime.
    pub fn trigger(&self, input: IntrospectionInput) -> JoinHandle<()> {
        let mut generation = 0;
        self.published.send_modify(|published| {
            published.generation += 1;
            published.state = IntrospectionState::Loading;
            generation = published.generation;
        });
        tracing::debug!(url = %input.url, generation, "introspecting schema");

        let http_service = self.http_service.clone();
        let sensitive = self.sensitive.clone();
        let timeout = self.timeout;
        let published = self.published.clone();
        tokio::spawn(async move {
            let state = match introspect(http_service, &sensitive, timeout, &input).await {
                Ok(schema) => IntrospectionState::Ready(Arc::new(schema)),
                Err(err) => {
                    tracing::warn!(url = %input.url, generation, "introspection failed: {err}");
                    IntrospectionState::Failed(err.user_message())
                }
            };
            published.send_if_modified(|published| {
                if published.generation != generation {
                    tracing::debug!(
                        stale = generation,
                        current = published.generation,
                        "discarding stale introspection result"
                    );
                    return false;
                }
                tracing::debug!(generation, ready = state.schema().is_some(), "introspection settled");
                published.state = state;
                true
            });
        })
    }

    pub fn state(&self) -> IntrospectionState {
        self.published.borrow().state.clone()
    }

    /// Number of triggers so far
    pub fn generation(&self) -> u64 {
        self.published.borrow().generation
    }

    pub fn subscribe(&self) -> IntrospectionReceiver {
        IntrospectionReceiver(self.published.subscribe())
    }

    /// Waits until the latest trigger has settled and returns its state
    pub async fn settled(&self) -> IntrospectionState {
        let mut receiver = self.published.subscribe();
        let settled = receiver
            .wait_for(|published| !published.state.is_loading())
            .await
            .map(|published| published.state.clone());
        settled.unwrap_or_else(|_| self.state())
    }
}

/// Change notifications for an [`IntrospectionController`]
#[derive(Debug)]
pub struct IntrospectionReceiver(watch::Receiver<Published>);

impl IntrospectionReceiver {
    /// Waits for the next published state. Returns `false` once the controller is gone.
    pub async fn changed(&mut self) -> bool {
        self.0.changed().await.is_ok()
    }

    pub fn state(&self) -> IntrospectionState {
        self.0.borrow().state.clone()
    }
}

async fn introspect(
    http_service: HttpService,
    sensitive: &SensitiveHeaders,
    timeout: Option<Duration>,
    input: &IntrospectionInput,
) -> Result<SchemaDocument, IntrospectionError> {
    let endpoint = Url::parse(&input.url)?;
    let headers = RequestHeadersLayer::try_from_pairs(
        input
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
        |name| sensitive.contains(name),
    )?;
    let http_service = match timeout {
        Some(timeout) => HttpService::new(TimeoutLayer::new(timeout).layer(http_service)),
        None => http_service,
    };
    let service = ServiceBuilder::new()
        .layer(GraphQLLayer::new(endpoint))
        .layer(headers)
        .service(http_service);

    let response = service
        .oneshot(GraphQLRequest::new(INTROSPECTION_QUERY))
        .await?;
    if let Some(errors) = response.errors {
        return Err(errors
            .into_iter()
            .next()
            .map(|first| IntrospectionError::GraphQL {
                message: first.message,
            })
            .unwrap_or(IntrospectionError::EmptyErrors));
    }
    let data = response.data.ok_or(IntrospectionError::MissingData)?;
    Ok(SchemaDocument::from_introspection(data)?)
}
