#![warn(missing_docs)]

//! GraphQL-over-HTTP middleware for periscope HTTP services

use std::str::FromStr;

use bytes::Bytes;
use http::{uri::InvalidUri, HeaderValue, Method, StatusCode, Uri};
use http_body_util::Full;
use periscope_http::{body::body_to_bytes, HttpRequest, HttpResponse};
use periscope_tower::ResponseFuture;
use serde::Serialize;
use tower::{Layer, Service};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// The standard `{ data, errors, extensions }` response envelope with untyped data
pub type GraphQLResponse = graphql_client::Response<serde_json::Value>;

/// One entry of a response's `errors` array
pub type GraphQLError = graphql_client::Error;

/// Errors that may occur from using a [`GraphQLService`]
#[derive(thiserror::Error, Debug)]
pub enum GraphQLServiceError {
    /// The request document could not be serialized
    #[error("Serialization error")]
    Serialization(serde_json::Error),
    /// The response body was not a GraphQL response envelope
    #[error("Deserialization error")]
    Deserialization {
        /// The source error
        error: serde_json::Error,
        /// The body that was attempted to be deserialized
        data: Bytes,
        /// The [`StatusCode`] of the response
        status_code: StatusCode,
    },
    /// [`http`]-related error, probably from building the request
    #[error("HTTP error: {:?}", .0)]
    Http(#[from] http::Error),
    /// The endpoint [`Url`] could not be turned into a [`Uri`]
    #[error("Unable to convert URL to URI.")]
    InvalidUri(#[from] InvalidUri),
    /// The underlying HTTP service failed
    #[error("Upstream service error: {:?}", .0)]
    UpstreamService(Box<dyn std::error::Error + Send + Sync>),
}

/// A GraphQL document to POST, with optional operation name and variables
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

impl GraphQLRequest {
    /// A request carrying only a query document
    pub fn new(query: impl Into<String>) -> GraphQLRequest {
        GraphQLRequest {
            query: query.into(),
            operation_name: None,
            variables: None,
        }
    }

    /// Selects the operation to execute when the document holds several
    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> GraphQLRequest {
        self.operation_name = Some(operation_name.into());
        self
    }

    /// Attaches the variables object
    pub fn with_variables(mut self, variables: serde_json::Value) -> GraphQLRequest {
        self.variables = Some(variables);
        self
    }

    /// The query document
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// [`Layer`] that turns an HTTP service into a GraphQL service bound to one endpoint
#[derive(Clone, Debug)]
pub struct GraphQLLayer {
    endpoint: Url,
}

impl GraphQLLayer {
    /// Constructs a new [`GraphQLLayer`]
    pub const fn new(endpoint: Url) -> GraphQLLayer {
        GraphQLLayer { endpoint }
    }
}

impl<S> Layer<S> for GraphQLLayer {
    type Service = GraphQLService<S>;
    fn layer(&self, inner: S) -> Self::Service {
        GraphQLService::new(self.endpoint.clone(), inner)
    }
}

/// Sends [`GraphQLRequest`]s as JSON POSTs and decodes the response envelope.
///
/// The HTTP status is not interpreted: servers commonly report GraphQL errors
/// with non-2xx statuses and a well-formed envelope, and those errors belong
/// to the caller. Only a body that is not an envelope fails.
#[derive(Clone, Debug)]
pub struct GraphQLService<S> {
    inner: S,
    endpoint: Url,
}

impl<S> GraphQLService<S> {
    /// Constructs a new [`GraphQLService`]
    pub const fn new(endpoint: Url, inner: S) -> GraphQLService<S> {
        GraphQLService { endpoint, inner }
    }
}

impl<S> Service<GraphQLRequest> for GraphQLService<S>
where
    S: Service<HttpRequest, Response = HttpResponse> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = GraphQLResponse;
    type Error = GraphQLServiceError;
    type Future = ResponseFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(|err| GraphQLServiceError::UpstreamService(Box::new(err)))
    }

    fn call(&mut self, req: GraphQLRequest) -> Self::Future {
        let mut client = periscope_tower::take_ready::<_, HttpRequest>(&mut self.inner);
        let endpoint = self.endpoint.clone();

        Box::pin(async move {
            let body = serde_json::to_vec(&req).map_err(GraphQLServiceError::Serialization)?;
            let http_request = http::Request::builder()
                .uri(Uri::from_str(endpoint.as_str())?)
                .method(Method::POST)
                .header(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static(JSON_CONTENT_TYPE),
                )
                .body(Full::new(Bytes::from(body)))?;
            tracing::debug!(%endpoint, operation = ?req.operation_name, "sending GraphQL request");
            let mut resp = client
                .call(http_request)
                .await
                .map_err(|err| GraphQLServiceError::UpstreamService(Box::new(err)))?;
            let status_code = resp.status();
            let data = match body_to_bytes(resp.body_mut()).await {
                Ok(data) => data,
                Err(never) => match never {},
            };
            serde_json::from_slice::<GraphQLResponse>(&data).map_err(|error| {
                GraphQLServiceError::Deserialization {
                    error,
                    data,
                    status_code,
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use anyhow::Result;
    use bytes::Bytes;
    use http::{HeaderValue, Method, StatusCode, Uri};
    use http_body_util::Full;
    use periscope_http::{body::body_to_bytes, HttpRequest, HttpResponse, HttpServiceError};
    use rstest::rstest;
    use serde_json::json;
    use speculoos::prelude::*;
    use tokio::task;
    use tower::{Service, ServiceBuilder, ServiceExt};
    use tower_test::mock;
    use url::Url;

    use super::{GraphQLLayer, GraphQLRequest, GraphQLServiceError, JSON_CONTENT_TYPE};

    fn respond(status: StatusCode, body: impl Into<Bytes>) -> HttpResponse {
        http::Response::builder()
            .status(status)
            .body(Full::new(body.into()))
            .unwrap()
    }

    #[tokio::test]
    async fn posts_the_document_and_decodes_the_envelope() -> Result<()> {
        let endpoint = Url::parse("http://example.com/graphql")?;
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint.clone()))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());

        let request = GraphQLRequest::new("query AskAQuestion { __typename }")
            .with_operation_name("AskAQuestion");
        let call = service.ready().await?.call(request);

        task::spawn(async move {
            let (mut actual, send_response) = handle.next_request().await.unwrap();

            assert_that!(actual.uri()).is_equal_to(&Uri::from_str(endpoint.as_str()).unwrap());
            assert_that!(actual.method()).is_equal_to(&Method::POST);
            assert_that!(actual.headers().get(http::header::CONTENT_TYPE).unwrap())
                .is_equal_to(&HeaderValue::from_static(JSON_CONTENT_TYPE));

            let body = body_to_bytes(actual.body_mut()).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_that!(body).is_equal_to(json!({
                "query": "query AskAQuestion { __typename }",
                "operationName": "AskAQuestion",
            }));

            send_response.send_response(respond(
                StatusCode::OK,
                json!({ "data": { "__typename": "Query" } }).to_string(),
            ));
        });

        let response = call.await?;
        assert_that!(response.errors).is_none();
        assert_that!(response.data)
            .is_some()
            .is_equal_to(json!({ "__typename": "Query" }));
        Ok(())
    }

    #[tokio::test]
    async fn errors_survive_a_bad_status() -> Result<()> {
        let endpoint = Url::parse("http://example.com/graphql")?;
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());

        let call = service.ready().await?.call(GraphQLRequest::new("{ me }"));

        task::spawn(async move {
            let (_, send_response) = handle.next_request().await.unwrap();
            send_response.send_response(respond(
                StatusCode::BAD_REQUEST,
                json!({ "errors": [{ "message": "something went wrong" }] }).to_string(),
            ));
        });

        let response = call.await?;
        assert_that!(response.data).is_none();
        let messages: Vec<_> = response
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|err| err.message)
            .collect();
        assert_that!(messages).is_equal_to(vec!["something went wrong".to_string()]);
        Ok(())
    }

    #[rstest]
    #[case::ok(StatusCode::OK)]
    #[case::internal_server_error(StatusCode::INTERNAL_SERVER_ERROR)]
    #[tokio::test]
    async fn non_json_bodies_fail_to_deserialize(#[case] expected_status_code: StatusCode) {
        let endpoint = Url::parse("http://example.com/graphql").unwrap();
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());

        let call = service
            .ready()
            .await
            .unwrap()
            .call(GraphQLRequest::new("{ me }"));

        task::spawn(async move {
            let (_, send_response) = handle.next_request().await.unwrap();
            send_response.send_response(respond(expected_status_code, "something went wrong"));
        });

        let result = call.await;

        assert_that!(result).is_err().matches(|err| match err {
            GraphQLServiceError::Deserialization {
                data, status_code, ..
            } => {
                status_code == &expected_status_code
                    && data == &Bytes::from_static(b"something went wrong")
            }
            _ => false,
        });
    }

    #[tokio::test]
    async fn upstream_failures_are_wrapped() {
        let endpoint = Url::parse("http://example.com/graphql").unwrap();
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());

        let call = service
            .ready()
            .await
            .unwrap()
            .call(GraphQLRequest::new("{ me }"));

        task::spawn(async move {
            let (_, send_response) = handle.next_request().await.unwrap();
            send_response.send_error(HttpServiceError::TimedOut);
        });

        assert_that!(call.await)
            .is_err()
            .matches(|err| matches!(err, GraphQLServiceError::UpstreamService(_)));
    }
}
