//! Applies a configured set of request headers to every outgoing request

use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue};
use tower::{Layer, Service};

use crate::HttpServiceError;

/// [`Layer`] that writes a fixed [`HeaderMap`] onto each request.
///
/// Configured headers replace any header of the same name the request already carries.
#[derive(Clone, Debug, Default)]
pub struct RequestHeadersLayer {
    headers: HeaderMap,
}

impl RequestHeadersLayer {
    pub fn new(headers: impl Into<HeaderMap>) -> RequestHeadersLayer {
        RequestHeadersLayer {
            headers: headers.into(),
        }
    }

    /// Builds the layer from name/value string pairs.
    ///
    /// Values whose name satisfies `is_sensitive` are flagged with
    /// [`HeaderValue::set_sensitive`] so they stay out of debug output.
    pub fn try_from_pairs<'a, I, F>(
        pairs: I,
        is_sensitive: F,
    ) -> Result<RequestHeadersLayer, HttpServiceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
        F: Fn(&str) -> bool,
    {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let header_name = HeaderName::from_str(name)?;
            let mut header_value =
                HeaderValue::from_str(value).map_err(|source| {
                    HttpServiceError::InvalidHeaderValue {
                        name: name.to_string(),
                        source,
                    }
                })?;
            if is_sensitive(name) {
                header_value.set_sensitive(true);
            }
            headers.insert(header_name, header_value);
        }
        Ok(RequestHeadersLayer { headers })
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl<S> Layer<S> for RequestHeadersLayer {
    type Service = RequestHeaders<S>;
    fn layer(&self, inner: S) -> Self::Service {
        RequestHeaders {
            headers: self.headers.clone(),
            inner,
        }
    }
}

/// Service produced by [`RequestHeadersLayer`]
#[derive(Clone, Debug)]
pub struct RequestHeaders<S> {
    headers: HeaderMap,
    inner: S,
}

impl<Req, S> Service<http::Request<Req>> for RequestHeaders<S>
where
    S: Service<http::Request<Req>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<Req>) -> Self::Future {
        req.headers_mut().extend(self.headers.clone());
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http::{header::CONTENT_TYPE, HeaderValue};
    use rstest::rstest;
    use speculoos::prelude::*;
    use tower::{service_fn, Layer, Service, ServiceExt};

    use super::RequestHeadersLayer;
    use crate::HttpServiceError;

    #[tokio::test]
    async fn configured_headers_replace_request_headers() {
        let layer = RequestHeadersLayer::try_from_pairs(
            [("content-type", "application/graphql"), ("x-team", "core")],
            |_| false,
        )
        .unwrap();
        let mut service = layer.layer(service_fn(|req: http::Request<()>| async move {
            Ok::<_, Infallible>(req.headers().clone())
        }));

        let request = http::Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(())
            .unwrap();
        let headers = ServiceExt::<http::Request<()>>::ready(&mut service)
            .await
            .unwrap()
            .call(request)
            .await
            .unwrap();

        assert_that!(headers.get_all(CONTENT_TYPE).iter().count()).is_equal_to(1);
        assert_that!(headers.get(CONTENT_TYPE))
            .is_some()
            .is_equal_to(&HeaderValue::from_static("application/graphql"));
        assert_that!(headers.get("x-team"))
            .is_some()
            .is_equal_to(&HeaderValue::from_static("core"));
    }

    #[test]
    fn sensitive_values_are_flagged() {
        let layer = RequestHeadersLayer::try_from_pairs(
            [("x-admin-secret", "hunter2"), ("x-role", "user")],
            |name| name == "x-admin-secret",
        )
        .unwrap();
        assert_that!(layer.headers()["x-admin-secret"].is_sensitive()).is_true();
        assert_that!(layer.headers()["x-role"].is_sensitive()).is_false();
    }

    #[rstest]
    #[case::space_in_name("bad header", "value", true)]
    #[case::newline_in_value("x-ok", "line\nbreak", false)]
    fn invalid_pairs_are_rejected(
        #[case] name: &str,
        #[case] value: &str,
        #[case] bad_name: bool,
    ) {
        let result = RequestHeadersLayer::try_from_pairs([(name, value)], |_| false);
        assert_that!(result).is_err().matches(|err| {
            err.is_header()
                && matches!(err, HttpServiceError::InvalidHeaderName(_)) == bad_name
        });
    }
}
