//! Configuration handed to the query-execution transport

use derive_getters::Getters;
use serde::Serialize;
use serde_json::json;

use crate::headers::HeaderMap;

/// Everything the external transport factory needs to run operations:
/// queries and mutations go to `url`, subscriptions to `subscription_url`,
/// and every request carries `headers`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct FetcherConfig {
    url: String,
    subscription_url: Option<String>,
    headers: HeaderMap,
}

impl FetcherConfig {
    pub const fn new(
        url: String,
        subscription_url: Option<String>,
        headers: HeaderMap,
    ) -> FetcherConfig {
        FetcherConfig {
            url,
            subscription_url,
            headers,
        }
    }

    /// Init payload for the subscription connection; headers travel inside it
    /// because the socket handshake cannot carry them.
    pub fn connection_params(&self) -> serde_json::Value {
        json!({ "headers": self.headers })
    }
}
