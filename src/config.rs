//! Workbench settings, built in code or read from TOML

use std::{fs, time::Duration};

use buildstructor::buildstructor;
use camino::{Utf8Path, Utf8PathBuf};
use derive_getters::Getters;
use periscope_http::HttpServiceConfig;
use serde::{Deserialize, Deserializer, de::Error as _};

use crate::headers::{DEFAULT_SENSITIVE_HEADER, HeaderMap, SensitiveHeaders};

const DEFAULT_HEADER_DEBOUNCE: Duration = Duration::from_millis(100);
const DEFAULT_CACHE_HOST: &str = "hasura.app";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("invalid workbench configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Initial endpoint, headers and query, plus the knobs that shape editing and introspection.
///
/// ```toml
/// endpoint = "https://my-app.hasura.app/v1/graphql"
/// subscription_endpoint = "wss://my-app.hasura.app/v1/graphql"
/// header_debounce = "250ms"
/// request_timeout = "30s"
///
/// [headers]
/// x-hasura-admin-secret = "s3cr3t"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Getters)]
#[serde(default, deny_unknown_fields)]
pub struct WorkbenchConfig {
    endpoint: String,
    subscription_endpoint: Option<String>,
    headers: HeaderMap,
    query: String,
    /// Header names whose values start masked in the editor
    sensitive_headers: SensitiveHeaders,
    /// Quiet period after the last header keystroke before headers are committed
    #[serde(deserialize_with = "duration")]
    header_debounce: Duration,
    #[serde(deserialize_with = "optional_duration")]
    request_timeout: Option<Duration>,
    accept_invalid_certificates: bool,
    /// Host substrings of endpoints that offer response caching and the Relay API
    cache_hosts: Vec<String>,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        WorkbenchConfig {
            endpoint: String::new(),
            subscription_endpoint: None,
            headers: HeaderMap::new(),
            query: String::new(),
            sensitive_headers: SensitiveHeaders::new([DEFAULT_SENSITIVE_HEADER]),
            header_debounce: DEFAULT_HEADER_DEBOUNCE,
            request_timeout: None,
            accept_invalid_certificates: false,
            cache_hosts: vec![DEFAULT_CACHE_HOST.to_string()],
        }
    }
}

#[buildstructor]
impl WorkbenchConfig {
    #[builder]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        endpoint: String,
        subscription_endpoint: Option<String>,
        headers: Option<HeaderMap>,
        query: Option<String>,
        sensitive_headers: Option<SensitiveHeaders>,
        header_debounce: Option<Duration>,
        request_timeout: Option<Duration>,
        accept_invalid_certificates: Option<bool>,
        cache_hosts: Option<Vec<String>>,
    ) -> WorkbenchConfig {
        let defaults = WorkbenchConfig::default();
        WorkbenchConfig {
            endpoint,
            subscription_endpoint,
            headers: headers.unwrap_or_default(),
            query: query.unwrap_or_default(),
            sensitive_headers: sensitive_headers.unwrap_or(defaults.sensitive_headers),
            header_debounce: header_debounce.unwrap_or(defaults.header_debounce),
            request_timeout,
            accept_invalid_certificates: accept_invalid_certificates.unwrap_or_default(),
            cache_hosts: cache_hosts.unwrap_or(defaults.cache_hosts),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<WorkbenchConfig, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Utf8Path>) -> Result<WorkbenchConfig, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = WorkbenchConfig::from_toml_str(&contents)?;
        tracing::debug!(%path, endpoint = %config.endpoint, "loaded workbench configuration");
        Ok(config)
    }

    /// Settings for the HTTP client that carries introspection requests
    pub fn http_service_config(&self) -> HttpServiceConfig {
        HttpServiceConfig::builder()
            .accept_invalid_certificates(self.accept_invalid_certificates)
            .build()
    }
}

fn duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(D::Error::custom)
}

fn optional_duration<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|text| humantime::parse_duration(&text).map_err(D::Error::custom))
        .transpose()
}
