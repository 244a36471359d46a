use std::time::Duration;

use periscope_http::{HttpService, HttpServiceError, ReqwestService};
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::{
    WorkbenchError,
    config::WorkbenchConfig,
    directive::{TOGGLE_FAILURE, ToggleError, toggle_cached_directive},
    endpoint,
    fetcher::FetcherConfig,
    headers::{HeaderEditor, HeaderEntry, HeaderList, HeaderMap, HeaderSet},
    introspection::{
        IntrospectionController, IntrospectionInput, IntrospectionReceiver, IntrospectionState,
    },
};

/// The endpoint, headers and query of one workbench session.
///
/// Every change to the endpoint or to the effective headers re-introspects
/// the endpoint; the latest change always wins. Construction triggers the
/// first introspection, so the store must be created inside a tokio runtime.
#[derive(Debug)]
pub struct ConfigurationStore {
    config: WorkbenchConfig,
    header_set: HeaderSet,
    url: String,
    headers: HeaderMap,
    query: String,
    controller: IntrospectionController,
    banner_dismissed: bool,
}

impl ConfigurationStore {
    pub fn new(config: WorkbenchConfig, http_service: HttpService) -> ConfigurationStore {
        let controller = IntrospectionController::new(
            http_service,
            config.sensitive_headers().clone(),
            *config.request_timeout(),
        );
        let mut store = ConfigurationStore {
            header_set: HeaderSet::new(config.sensitive_headers().clone()),
            url: config.endpoint().clone(),
            headers: config.headers().clone(),
            query: config.query().clone(),
            controller,
            banner_dismissed: false,
            config,
        };
        store.introspect();
        store
    }

    /// Builds the store over a reqwest-backed HTTP service configured from `config`
    pub fn connect(config: WorkbenchConfig) -> Result<ConfigurationStore, WorkbenchError> {
        let http_service = ReqwestService::builder()
            .config(config.http_service_config())
            .build()
            .map_err(HttpServiceError::from)?;
        Ok(ConfigurationStore::new(config, http_service.into()))
    }

    pub const fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn current_effective_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn current_schema_state(&self) -> IntrospectionState {
        self.controller.state()
    }

    /// Waits for the latest introspection to settle
    pub async fn settled(&self) -> IntrospectionState {
        self.controller.settled().await
    }

    pub fn subscribe(&self) -> IntrospectionReceiver {
        self.controller.subscribe()
    }

    /// Submits an endpoint. Submitting the current endpoint again re-introspects it.
    pub fn set_url(&mut self, url: impl Into<String>) -> JoinHandle<()> {
        self.url = url.into();
        self.introspect()
    }

    /// Commits an edited endpoint, re-introspecting only if it changed
    pub fn commit_url(&mut self, url: impl Into<String>) -> Option<JoinHandle<()>> {
        let url = url.into();
        if url == self.url {
            return None;
        }
        Some(self.set_url(url))
    }

    /// Commits edited header rows. Returns whether the effective headers
    /// changed; only then is the endpoint re-introspected.
    pub fn commit_headers(&mut self, list: &[HeaderEntry]) -> bool {
        let headers = HeaderSet::to_map(list);
        if headers == self.headers {
            tracing::debug!("header edit left the effective headers unchanged");
            return false;
        }
        self.headers = headers;
        self.introspect();
        true
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Toggles `@cached` on the query buffer.
    ///
    /// Returns whether the buffer was rewritten; a buffer that does not parse
    /// is left as it is.
    pub fn toggle_cache(&mut self) -> Result<bool, ToggleError> {
        let toggled = toggle_cached_directive(&self.query)?;
        if toggled == TOGGLE_FAILURE {
            return Ok(false);
        }
        self.query = toggled;
        Ok(true)
    }

    /// Whether the endpoint supports the cache action
    pub fn cache_available(&self) -> bool {
        endpoint::matches_host(&self.url, self.config.cache_hosts())
    }

    /// Whether the endpoint offers a Relay API next to its GraphQL API
    pub fn relay_available(&self) -> bool {
        self.cache_available()
    }

    pub fn relay_enabled(&self) -> bool {
        endpoint::is_relay(&self.url)
    }

    /// Switches between the GraphQL and Relay APIs of the endpoint and re-introspects
    pub fn toggle_relay(&mut self) -> JoinHandle<()> {
        let url = endpoint::toggle_relay(&self.url);
        self.set_url(url)
    }

    /// The failure message to show, until dismissed
    pub fn error_banner(&self) -> Option<String> {
        if self.banner_dismissed {
            return None;
        }
        self.controller.state().failure().map(str::to_string)
    }

    pub fn dismiss_error(&mut self) {
        self.banner_dismissed = true;
    }

    /// Settings for the transport that executes the user's operations
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig::new(
            self.url.clone(),
            self.config.subscription_endpoint().clone(),
            self.headers.clone(),
        )
    }

    pub const fn header_set(&self) -> &HeaderSet {
        &self.header_set
    }

    /// The effective headers as editable rows
    pub fn header_list(&self) -> HeaderList {
        self.header_set.from_map(&self.headers)
    }

    /// An editor over the current headers whose updates arrive on `sink`,
    /// to be passed back through [`ConfigurationStore::commit_headers`]
    pub fn header_editor(&self, sink: UnboundedSender<HeaderList>) -> HeaderEditor {
        HeaderEditor::new(
            self.header_set.clone(),
            self.header_list(),
            self.header_debounce(),
            sink,
        )
    }

    fn header_debounce(&self) -> Duration {
        *self.config.header_debounce()
    }

    fn introspect(&mut self) -> JoinHandle<()> {
        self.banner_dismissed = false;
        self.controller.trigger(IntrospectionInput::new(
            self.url.clone(),
            self.headers.clone(),
        ))
    }
}
