//! Request configuration and schema synchronization for interactive GraphQL clients.
//!
//! A [`ConfigurationStore`] holds the endpoint, the request headers and the
//! query buffer of one session. Header rows are edited through a
//! [`HeaderEditor`], schema state is published by an
//! [`IntrospectionController`], and the `@cached` directive is toggled on the
//! query buffer with [`toggle_cached_directive`].

mod config;
mod debounce;
mod directive;
pub mod endpoint;
mod error;
mod fetcher;
pub mod headers;
pub mod introspection;
mod store;

pub use config::{ConfigError, WorkbenchConfig};
pub use debounce::Debouncer;
pub use directive::{DirectiveToggler, TOGGLE_FAILURE, ToggleError, toggle_cached_directive};
pub use error::{WorkbenchError, WorkbenchResult};
pub use fetcher::FetcherConfig;
pub use headers::{
    HeaderCell, HeaderEditor, HeaderEntry, HeaderList, HeaderMap, HeaderRow, HeaderSet,
    HeaderSetError, SensitiveHeaders,
};
pub use introspection::{
    IntrospectionController, IntrospectionInput, IntrospectionState, SchemaDocument,
};
pub use store::ConfigurationStore;
