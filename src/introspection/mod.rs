//! Keeps a client-side schema in step with the configured endpoint

mod controller;
mod schema;

pub use controller::{
    GENERIC_FAILURE, IntrospectionController, IntrospectionError, IntrospectionInput,
    IntrospectionReceiver, IntrospectionState,
};
pub use schema::{SchemaBuildError, SchemaDocument};

/// The standard full introspection query, sent verbatim to the endpoint
pub const INTROSPECTION_QUERY: &str = include_str!("introspection_query.graphql");
