//! Adds or removes a directive on every query operation of a document

use std::fmt::Write;

use apollo_compiler::{
    Name, Node,
    ast::{Definition, Directive, Document, OperationType},
    name,
};

/// What [`toggle_cached_directive`] returns for text that does not parse
pub const TOGGLE_FAILURE: &str = "ERROR";

const SOURCE_NAME: &str = "operation.graphql";

#[derive(thiserror::Error, Debug)]
pub enum ToggleError {
    #[error("'{0}' is not a valid directive name")]
    InvalidName(String),
    #[error("operation text is not valid GraphQL: {0}")]
    Parse(String),
    #[error("could not print the toggled operation")]
    Serialization(#[from] std::fmt::Error),
}

/// Toggles one bare directive (no arguments) on query operations.
///
/// Presence is judged across the whole document: if any operation or fragment
/// already carries the directive, toggling removes it from every query;
/// otherwise it is appended to every query. Mutations and subscriptions are
/// never touched, and nothing is checked against a schema.
#[derive(Clone, Debug)]
pub struct DirectiveToggler {
    name: Name,
}

impl DirectiveToggler {
    pub fn new(name: &str) -> Result<DirectiveToggler, ToggleError> {
        Name::new(name)
            .map(|name| DirectiveToggler { name })
            .map_err(|_| ToggleError::InvalidName(name.to_string()))
    }

    /// The toggler for `@cached`
    pub fn cached() -> DirectiveToggler {
        DirectiveToggler {
            name: name!("cached"),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Whether any operation or fragment in `document` carries the directive
    pub fn is_present(&self, document: &Document) -> bool {
        document.definitions.iter().any(|definition| match definition {
            Definition::OperationDefinition(operation) => {
                operation.directives.get(self.name()).is_some()
            }
            Definition::FragmentDefinition(fragment) => {
                fragment.directives.get(self.name()).is_some()
            }
            _ => false,
        })
    }

    /// Parses `text`, toggles the directive and prints the document back.
    /// Blank text toggles to an empty string.
    pub fn toggle(&self, text: &str) -> Result<String, ToggleError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let mut document = Document::parse(text, SOURCE_NAME)
            .map_err(|invalid| ToggleError::Parse(invalid.errors.to_string()))?;

        let add = !self.is_present(&document);
        for definition in document.definitions.iter_mut() {
            let Definition::OperationDefinition(operation) = definition else {
                continue;
            };
            if operation.operation_type != OperationType::Query {
                continue;
            }
            let directives = &mut operation.make_mut().directives.0;
            directives.retain(|directive| directive.name != self.name);
            if add {
                directives.push(Node::new(Directive {
                    name: self.name.clone(),
                    arguments: Vec::new(),
                }));
            }
        }

        let mut printed = String::new();
        write!(printed, "{document}")?;
        Ok(printed)
    }
}

/// Toggles `@cached` on the query operations of `text`.
///
/// Text that does not parse yields [`TOGGLE_FAILURE`] rather than an error so
/// a half-typed query never blocks the editor. Printing failures are errors.
pub fn toggle_cached_directive(text: &str) -> Result<String, ToggleError> {
    match DirectiveToggler::cached().toggle(text) {
        Err(ToggleError::Parse(reason)) => {
            tracing::warn!("not toggling @cached on unparseable operation: {reason}");
            Ok(TOGGLE_FAILURE.to_string())
        }
        toggled => toggled,
    }
}
