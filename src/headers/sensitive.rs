use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Header name the workbench masks when no other configuration is given
pub const DEFAULT_SENSITIVE_HEADER: &str = "x-hasura-admin-secret";

/// Header names whose values are hidden in the editor by default.
///
/// Membership is exact and case-sensitive, matching how keys are compared
/// everywhere else in the header model. Masking never affects what is sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensitiveHeaders(BTreeSet<String>);

impl SensitiveHeaders {
    pub fn new<I, S>(names: I) -> SensitiveHeaders
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SensitiveHeaders(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SensitiveHeaders {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        SensitiveHeaders::new(iter)
    }
}
