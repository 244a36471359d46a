//! URL conventions of hosted engine endpoints

const GRAPHQL_PATH: &str = "v1/graphql";
const RELAY_PATH: &str = "v1beta1/relay";

/// Whether `url` contains any of `hosts`. Empty host patterns never match.
pub fn matches_host<S: AsRef<str>>(url: &str, hosts: &[S]) -> bool {
    hosts
        .iter()
        .map(AsRef::as_ref)
        .any(|host| !host.is_empty() && url.contains(host))
}

/// Whether `url` points at the Relay API rather than the GraphQL API
pub fn is_relay(url: &str) -> bool {
    url.contains(RELAY_PATH)
}

/// Swaps between the GraphQL and Relay API paths.
/// URLs with neither path are returned unchanged.
pub fn toggle_relay(url: &str) -> String {
    if is_relay(url) {
        url.replace(RELAY_PATH, GRAPHQL_PATH)
    } else {
        url.replace(GRAPHQL_PATH, RELAY_PATH)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use speculoos::prelude::*;

    use super::{is_relay, matches_host, toggle_relay};

    #[rstest]
    #[case::hosted("https://my-app.hasura.app/v1/graphql", true)]
    #[case::local("http://localhost:8080/v1/graphql", false)]
    fn host_matching(#[case] url: &str, #[case] expected: bool) {
        assert_that!(matches_host(url, &["hasura.app"])).is_equal_to(expected);
    }

    #[test]
    fn empty_host_patterns_never_match() {
        assert_that!(matches_host("http://localhost:8080/v1/graphql", &[""])).is_false();
        assert_that!(matches_host::<&str>("http://localhost:8080/v1/graphql", &[])).is_false();
    }

    #[rstest]
    #[case::to_relay(
        "https://my-app.hasura.app/v1/graphql",
        "https://my-app.hasura.app/v1beta1/relay"
    )]
    #[case::to_graphql(
        "https://my-app.hasura.app/v1beta1/relay",
        "https://my-app.hasura.app/v1/graphql"
    )]
    #[case::neither("https://example.com/graphql", "https://example.com/graphql")]
    fn relay_toggling(#[case] url: &str, #[case] expected: &str) {
        assert_that!(toggle_relay(url)).is_equal_to(expected.to_string());
        assert_that!(toggle_relay(&toggle_relay(url))).is_equal_to(url.to_string());
        assert_that!(is_relay(&toggle_relay(url))).is_equal_to(expected.contains("relay"));
    }
}
