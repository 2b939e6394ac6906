//! Evaluation options for [`XmlPath`](crate::XmlPath).

use std::collections::HashMap;

/// Namespace declarations used when resolving prefixed names in a path.
///
/// A prefix only matters to path evaluation once it is declared here. The
/// prefixes bound inside the document itself are not consulted, so
/// `ns:bar` matches nothing until `ns` is declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlPathConfig {
    namespaces: HashMap<String, String>,
}

impl XmlPathConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `prefix` refers to the namespace `uri`.
    pub fn declared_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    pub fn declared_namespaces(&self) -> &HashMap<String, String> {
        &self.namespaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_namespace_is_resolvable() {
        let config = XmlPathConfig::new().declared_namespace("x", "http://something.com/test");
        assert_eq!(config.namespace_uri("x"), Some("http://something.com/test"));
        assert_eq!(config.namespace_uri("y"), None);
    }

    #[test]
    fn redeclaring_a_prefix_replaces_the_uri() {
        let config = XmlPathConfig::new()
            .declared_namespace("x", "urn:first")
            .declared_namespace("x", "urn:second");
        assert_eq!(config.namespace_uri("x"), Some("urn:second"));
        assert_eq!(config.declared_namespaces().len(), 1);
    }
}
