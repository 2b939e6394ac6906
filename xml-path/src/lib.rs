//! Namespace-aware path queries over XML documents.
//!
//! # Overview
//! `XmlPath` evaluates dotted path expressions such as
//! `x:response.x:container.x:item[0].x:name` against a document. The first
//! step names the root element. Every following step selects matching child
//! elements of the current selection, and `[n]` picks one element out of
//! everything that step matched.
//!
//! # Namespaces
//! - `name` matches the local name regardless of namespace.
//! - `:name` matches only elements without a namespace.
//! - `p:name` matches elements in the namespace declared for `p` through
//!   [`XmlPathConfig`]. An undeclared prefix matches nothing.
//! - `'p:name'` is the same as `p:name`; quoting only keeps the token intact.

mod config;
mod error;
mod path;

use roxmltree::{Document, Node};
use tracing::trace;

pub use config::XmlPathConfig;
pub use error::XmlPathError;

use path::{NameTest, Step};

/// A parsed-on-demand XML document plus the namespace configuration used to
/// evaluate paths against it.
#[derive(Debug, Clone)]
pub struct XmlPath {
    xml: String,
    config: XmlPathConfig,
}

enum Selection<'a, 'input> {
    Nodes(Vec<Node<'a, 'input>>),
    Values(Vec<String>),
}

impl XmlPath {
    /// Check that `xml` is well-formed and keep it for later queries.
    pub fn new(xml: impl Into<String>) -> Result<Self, XmlPathError> {
        let xml = xml.into();
        Document::parse(&xml)?;
        Ok(Self {
            xml,
            config: XmlPathConfig::default(),
        })
    }

    pub fn using(mut self, config: XmlPathConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &XmlPathConfig {
        &self.config
    }

    /// Text of everything `path` selects, concatenated in document order.
    /// Returns an empty string when nothing matches.
    pub fn get_string(&self, path: &str) -> Result<String, XmlPathError> {
        Ok(self.get_list(path)?.concat())
    }

    /// Text of each selected node (or each selected attribute value).
    pub fn get_list(&self, path: &str) -> Result<Vec<String>, XmlPathError> {
        let steps = path::parse(path)?;
        let document = Document::parse(&self.xml)?;
        let values = match self.select(&document, path, &steps)? {
            Selection::Nodes(nodes) => nodes.iter().map(|node| text_of(*node)).collect(),
            Selection::Values(values) => values,
        };
        trace!(path, matches = values.len(), "evaluated xml path");
        Ok(values)
    }

    /// Number of nodes or values `path` selects.
    pub fn size(&self, path: &str) -> Result<usize, XmlPathError> {
        Ok(self.get_list(path)?.len())
    }

    fn select<'a, 'input>(
        &self,
        document: &'a Document<'input>,
        path: &str,
        steps: &[Step],
    ) -> Result<Selection<'a, 'input>, XmlPathError> {
        let mut selection: Option<Selection<'a, 'input>> = None;

        for step in steps {
            let nodes = match selection {
                None => None,
                Some(Selection::Nodes(nodes)) => Some(nodes),
                Some(Selection::Values(_)) => {
                    return Err(XmlPathError::invalid_path(
                        path,
                        "cannot navigate below text() or an attribute",
                    ))
                }
            };

            selection = Some(match step {
                Step::Element { name, index } => {
                    let candidates: Vec<Node<'a, 'input>> = match nodes {
                        None => vec![document.root_element()],
                        Some(nodes) => nodes
                            .iter()
                            .flat_map(|node| node.children().filter(Node::is_element))
                            .collect(),
                    };
                    let matched: Vec<_> = candidates
                        .into_iter()
                        .filter(|node| self.matches(name, *node))
                        .collect();
                    Selection::Nodes(match index {
                        Some(i) => matched.get(*i).copied().into_iter().collect(),
                        None => matched,
                    })
                }
                Step::Text => Selection::Values(
                    nodes
                        .unwrap_or_else(|| vec![document.root_element()])
                        .into_iter()
                        .map(text_of)
                        .collect(),
                ),
                Step::Attribute(attribute) => Selection::Values(
                    nodes
                        .unwrap_or_else(|| vec![document.root_element()])
                        .into_iter()
                        .filter_map(|node| node.attribute(attribute.as_str()).map(str::to_string))
                        .collect(),
                ),
            });
        }

        Ok(selection.unwrap_or(Selection::Nodes(Vec::new())))
    }

    fn matches(&self, test: &NameTest, node: Node<'_, '_>) -> bool {
        let tag = node.tag_name();
        match test {
            NameTest::Wildcard => true,
            NameTest::Any(local) => tag.name() == local.as_str(),
            NameTest::Unqualified(local) => tag.namespace().is_none() && tag.name() == local.as_str(),
            NameTest::Prefixed { prefix, local } => match self.config.namespace_uri(prefix) {
                Some(uri) => tag.namespace() == Some(uri) && tag.name() == local.as_str(),
                None => false,
            },
        }
    }
}

fn text_of(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}
