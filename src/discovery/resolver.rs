//! WOPI discovery resolution
//!
//! Fetches the discovery XML, locates the WopiTest action and derives the
//! validator endpoint from its `urlsrc` attribute.

use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::http::{HttpClient, HttpError};

/// Attribute on the WopiTest action that carries the validator URL
pub const URLSRC_ATTRIBUTE: &str = "urlsrc";

/// Discovery resolution errors. Every variant is fatal to a run.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to retrieve WOPI Discovery Service XML: {0}")]
    Transport(#[from] HttpError),

    #[error("Failed to retrieve WOPI Discovery Service XML: {status} for url {url}")]
    Status { status: String, url: String },

    #[error("Failed to parse WOPI Discovery Service XML: {0}")]
    Parse(String),

    #[error("Failed to parse WOPI Discovery Service XML: no element matches {0}")]
    MissingNode(String),

    #[error("Failed to parse WOPI Discovery Service XML: {node} has no '{attribute}' attribute")]
    MissingAttribute { node: String, attribute: String },
}

/// One element step of a [`NodePath`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathStep {
    pub element: &'static str,
    pub predicate: Option<(&'static str, &'static str)>,
}

impl PathStep {
    pub const fn element(element: &'static str) -> Self {
        Self {
            element,
            predicate: None,
        }
    }

    pub const fn with_attr(element: &'static str, name: &'static str, value: &'static str) -> Self {
        Self {
            element,
            predicate: Some((name, value)),
        }
    }

    fn matches(&self, node: roxmltree::Node<'_, '_>) -> bool {
        node.is_element()
            && node.tag_name().name() == self.element
            && self
                .predicate
                .map_or(true, |(name, value)| node.attribute(name) == Some(value))
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.predicate {
            Some((name, value)) => write!(f, "{}[@{}='{}']", self.element, name, value),
            None => write!(f, "{}", self.element),
        }
    }
}

/// Element path from the document root, matched by local name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePath {
    steps: Vec<PathStep>,
}

impl NodePath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// `wopi-discovery/net-zone/app[@name='WopiTest']/action[@ext='wopitest']`
    pub fn wopi_test_action() -> Self {
        Self::new(vec![
            PathStep::element("wopi-discovery"),
            PathStep::element("net-zone"),
            PathStep::with_attr("app", "name", "WopiTest"),
            PathStep::with_attr("action", "ext", "wopitest"),
        ])
    }

    /// First element matching the path, in document order
    fn find<'a, 'input>(
        &self,
        doc: &'a roxmltree::Document<'input>,
    ) -> Option<roxmltree::Node<'a, 'input>> {
        let (first, rest) = self.steps.split_first()?;
        let root = doc.root_element();
        if !first.matches(root) {
            return None;
        }
        find_below(root, rest)
    }
}

fn find_below<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    steps: &[PathStep],
) -> Option<roxmltree::Node<'a, 'input>> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(node);
    };
    node.children()
        .filter(|child| step.matches(*child))
        .find_map(|child| find_below(child, rest))
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("/"))
    }
}

impl Default for NodePath {
    fn default() -> Self {
        Self::wopi_test_action()
    }
}

/// Validator endpoint URL. Never carries a query string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TestEndpoint(String);

impl TestEndpoint {
    /// Build from a discovery `urlsrc`, dropping everything from the first `?`
    pub fn from_urlsrc(urlsrc: &str) -> Self {
        let end = urlsrc.find('?').unwrap_or(urlsrc.len());
        Self(urlsrc[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a discovery document and derive the test endpoint from it
pub fn extract_endpoint(
    xml: &str,
    path: &NodePath,
    attribute: &str,
) -> Result<TestEndpoint, DiscoveryError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| DiscoveryError::Parse(e.to_string()))?;

    let node = path
        .find(&doc)
        .ok_or_else(|| DiscoveryError::MissingNode(path.to_string()))?;

    let urlsrc = node
        .attribute(attribute)
        .ok_or_else(|| DiscoveryError::MissingAttribute {
            node: path.to_string(),
            attribute: attribute.to_string(),
        })?;

    debug!("Discovered urlsrc: {}", urlsrc);
    Ok(TestEndpoint::from_urlsrc(urlsrc))
}

/// Resolves the validator endpoint from a discovery service
pub struct DiscoveryResolver {
    client: HttpClient,
    path: NodePath,
    attribute: &'static str,
}

impl DiscoveryResolver {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            path: NodePath::default(),
            attribute: URLSRC_ATTRIBUTE,
        }
    }

    /// Fetch the discovery document and extract the test endpoint
    pub async fn resolve(&self, discovery_url: &str) -> Result<TestEndpoint, DiscoveryError> {
        info!("WOPI Discovery Service Url: {}", discovery_url);

        let response = self.client.get(discovery_url).await?;
        if !response.is_success() {
            return Err(DiscoveryError::Status {
                status: response.status_line(),
                url: response.url,
            });
        }

        extract_endpoint(&response.body, &self.path, self.attribute)
    }
}
