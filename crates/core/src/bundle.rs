//! A complete set of nodes and variables loaded from one file.
//!
//! The development content server and the in-process [`StaticContentApi`] both answer the
//! four content API operations from a bundle.
//!
//! [`StaticContentApi`]: crate::api::StaticContentApi

use crate::{WikiError, WikiResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use wiki_types::{ContentBlock, Node, NodeId, Variable};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBundle {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl ContentBundle {
    pub fn new(nodes: Vec<Node>, variables: Vec<Variable>) -> Self {
        Self { nodes, variables }
    }

    /// Loads a bundle from disk.
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML; everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns `WikiError::FileRead` if the file cannot be read, or a deserialisation error
    /// if its contents do not describe a bundle.
    pub fn from_path(path: &Path) -> WikiResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(WikiError::FileRead)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let bundle = if is_yaml {
            Self::from_yaml_str(&contents)?
        } else {
            Self::from_json_str(&contents)?
        };
        tracing::info!(
            nodes = bundle.nodes.len(),
            variables = bundle.variables.len(),
            "loaded content bundle from {}",
            path.display()
        );
        Ok(bundle)
    }

    pub fn from_json_str(contents: &str) -> WikiResult<Self> {
        serde_json::from_str(contents).map_err(WikiError::Deserialization)
    }

    pub fn from_yaml_str(contents: &str) -> WikiResult<Self> {
        serde_yaml::from_str(contents).map_err(WikiError::YamlDeserialization)
    }

    /// Every node in summary form, in bundle order.
    pub fn summaries(&self) -> Vec<Node> {
        self.nodes.iter().map(Node::to_summary).collect()
    }

    /// Every node with the given id, fully hydrated.
    ///
    /// A well-formed bundle yields exactly one node; callers enforce that.
    pub fn detail(&self, id: NodeId) -> Vec<Node> {
        self.nodes.iter().filter(|n| n.id == id).cloned().collect()
    }

    /// Nodes whose title or text content contains any whitespace-separated token of `query`,
    /// ignoring case.
    ///
    /// Results carry their title and content but not their connections.
    pub fn search(&self, query: &str) -> Vec<Node> {
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        self.nodes
            .iter()
            .filter(|node| {
                let mut haystacks = std::iter::once(node.title.to_lowercase()).chain(
                    node.content().iter().filter_map(|block| match block {
                        ContentBlock::Text { body } => Some(body.to_lowercase()),
                        _ => None,
                    }),
                );
                haystacks.any(|h| tokens.iter().any(|t| h.contains(t.as_str())))
            })
            .map(|node| Node {
                id: node.id,
                title: node.title.clone(),
                connections: None,
                content: node.content.clone(),
            })
            .collect()
    }
}
