//! # Wiki Types
//!
//! Data model shared by the viewer core, the content server and the CLI.
//!
//! A [`Node`] is the same entity whether it arrived as a summary (id + title, from a list
//! fetch) or fully hydrated (with connections and content, from a single-node fetch). Every
//! optional field is skipped on serialisation when absent so the two hydration levels
//! round-trip without inventing empty values.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier of a content node.
pub type NodeId = i64;

/// A titled content item with optional outbound connections and content blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    /// Outbound connections by node id. Order is significant and duplicates are allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub content: Option<Vec<ContentBlock>>,
}

impl Node {
    /// Creates a summary-form node (id and title only).
    pub fn summary(id: NodeId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            connections: None,
            content: None,
        }
    }

    pub fn with_connections(mut self, connections: Vec<NodeId>) -> Self {
        self.connections = Some(connections);
        self
    }

    pub fn with_content(mut self, content: Vec<ContentBlock>) -> Self {
        self.content = Some(content);
        self
    }

    /// True once the node's content has been fetched.
    pub fn is_hydrated(&self) -> bool {
        self.content.is_some()
    }

    /// Connections, or an empty slice for summary-form nodes.
    pub fn connections(&self) -> &[NodeId] {
        self.connections.as_deref().unwrap_or(&[])
    }

    /// Content blocks, or an empty slice for summary-form nodes.
    pub fn content(&self) -> &[ContentBlock] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Returns a copy reduced to summary form.
    pub fn to_summary(&self) -> Self {
        Self::summary(self.id, self.title.clone())
    }
}

/// A single block of node content.
///
/// The set is closed. Blocks with an unrecognised `type` tag deserialise to
/// [`ContentBlock::Unknown`] and render as nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Raw text, possibly containing `{variableId|defaultText}` placeholders.
    Text { body: String },
    Image { url: String },
    #[serde(other)]
    Unknown,
}

impl ContentBlock {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::Image { url: url.into() }
    }
}

/// A named variable that placeholders refer to by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Variable {
    pub id: String,
    pub name: String,
}

impl Variable {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Request body of the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchReq {
    pub query: String,
}

/// A completed search, tagged with the exact trimmed query that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub results: Vec<Node>,
}

/// Errors that can occur when creating validated query types.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The input was empty or contained only whitespace
    #[error("search query cannot be empty")]
    Empty,
}

/// A search query that is guaranteed to be trimmed and non-empty.
///
/// Only values of this type are ever sent to the search endpoint, so a blank query can never
/// fire a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Creates a new `SearchQuery` from raw user input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed result is
    /// empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Raw text as typed into the search box
    ///
    /// # Returns
    ///
    /// Returns `Ok(SearchQuery)` if the trimmed input is non-empty,
    /// or `Err(QueryError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, QueryError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SearchQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_node_omits_optional_fields() {
        let s = serde_json::to_string(&Node::summary(1, "Node 1 title")).unwrap();
        assert_eq!(s, r#"{"id":1,"title":"Node 1 title"}"#);
    }

    #[test]
    fn content_blocks_use_type_tag() {
        let json = r#"[{"type":"text","body":"hello"},{"type":"image","url":"/a.png"}]"#;
        let blocks: Vec<ContentBlock> = serde_json::from_str(json).unwrap();
        assert_eq!(
            blocks,
            vec![ContentBlock::text("hello"), ContentBlock::image("/a.png")]
        );
    }

    #[test]
    fn unknown_content_tag_is_not_an_error() {
        let json = r#"{"id":7,"title":"t","content":[{"type":"video","src":"x"}]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.content(), &[ContentBlock::Unknown]);
    }

    #[test]
    fn search_query_is_trimmed() {
        let q = SearchQuery::new("  ent \n").unwrap();
        assert_eq!(q.as_str(), "ent");
    }

    #[test]
    fn blank_search_query_is_rejected() {
        assert!(matches!(SearchQuery::new("   "), Err(QueryError::Empty)));
        assert!(matches!(SearchQuery::new(""), Err(QueryError::Empty)));
    }
}
