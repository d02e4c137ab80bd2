//! Keyed cache of fetched nodes and variables.
//!
//! The store is populated from the node list at startup and enriched as individual nodes are
//! hydrated. Entries are never evicted. Every ingest is a shallow field-wise merge, so a summary
//! arriving after a detail response never wipes the detail fields, and the final state does
//! not depend on which of the two completed first.

use indexmap::IndexMap;
use std::collections::HashMap;
use wiki_types::{Node, NodeId, Variable};

/// Variable dictionary keyed by variable id.
pub type Variables = HashMap<String, Variable>;

/// Outcome of looking up a connection id in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Found(&'a Node),
    /// The id has no store entry. Callers render this as an absent child.
    Missing(NodeId),
}

impl<'a> Resolved<'a> {
    pub fn node(self) -> Option<&'a Node> {
        match self {
            Resolved::Found(node) => Some(node),
            Resolved::Missing(_) => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ContentStore {
    nodes: IndexMap<NodeId, Node>,
    variables: Variables,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a batch of summary or partial nodes into the store.
    pub fn ingest_list(&mut self, nodes: impl IntoIterator<Item = Node>) {
        let mut count = 0usize;
        for node in nodes {
            self.merge(node);
            count += 1;
        }
        tracing::debug!(count, total = self.nodes.len(), "ingested node list");
    }

    /// Merges a single hydrated node into the store.
    pub fn ingest_one(&mut self, node: Node) {
        tracing::debug!(id = node.id, hydrated = node.is_hydrated(), "ingested node");
        self.merge(node);
    }

    /// Adds variables to the dictionary. A variable with a known id replaces the old entry.
    pub fn ingest_variables(&mut self, variables: impl IntoIterator<Item = Variable>) {
        for variable in variables {
            self.variables.insert(variable.id.clone(), variable);
        }
    }

    // Fields present on the incoming node win; absent fields keep what is already known.
    fn merge(&mut self, node: Node) {
        match self.nodes.get_mut(&node.id) {
            Some(existing) => {
                existing.title = node.title;
                if node.connections.is_some() {
                    existing.connections = node.connections;
                }
                if node.content.is_some() {
                    existing.content = node.content;
                }
            }
            None => {
                self.nodes.insert(node.id, node);
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes in first-insertion order. These are the sidebar's root rows.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Maps each id to its store entry, preserving input order and duplicates.
    pub fn resolve_connections(&self, ids: &[NodeId]) -> Vec<Resolved<'_>> {
        ids.iter()
            .map(|id| match self.nodes.get(id) {
                Some(node) => Resolved::Found(node),
                None => Resolved::Missing(*id),
            })
            .collect()
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
