//! Path-addressed navigation over the sidebar tree.
//!
//! Every visible row is addressed by the ids traversed from a root to reach it, so the same
//! node can appear at several paths with independent state. The navigator stores only the
//! active path; whether a row is expanded or active is derived from it on every call:
//!
//! - a row at path `P` is expanded iff the active path is non-empty and starts with `P`
//!   (element-wise, so `[1, 23]` and `[12, 3]` never collide);
//! - a row is active iff its path equals the active path.
//!
//! Rows at depth [`MAX_EXPANSION_DEPTH`] never materialise their connections, which caps the
//! tree at three levels and keeps cyclic connection graphs finite.

use crate::constants::MAX_EXPANSION_DEPTH;
use crate::store::{ContentStore, Resolved};
use crate::{WikiError, WikiResult};
use wiki_types::{Node, NodeId};

/// Ids traversed from a root row to the selected row.
pub type NavigationPath = Vec<NodeId>;

/// One materialised sidebar row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub path: NavigationPath,
    pub id: NodeId,
    pub title: String,
    pub depth: usize,
    pub expanded: bool,
    pub active: bool,
}

#[derive(Debug, Default, Clone)]
pub struct TreeNavigator {
    active_path: NavigationPath,
}

impl TreeNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a click on the row for `id` reached via `path`.
    ///
    /// The previous active path is simply replaced; collapsing the old branch falls out of
    /// the prefix rule.
    ///
    /// # Returns
    ///
    /// The id whose detail should be fetched.
    ///
    /// # Errors
    ///
    /// Returns `WikiError::InvalidInput` if `path` is empty, does not end with `id`, or is
    /// deeper than the tree can render.
    pub fn click(&mut self, id: NodeId, path: NavigationPath) -> WikiResult<NodeId> {
        if path.last() != Some(&id) {
            return Err(WikiError::InvalidInput(format!(
                "click path {path:?} must end with node {id}"
            )));
        }
        if path.len() > MAX_EXPANSION_DEPTH + 1 {
            return Err(WikiError::InvalidInput(format!(
                "click path {path:?} is deeper than {} levels",
                MAX_EXPANSION_DEPTH + 1
            )));
        }

        tracing::debug!(?path, "active path changed");
        self.active_path = path;
        Ok(id)
    }

    pub fn active_path(&self) -> &[NodeId] {
        &self.active_path
    }

    /// The selected node, if any.
    pub fn active_node(&self) -> Option<NodeId> {
        self.active_path.last().copied()
    }

    pub fn is_expanded(&self, path: &[NodeId]) -> bool {
        !self.active_path.is_empty() && self.active_path.starts_with(path)
    }

    pub fn is_active(&self, path: &[NodeId]) -> bool {
        self.active_path == path
    }

    /// Materialises the visible tree in display order.
    ///
    /// Roots follow the store's iteration order. Connections that have no store entry are
    /// skipped; repeated ids are rendered once per occurrence.
    pub fn rows(&self, store: &ContentStore) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        let mut path = Vec::with_capacity(MAX_EXPANSION_DEPTH + 1);
        for root in store.roots() {
            self.push_rows(store, root, &mut path, 0, &mut rows);
        }
        rows
    }

    fn push_rows(
        &self,
        store: &ContentStore,
        node: &Node,
        path: &mut NavigationPath,
        depth: usize,
        rows: &mut Vec<TreeRow>,
    ) {
        path.push(node.id);

        let expanded = self.is_expanded(path);
        rows.push(TreeRow {
            path: path.clone(),
            id: node.id,
            title: node.title.clone(),
            depth,
            expanded,
            active: self.is_active(path),
        });

        if expanded && depth < MAX_EXPANSION_DEPTH {
            for child in store.resolve_connections(node.connections()) {
                match child {
                    Resolved::Found(child) => {
                        self.push_rows(store, child, path, depth + 1, rows);
                    }
                    Resolved::Missing(id) => {
                        tracing::debug!(id, parent = node.id, "skipping unresolved connection");
                    }
                }
            }
        }

        path.pop();
    }
}
