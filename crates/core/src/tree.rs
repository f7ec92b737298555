//! Arena forest for self-referencing records.
//!
//! Categories and comment threads are stored flat with a nullable parent id.
//! [`Forest`] loads such a flat list into an arena, validates it, and keeps
//! every sibling list sorted by the node's sort key (ties broken by id), so
//! traversal order never depends on load or insertion order.

use std::cmp::Ordering;
use std::collections::HashMap;

use quire_common::AppError;
use quire_db::entities::{category, comment};
use sea_orm::prelude::DateTimeWithTimeZone;
use thiserror::Error;

/// A record that can be placed in a [`Forest`].
pub trait TreeNode {
    /// Key ordering siblings.
    type SortKey: Ord;

    /// Unique id of the node.
    fn id(&self) -> &str;

    /// Id of the parent node, `None` for roots.
    fn parent_id(&self) -> Option<&str>;

    /// Key ordering this node among its siblings.
    fn sort_key(&self) -> Self::SortKey;
}

impl TreeNode for category::Model {
    type SortKey = String;

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn sort_key(&self) -> String {
        self.title.clone()
    }
}

impl TreeNode for comment::Model {
    type SortKey = DateTimeWithTimeZone;

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn sort_key(&self) -> DateTimeWithTimeZone {
        self.created_at
    }
}

/// Structural problems found while building or growing a forest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {id} references missing parent {parent_id}")]
    MissingParent { id: String, parent_id: String },

    #[error("node {0} is part of a cycle")]
    Cycle(String),

    #[error("duplicate node id {0}")]
    DuplicateId(String),
}

impl From<TreeError> for AppError {
    fn from(err: TreeError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A validated set of trees.
#[derive(Debug, Clone)]
pub struct Forest<N: TreeNode> {
    nodes: Vec<N>,
    index: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

fn sibling_order<N: TreeNode>(a: &N, b: &N) -> Ordering {
    a.sort_key()
        .cmp(&b.sort_key())
        .then_with(|| a.id().cmp(b.id()))
}

impl<N: TreeNode> Default for Forest<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            children: Vec::new(),
            roots: Vec::new(),
        }
    }
}

impl<N: TreeNode> Forest<N> {
    /// Build a forest from a flat list of nodes in any order.
    pub fn build(nodes: Vec<N>) -> Result<Self, TreeError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id().to_string(), i).is_some() {
                return Err(TreeError::DuplicateId(node.id().to_string()));
            }
        }

        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            match node.parent_id() {
                None => roots.push(i),
                Some(parent_id) => {
                    let parent = *index.get(parent_id).ok_or_else(|| TreeError::MissingParent {
                        id: node.id().to_string(),
                        parent_id: parent_id.to_string(),
                    })?;
                    children[parent].push(i);
                }
            }
        }

        roots.sort_by(|&a, &b| sibling_order(&nodes[a], &nodes[b]));
        for list in &mut children {
            list.sort_by(|&a, &b| sibling_order(&nodes[a], &nodes[b]));
        }

        let forest = Self {
            nodes,
            index,
            children,
            roots,
        };

        // Every node has a single parent, so anything unreachable from a
        // root sits on (or hangs off) a cycle.
        let mut reached = vec![false; forest.nodes.len()];
        for (_, i) in forest.preorder(&forest.roots) {
            reached[i] = true;
        }
        if let Some(i) = reached.iter().position(|r| !r) {
            return Err(TreeError::Cycle(forest.nodes[i].id().to_string()));
        }

        Ok(forest)
    }

    /// Add a node, keeping its siblings sorted.
    pub fn insert(&mut self, node: N) -> Result<(), TreeError> {
        if self.index.contains_key(node.id()) {
            return Err(TreeError::DuplicateId(node.id().to_string()));
        }

        let parent = match node.parent_id() {
            None => None,
            Some(parent_id) => Some(*self.index.get(parent_id).ok_or_else(|| {
                TreeError::MissingParent {
                    id: node.id().to_string(),
                    parent_id: parent_id.to_string(),
                }
            })?),
        };

        let i = self.nodes.len();
        let siblings = match parent {
            None => &mut self.roots,
            Some(p) => &mut self.children[p],
        };
        let nodes = &self.nodes;
        let pos = siblings
            .partition_point(|&s| sibling_order(&nodes[s], &node) == Ordering::Less);
        siblings.insert(pos, i);

        self.index.insert(node.id().to_string(), i);
        self.children.push(Vec::new());
        self.nodes.push(node);
        Ok(())
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&N> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Whether a node with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Root nodes in sibling order.
    #[must_use]
    pub fn roots(&self) -> Vec<&N> {
        self.roots.iter().map(|&i| &self.nodes[i]).collect()
    }

    /// Direct children of `id` in sibling order; empty for unknown ids.
    #[must_use]
    pub fn children_of(&self, id: &str) -> Vec<&N> {
        self.index
            .get(id)
            .map(|&i| self.children[i].iter().map(|&c| &self.nodes[c]).collect())
            .unwrap_or_default()
    }

    /// All descendants of `id` in pre-order, excluding `id` itself.
    #[must_use]
    pub fn descendants_of(&self, id: &str) -> Vec<&N> {
        let Some(&i) = self.index.get(id) else {
            return Vec::new();
        };
        self.preorder(&self.children[i])
            .map(|(_, d)| &self.nodes[d])
            .collect()
    }

    /// Ancestors of `id` from the root down to its parent.
    #[must_use]
    pub fn ancestors_of(&self, id: &str) -> Vec<&N> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent_id());
        while let Some(parent_id) = current {
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            chain.push(parent);
            current = parent.parent_id();
        }
        chain.reverse();
        chain
    }

    /// Whether `id` has no children. Unknown ids are not leaves.
    #[must_use]
    pub fn is_leaf(&self, id: &str) -> bool {
        self.index
            .get(id)
            .is_some_and(|&i| self.children[i].is_empty())
    }

    /// Depth of `id`, roots being at depth 0.
    #[must_use]
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.get(id).map(|_| self.ancestors_of(id).len())
    }

    /// Every node in pre-order with its depth.
    #[must_use]
    pub fn walk(&self) -> Vec<(usize, &N)> {
        self.preorder(&self.roots)
            .map(|(depth, i)| (depth, &self.nodes[i]))
            .collect()
    }

    /// Ids of `id` and all its descendants, in pre-order.
    #[must_use]
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        let Some(&i) = self.index.get(id) else {
            return Vec::new();
        };
        self.preorder(&[i])
            .map(|(_, s)| self.nodes[s].id().to_string())
            .collect()
    }

    /// Remove `id` and all its descendants, returning the removed ids in
    /// pre-order. Unknown ids remove nothing.
    pub fn delete_subtree(&mut self, id: &str) -> Vec<String> {
        let removed = self.subtree_ids(id);
        if removed.is_empty() {
            return removed;
        }

        let nodes = std::mem::take(&mut self.nodes);
        let kept: Vec<N> = nodes
            .into_iter()
            .filter(|n| !removed.iter().any(|r| r == n.id()))
            .collect();

        // Rebuilding cannot fail: removing whole subtrees keeps every
        // remaining parent reference valid.
        *self = Self::build(kept).unwrap_or_default();
        removed
    }

    /// Pre-order traversal starting from `starts`, yielding `(depth, index)`
    /// with depth relative to the starting level.
    fn preorder<'a>(&'a self, starts: &[usize]) -> impl Iterator<Item = (usize, usize)> + 'a {
        let mut stack: Vec<(usize, usize)> = starts.iter().rev().map(|&i| (0, i)).collect();
        std::iter::from_fn(move || {
            let (depth, i) = stack.pop()?;
            stack.extend(self.children[i].iter().rev().map(|&c| (depth + 1, c)));
            Some((depth, i))
        })
    }
}
