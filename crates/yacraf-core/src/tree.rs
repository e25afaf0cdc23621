//! Tree Builder: turns the (possibly cyclic) attack event reference graph into rooted trees.
//!
//! A tree is an arena of *occurrences*: the same attack event may occur in several branches,
//! but never twice on one root-to-leaf path.

use crate::entities::{AttackEvent, EntityId};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// What to do when a child reference points back into the current ancestor path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Drop the cyclic child and keep descending into its remaining siblings.
    #[default]
    SkipCyclicChild,
    /// Drop the cyclic child and every sibling after it.
    TruncateSiblings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    pub cycle_policy: CyclePolicy,
}

pub type NodeIndex = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub event: EntityId,
    pub depth: usize,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A child edge the builder did not follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedEdge {
    pub parent: EntityId,
    pub child: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackTree {
    nodes: Vec<TreeNode>,
    truncated: Vec<SkippedEdge>,
    dangling: Vec<SkippedEdge>,
}

impl AttackTree {
    const ROOT: NodeIndex = 0;

    fn with_root(root: EntityId) -> Self {
        Self {
            nodes: vec![TreeNode {
                event: root,
                depth: 0,
                parent: None,
                children: Vec::new(),
            }],
            truncated: Vec::new(),
            dangling: Vec::new(),
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[Self::ROOT]
    }

    pub fn root_event(&self) -> EntityId {
        self.root().event
    }

    pub fn root_index(&self) -> NodeIndex {
        Self::ROOT
    }

    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, index: NodeIndex) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes
            .get(index)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|&c| self.nodes.get(c))
    }

    pub fn contains(&self, event: EntityId) -> bool {
        self.nodes.iter().any(|n| n.event == event)
    }

    /// Child edges dropped because they would close a cycle.
    pub fn truncated(&self) -> &[SkippedEdge] {
        &self.truncated
    }

    /// Child edges dropped because the child id names no attack event.
    pub fn dangling(&self) -> &[SkippedEdge] {
        &self.dangling
    }

    pub fn height(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Breadth-first walk over `(index, node)`, starting at the root. Each call starts over.
    pub fn breadth_first(&self) -> impl Iterator<Item = (NodeIndex, &TreeNode)> + '_ {
        let mut queue = VecDeque::from([Self::ROOT]);
        std::iter::from_fn(move || {
            let index = queue.pop_front()?;
            let node = &self.nodes[index];
            queue.extend(node.children.iter().copied());
            Some((index, node))
        })
    }

    /// Pre-order depth-first walk over `(index, node)`.
    pub fn depth_first(&self) -> impl Iterator<Item = (NodeIndex, &TreeNode)> + '_ {
        let mut stack = vec![Self::ROOT];
        std::iter::from_fn(move || {
            let index = stack.pop()?;
            let node = &self.nodes[index];
            stack.extend(node.children.iter().rev().copied());
            Some((index, node))
        })
    }

    /// Event ids from `index` up to the root, `index` first.
    pub fn path_to_root(&self, index: NodeIndex) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut cur = self.nodes.get(index);
        while let Some(node) = cur {
            out.push(node.event);
            cur = node.parent.and_then(|p| self.nodes.get(p));
        }
        out
    }

    fn push_child(&mut self, parent: NodeIndex, event: EntityId) -> NodeIndex {
        let index = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(TreeNode {
            event,
            depth,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(index);
        index
    }

    /// Depth-first expansion from the root with an explicit stack of `(node, next child)` frames.
    ///
    /// `path` holds the events of the open frames, so a child already on it closes a cycle.
    fn grow(&mut self, events: &IndexMap<EntityId, AttackEvent>, policy: CyclePolicy) {
        let mut path = FxHashSet::default();
        let mut stack: Vec<(NodeIndex, usize)> = Vec::new();
        let root = self.nodes[Self::ROOT].event;
        if events.contains_key(&root) {
            path.insert(root);
            stack.push((Self::ROOT, 0));
        }

        while let Some(&(index, next)) = stack.last() {
            let event_id = self.nodes[index].event;
            let child = events
                .get(&event_id)
                .and_then(|event| event.children.get_index(next))
                .map(|(&child, _)| child);
            let Some(child) = child else {
                path.remove(&event_id);
                stack.pop();
                continue;
            };
            if let Some(frame) = stack.last_mut() {
                frame.1 += 1;
            }

            if path.contains(&child) {
                tracing::debug!(parent = event_id, child, ?policy, "attack event cycle truncated");
                self.truncated.push(SkippedEdge {
                    parent: event_id,
                    child,
                });
                match policy {
                    CyclePolicy::SkipCyclicChild => continue,
                    CyclePolicy::TruncateSiblings => {
                        path.remove(&event_id);
                        stack.pop();
                        continue;
                    }
                }
            }
            if !events.contains_key(&child) {
                tracing::warn!(parent = event_id, child, "attack event child does not exist");
                self.dangling.push(SkippedEdge {
                    parent: event_id,
                    child,
                });
                continue;
            }
            let child_index = self.push_child(index, child);
            path.insert(child);
            stack.push((child_index, 0));
        }
    }
}

impl fmt::Display for AttackTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, node) in self.depth_first() {
            writeln!(f, "{:indent$}{}", "", node.event, indent = node.depth * 2)?;
        }
        Ok(())
    }
}

/// Builds the tree rooted at `root` by walking the `children` references of `events`.
///
/// Returns `None` when `root` is not an attack event of `events`.
pub fn build_tree(
    root: EntityId,
    events: &IndexMap<EntityId, AttackEvent>,
    options: &TreeOptions,
) -> Option<AttackTree> {
    if !events.contains_key(&root) {
        return None;
    }
    let mut tree = AttackTree::with_root(root);
    tree.grow(events, options.cycle_policy);
    Some(tree)
}

/// One independent tree per attack event without parents, in document order.
pub fn build_forest(
    events: &IndexMap<EntityId, AttackEvent>,
    options: &TreeOptions,
) -> Vec<AttackTree> {
    events
        .values()
        .filter(|e| e.is_root())
        .filter_map(|e| build_tree(e.id, events, options))
        .collect()
}
