// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: the node arena, update application, traversal, and queries.

use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Rect};

use crate::decode::NodeRecord;
use crate::matrix::{Matrix4, homogeneous_to_point};
use crate::node::SemanticsNode;
use crate::types::{CustomAction, NodeId, SemanticsFlags};

/// Host-side cache of the engine's semantics tree.
///
/// Nodes live in an arena keyed by [`NodeId`]; parent and child links are ids,
/// never owning pointers, so malformed input (a node listed as its own
/// descendant, a child shared by two parents) cannot produce anything worse
/// than a node being visited once.
///
/// Changes do **not** take effect in one step. Records are applied with
/// [`SemanticsTree::apply`], and [`SemanticsTree::commit`] then walks the tree
/// from the root to resolve parent links and global geometry and to evict every
/// node the walk did not reach.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use semantics_tree::{NodeData, NodeId, NodeRecord, SemanticsActions, SemanticsTree};
///
/// let mut tree = SemanticsTree::new();
/// let root = NodeData {
///     rect: Rect::new(0.0, 0.0, 100.0, 100.0),
///     actions: SemanticsActions::TAP,
///     ..NodeData::default()
/// };
/// tree.apply(vec![NodeRecord { id: NodeId::ROOT, data: root }]);
/// tree.commit(|_| {});
///
/// assert_eq!(tree.global_rect(NodeId::ROOT), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
/// assert_eq!(tree.hit_test(Point::new(50.0, 50.0), false), Some(NodeId::ROOT));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SemanticsTree {
    nodes: HashMap<NodeId, SemanticsNode>,
    custom_actions: HashMap<i32, CustomAction>,
}

/// What [`SemanticsTree::apply`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Applied {
    /// Decoded nodes, in record order.
    pub decoded: Vec<NodeId>,
    /// Nodes created by this update, either decoded or first referenced as children.
    pub created: Vec<NodeId>,
    /// True if any node was decoded for the first time or received data
    /// different from what it held.
    pub changed: bool,
}

/// What [`SemanticsTree::commit`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Commit {
    /// Nodes evicted because the walk did not reach them, in ascending id order.
    pub removed: Vec<NodeId>,
    /// Route-scoping nodes in depth-first traversal order.
    pub routes: Vec<NodeId>,
}

impl SemanticsTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node is cached.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&SemanticsNode> {
        self.nodes.get(&id)
    }

    /// Look up a node mutably, for local predictions made ahead of the engine.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SemanticsNode> {
        self.nodes.get_mut(&id)
    }

    /// Returns true if `id` is cached.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The root node, if the tree is non-empty.
    pub fn root(&self) -> Option<&SemanticsNode> {
        self.nodes.get(&NodeId::ROOT)
    }

    /// Iterate all cached nodes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &SemanticsNode> + '_ {
        self.nodes.values()
    }

    /// Drop every node and custom action.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.custom_actions.clear();
    }

    /// Look up a custom action by its engine id.
    pub fn custom_action(&self, id: i32) -> Option<&CustomAction> {
        self.custom_actions.get(&id)
    }

    /// Record or refresh custom action definitions.
    ///
    /// Actions are keyed by id only; an id always names the same action
    /// instance, so a repeated definition overwrites the cached one in place.
    pub fn apply_custom_actions(&mut self, actions: impl IntoIterator<Item = CustomAction>) {
        for action in actions {
            match self.custom_actions.get_mut(&action.id) {
                Some(slot) => *slot = action,
                None => {
                    self.custom_actions.insert(action.id, action);
                }
            }
        }
    }

    fn get_or_create(&mut self, id: NodeId, created: &mut Vec<NodeId>) -> &mut SemanticsNode {
        self.nodes.entry(id).or_insert_with(|| {
            created.push(id);
            SemanticsNode::new(id)
        })
    }

    /// Apply decoded records in order.
    ///
    /// Each record snapshots the node's previous state, overwrites its data,
    /// and marks its geometry dirty. Children referenced for the first time are
    /// created empty so that the next [`SemanticsTree::commit`] can reach them.
    pub fn apply(&mut self, records: impl IntoIterator<Item = NodeRecord>) -> Applied {
        let mut applied = Applied::default();
        for NodeRecord { id, data } in records {
            for &child in data
                .children_in_traversal_order
                .iter()
                .chain(data.children_in_hit_test_order.iter())
            {
                self.get_or_create(child, &mut applied.created);
            }
            let node = self.get_or_create(id, &mut applied.created);
            applied.changed |= node.update_with(data);
            applied.decoded.push(id);
        }
        applied
    }

    /// Walk from the root, resolve geometry, and evict unreachable nodes.
    ///
    /// For every node reached, the walk records its parent and the sibling read
    /// before it, and recomputes the global transform and bounds when the node
    /// or an ancestor was marked dirty. Unreached nodes are passed to `teardown`
    /// and then removed.
    pub fn commit<F>(&mut self, teardown: F) -> Commit
    where
        F: FnMut(&SemanticsNode),
    {
        self.commit_inner(false, teardown)
    }

    /// Like [`SemanticsTree::commit`], but recomputes the geometry of every reachable node.
    pub fn commit_forced<F>(&mut self, teardown: F) -> Commit
    where
        F: FnMut(&SemanticsNode),
    {
        self.commit_inner(true, teardown)
    }

    fn commit_inner<F>(&mut self, force: bool, mut teardown: F) -> Commit
    where
        F: FnMut(&SemanticsNode),
    {
        let mut commit = Commit::default();
        let mut visited: HashSet<NodeId> = HashSet::with_capacity(self.nodes.len());

        if self.nodes.contains_key(&NodeId::ROOT) {
            self.update_recursive(force, &mut visited, &mut commit.routes);
        }

        let mut removed: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| !visited.contains(id))
            .collect();
        removed.sort_unstable();
        for id in &removed {
            if let Some(node) = self.nodes.get(id) {
                tracing::trace!(node = %id, "evicting unreachable semantics node");
                teardown(node);
            }
            self.nodes.remove(id);
        }
        commit.removed = removed;

        debug_assert!(
            self.check_invariants(),
            "semantics tree structure is inconsistent after commit"
        );
        commit
    }

    fn update_recursive(
        &mut self,
        force_all: bool,
        visited: &mut HashSet<NodeId>,
        routes: &mut Vec<NodeId>,
    ) {
        // Depth-first, root to leaves, propagating global transforms. Each stack entry
        // carries (node, parent, previous sibling, parent global transform, forced).
        let mut stack = alloc::vec![(NodeId::ROOT, None, None, Matrix4::IDENTITY, force_all)];

        while let Some((id, parent, previous_sibling, parent_tf, forced)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            node.parent = parent;
            node.previous_sibling = previous_sibling;

            let force = forced || node.geometry.dirty;
            if force {
                let global = parent_tf.mul(&node.data.transform);
                node.geometry.global_transform = global;
                node.geometry.global_rect = global.transform_rect_bbox(node.data.rect);
                node.geometry.inverse_hit_test_transform =
                    node.data.hit_test_transform.inverse_or_zero();
                node.geometry.dirty = false;
            }
            if node.has_flag(SemanticsFlags::SCOPES_ROUTE) {
                routes.push(id);
            }

            let global = node.geometry.global_transform;
            let children = &node.data.children_in_traversal_order;
            // Push in reverse so children pop in traversal order.
            for (i, &child) in children.iter().enumerate().rev() {
                let before = i.checked_sub(1).map(|j| children[j]);
                stack.push((child, Some(id), before, global, force));
            }
        }
    }

    /// Global bounds of a node as of the last commit.
    pub fn global_rect(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(&id).and_then(SemanticsNode::global_rect)
    }

    /// Hit test a point given in the root's local coordinates.
    ///
    /// Children are tried in hit-test order and the first match wins, so that
    /// order encodes paint precedence. A node with no matching child is the
    /// result when it is focusable, or when `stop_at_foreign_content` is set and
    /// it hosts foreign content. Hidden children are skipped; a child whose
    /// hit-test transform cannot be inverted is never hit.
    pub fn hit_test(&self, point: Point, stop_at_foreign_content: bool) -> Option<NodeId> {
        let root = self.root()?;
        let mut visited = HashSet::new();
        self.hit_test_node(
            root,
            [point.x, point.y, 0.0, 1.0],
            stop_at_foreign_content,
            &mut visited,
        )
    }

    fn hit_test_node(
        &self,
        node: &SemanticsNode,
        point: [f64; 4],
        stop_at_foreign_content: bool,
        visited: &mut HashSet<NodeId>,
    ) -> Option<NodeId> {
        if !visited.insert(node.id()) {
            return None;
        }
        let p = homogeneous_to_point(point)?;
        let r = node.data.rect;
        // Half-open bounds; NaN coordinates fall outside.
        if !(p.x >= r.x0 && p.x < r.x1 && p.y >= r.y0 && p.y < r.y1) {
            return None;
        }
        for child_id in &node.data.children_in_hit_test_order {
            let Some(child) = self.nodes.get(child_id) else {
                continue;
            };
            if child.has_flag(SemanticsFlags::IS_HIDDEN) {
                continue;
            }
            let local = child.geometry.inverse_hit_test_transform.transform_vec4(point);
            if let Some(hit) = self.hit_test_node(child, local, stop_at_foreign_content, visited) {
                return Some(hit);
            }
        }
        let found_foreign = stop_at_foreign_content && node.hosts_foreign_content();
        (node.is_focusable() || found_foreign).then_some(node.id())
    }

    /// Name of a route: the label of the first node at or below `route`
    /// (depth-first, traversal order) that names a route and has a non-empty label.
    pub fn route_name(&self, route: NodeId) -> Option<&str> {
        let mut visited = HashSet::new();
        let mut stack = alloc::vec![route];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.has_flag(SemanticsFlags::NAMES_ROUTE)
                && let Some(label) = node.data.label.as_str()
                && !label.is_empty()
            {
                return Some(label);
            }
            stack.extend(node.data.children_in_traversal_order.iter().rev().copied());
        }
        None
    }

    /// Structural invariants: every live non-root node has a live parent, and
    /// every child reference names a live node.
    pub fn check_invariants(&self) -> bool {
        self.nodes.values().all(|node| {
            let parent_ok = node.id().is_root()
                || node.parent.is_some_and(|p| self.nodes.contains_key(&p));
            let children_ok = node
                .data
                .children_in_traversal_order
                .iter()
                .chain(node.data.children_in_hit_test_order.iter())
                .all(|c| self.nodes.contains_key(c));
            parent_ok && children_ok
        })
    }
}
