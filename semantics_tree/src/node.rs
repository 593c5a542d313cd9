// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached semantics nodes: decoded data, previous-state snapshots, and resolved geometry.

use alloc::string::String;
use kurbo::Rect;
use smallvec::SmallVec;

use crate::matrix::Matrix4;
use crate::types::{AttributedString, NodeId, SemanticsActions, SemanticsFlags, TextDirection};

/// Child list storage; most semantics nodes have only a handful of children.
pub type ChildList = SmallVec<[NodeId; 4]>;

/// Everything the engine sends for one node, in decoded form.
///
/// Field order follows the wire order of a node record.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeData {
    /// Boolean properties.
    pub flags: SemanticsFlags,
    /// Supported operations.
    pub actions: SemanticsActions,
    /// Maximum length of the value, or `-1` when unbounded.
    pub max_value_length: i32,
    /// Current length of the value as counted by the engine.
    pub current_value_length: i32,
    /// Selection anchor, or `-1`.
    pub text_selection_base: i32,
    /// Selection focus, or `-1`.
    pub text_selection_extent: i32,
    /// Foreign content hosted by this node, or `-1`.
    pub platform_view_id: i32,
    /// Number of children of a scrollable, including offscreen ones.
    pub scroll_child_count: i32,
    /// Index of the first visible child of a scrollable.
    pub scroll_index: i32,
    /// Identifier of the enclosing scrollable, or `-1`.
    pub scroll_parent: i32,
    /// Scroll offset and extents.
    pub scroll: ScrollMetrics,
    /// Stable identifier for automation.
    pub identifier: Option<String>,
    /// Label.
    pub label: AttributedString,
    /// Value.
    pub value: AttributedString,
    /// Value after an increase action.
    pub increased_value: AttributedString,
    /// Value after a decrease action.
    pub decreased_value: AttributedString,
    /// Hint.
    pub hint: AttributedString,
    /// Tooltip.
    pub tooltip: Option<String>,
    /// Target of a link.
    pub link_url: Option<String>,
    /// Locale of the node's text.
    pub locale: Option<String>,
    /// Heading level, `0` for none.
    pub heading_level: i32,
    /// Reading direction.
    pub text_direction: TextDirection,
    /// Bounds in the node's local space.
    pub rect: Rect,
    /// Local-to-parent transform used for painting and global geometry.
    pub transform: Matrix4,
    /// Local-to-parent transform used for hit testing.
    pub hit_test_transform: Matrix4,
    /// Children in reading/focus order.
    pub children_in_traversal_order: ChildList,
    /// Children in hit-test order, front-most first.
    pub children_in_hit_test_order: ChildList,
    /// Custom action identifiers.
    pub custom_actions: SmallVec<[i32; 2]>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            flags: SemanticsFlags::empty(),
            actions: SemanticsActions::empty(),
            max_value_length: -1,
            current_value_length: -1,
            text_selection_base: -1,
            text_selection_extent: -1,
            platform_view_id: -1,
            scroll_child_count: 0,
            scroll_index: 0,
            scroll_parent: -1,
            scroll: ScrollMetrics::default(),
            identifier: None,
            label: AttributedString::default(),
            value: AttributedString::default(),
            increased_value: AttributedString::default(),
            decreased_value: AttributedString::default(),
            hint: AttributedString::default(),
            tooltip: None,
            link_url: None,
            locale: None,
            heading_level: 0,
            text_direction: TextDirection::Unknown,
            rect: Rect::ZERO,
            transform: Matrix4::IDENTITY,
            hit_test_transform: Matrix4::IDENTITY,
            children_in_traversal_order: ChildList::new(),
            children_in_hit_test_order: ChildList::new(),
            custom_actions: SmallVec::new(),
        }
    }
}

/// Scroll offset and extents of a scrollable node.
///
/// Non-scrollable nodes carry NaN in every field. Equality is bitwise so that
/// an unchanged NaN compares equal to itself.
#[derive(Copy, Clone, Debug)]
pub struct ScrollMetrics {
    /// Scroll offset.
    pub position: f32,
    /// Maximum scroll offset; may be infinite.
    pub extent_max: f32,
    /// Minimum scroll offset; may be infinite.
    pub extent_min: f32,
}

impl Default for ScrollMetrics {
    fn default() -> Self {
        Self {
            position: f32::NAN,
            extent_max: f32::NAN,
            extent_min: f32::NAN,
        }
    }
}

impl PartialEq for ScrollMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.position.to_bits() == other.position.to_bits()
            && self.extent_max.to_bits() == other.extent_max.to_bits()
            && self.extent_min.to_bits() == other.extent_min.to_bits()
    }
}

/// The subset of node state that change synthesis compares across updates.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSnapshot {
    /// Flags.
    pub flags: SemanticsFlags,
    /// Actions.
    pub actions: SemanticsActions,
    /// Label text.
    pub label: Option<String>,
    /// Value text.
    pub value: Option<String>,
    /// Selection anchor.
    pub text_selection_base: i32,
    /// Selection focus.
    pub text_selection_extent: i32,
    /// Scroll offset and extents.
    pub scroll: ScrollMetrics,
}

impl NodeSnapshot {
    /// Capture the comparable state of `data`.
    pub fn of(data: &NodeData) -> Self {
        Self {
            flags: data.flags,
            actions: data.actions,
            label: data.label.text.clone(),
            value: data.value.text.clone(),
            text_selection_base: data.text_selection_base,
            text_selection_extent: data.text_selection_extent,
            scroll: data.scroll,
        }
    }
}

/// Geometry resolved by the traversal pass.
#[derive(Clone, Debug)]
pub(crate) struct Geometry {
    pub(crate) global_transform: Matrix4,
    pub(crate) global_rect: Option<Rect>,
    pub(crate) inverse_hit_test_transform: Matrix4,
    pub(crate) dirty: bool,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            global_transform: Matrix4::IDENTITY,
            global_rect: None,
            inverse_hit_test_transform: Matrix4::IDENTITY,
            dirty: true,
        }
    }
}

/// A cached semantics node.
///
/// The node carries its current data and, once it has been decoded at least
/// twice, a snapshot of the state it had before the most recent update.
#[derive(Clone, Debug)]
pub struct SemanticsNode {
    id: NodeId,
    pub(crate) data: NodeData,
    pub(crate) previous: Option<NodeSnapshot>,
    pub(crate) decoded: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) previous_sibling: Option<NodeId>,
    pub(crate) geometry: Geometry,
}

impl SemanticsNode {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            data: NodeData::default(),
            previous: None,
            decoded: false,
            parent: None,
            previous_sibling: None,
            geometry: Geometry::default(),
        }
    }

    /// Overwrite with freshly decoded data, snapshotting the prior state first.
    ///
    /// Returns true if anything differs from what was cached.
    pub(crate) fn update_with(&mut self, data: NodeData) -> bool {
        let changed = !self.decoded || self.data != data;
        if self.decoded {
            self.previous = Some(NodeSnapshot::of(&self.data));
        }
        self.decoded = true;
        self.data = data;
        self.geometry.dirty = true;
        changed
    }

    /// The node's identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current decoded data.
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Mutable access for local predictions (selection, value) made ahead of the engine.
    pub fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    /// State before the most recent update, if the node has been updated more than once.
    pub fn previous(&self) -> Option<&NodeSnapshot> {
        self.previous.as_ref()
    }

    /// Current comparable state paired with the previous one.
    pub fn states(&self) -> (NodeSnapshot, Option<&NodeSnapshot>) {
        (NodeSnapshot::of(&self.data), self.previous.as_ref())
    }

    /// Returns true once the node has been decoded at least twice.
    pub fn had_previous_config(&self) -> bool {
        self.previous.is_some()
    }

    /// Parent in the traversal order, as of the last traversal.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The sibling read immediately before this node, as of the last traversal.
    pub fn previous_sibling(&self) -> Option<NodeId> {
        self.previous_sibling
    }

    /// Global bounds, available once a traversal has resolved them.
    pub fn global_rect(&self) -> Option<Rect> {
        if self.geometry.dirty {
            return None;
        }
        self.geometry.global_rect
    }

    /// Local-to-root transform as of the last traversal.
    pub fn global_transform(&self) -> Matrix4 {
        self.geometry.global_transform
    }

    /// Returns true if all of `flags` are set.
    pub fn has_flag(&self, flags: SemanticsFlags) -> bool {
        self.data.flags.contains(flags)
    }

    /// Returns true if all of `flags` were set before the last update.
    pub fn had_flag(&self, flags: SemanticsFlags) -> bool {
        self.previous.as_ref().is_some_and(|p| p.flags.contains(flags))
    }

    /// Returns true if all of `actions` are supported.
    pub fn has_action(&self, actions: SemanticsActions) -> bool {
        self.data.actions.contains(actions)
    }

    /// Returns true if all of `actions` were supported before the last update.
    pub fn had_action(&self, actions: SemanticsActions) -> bool {
        self.previous
            .as_ref()
            .is_some_and(|p| p.actions.contains(actions))
    }

    /// Returns true if the node hosts foreign content.
    pub fn hosts_foreign_content(&self) -> bool {
        self.data.platform_view_id != -1
    }

    /// Whether the host should treat this node as a focus stop.
    ///
    /// Route scopes never are. Explicit focusable/focus-blocked flags decide next;
    /// otherwise any non-scroll action, any interactive flag, or non-empty label,
    /// value, or hint makes the node focusable.
    pub fn is_focusable(&self) -> bool {
        let d = &self.data;
        if d.flags.contains(SemanticsFlags::SCOPES_ROUTE) {
            return false;
        }
        if d.flags.contains(SemanticsFlags::IS_FOCUSABLE) {
            return true;
        }
        if d.flags.contains(SemanticsFlags::IS_FOCUS_BLOCKED) {
            return false;
        }
        !d.actions.difference(SemanticsActions::SCROLLING).is_empty()
            || d.flags.intersects(SemanticsFlags::INTERACTIVE)
            || !d.label.is_empty()
            || !d.value.is_empty()
            || !d.hint.is_empty()
    }

    /// Returns true if the scroll position changed in the last update.
    pub fn did_scroll(&self) -> bool {
        let Some(prev) = &self.previous else {
            return false;
        };
        let now = self.data.scroll.position;
        let before = prev.scroll.position;
        !now.is_nan() && !before.is_nan() && before != now
    }

    /// Returns true if the label changed in the last update.
    pub fn did_change_label(&self) -> bool {
        let Some(prev) = &self.previous else {
            return false;
        };
        prev.label != self.data.label.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(f: impl FnOnce(&mut NodeData)) -> SemanticsNode {
        let mut node = SemanticsNode::new(NodeId(1));
        let mut data = NodeData::default();
        f(&mut data);
        node.update_with(data);
        node
    }

    #[test]
    fn scopes_route_is_never_focusable() {
        let n = node_with(|d| {
            d.flags = SemanticsFlags::SCOPES_ROUTE | SemanticsFlags::IS_FOCUSABLE;
            d.label = AttributedString::plain("Settings");
        });
        assert!(!n.is_focusable());
    }

    #[test]
    fn focus_blocked_overrides_heuristic() {
        let n = node_with(|d| {
            d.flags = SemanticsFlags::IS_FOCUS_BLOCKED;
            d.actions = SemanticsActions::TAP;
        });
        assert!(!n.is_focusable());
    }

    #[test]
    fn scroll_only_actions_are_not_focusable() {
        let n = node_with(|d| d.actions = SemanticsActions::SCROLL_UP);
        assert!(!n.is_focusable());
        let n = node_with(|d| d.actions = SemanticsActions::SCROLL_UP | SemanticsActions::TAP);
        assert!(n.is_focusable());
    }

    #[test]
    fn text_makes_node_focusable() {
        let n = node_with(|d| d.hint = AttributedString::plain("Search"));
        assert!(n.is_focusable());
        let n = node_with(|d| d.label = AttributedString::plain(""));
        assert!(!n.is_focusable(), "empty label is not content");
    }

    #[test]
    fn snapshot_taken_before_overwrite() {
        let mut n = node_with(|d| d.label = AttributedString::plain("old"));
        assert!(!n.had_previous_config());
        let mut data = n.data().clone();
        data.label = AttributedString::plain("new");
        assert!(n.update_with(data));
        assert_eq!(n.previous().unwrap().label.as_deref(), Some("old"));
        assert!(n.did_change_label());
    }

    #[test]
    fn identical_update_reports_unchanged() {
        let mut n = node_with(|d| d.scroll.position = 10.0);
        let same = n.data().clone();
        assert!(!n.update_with(same));
        let (current, previous) = n.states();
        assert_eq!(Some(&current), previous);
        assert!(!n.did_scroll());
    }
}
