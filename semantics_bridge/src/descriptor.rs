// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-facing descriptions of cached nodes.

use alloc::string::String;
use alloc::vec::Vec;
use kurbo::{Rect, Vec2};
use smallvec::SmallVec;

use semantics_focus::FocusHoverTracker;
use semantics_tree::{
    AttributedString, NodeId, SemanticsActions, SemanticsFlags, SemanticsNode, SemanticsTree,
    StringAttribute,
};

use crate::actions::{Granularity, HostAction};
use crate::config::BridgeConfig;

/// What kind of widget a node presents as.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// Nothing more specific.
    #[default]
    Generic,
    /// A button or link.
    Button,
    /// An editable text field.
    EditText,
    /// An image.
    Image,
    /// A checkbox.
    CheckBox,
    /// A radio button.
    RadioButton,
    /// An on/off switch.
    Switch,
    /// A slider or other range widget.
    SeekBar,
    /// A vertically scrolling container.
    ScrollView,
    /// A horizontally scrolling container.
    HorizontalScrollView,
}

/// How eagerly changes to a node should be announced.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LiveRegion {
    /// Not announced.
    #[default]
    Off,
    /// Announced when the host is idle.
    Polite,
}

bitflags::bitflags! {
    /// Boolean states a host shows for a node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeStates: u32 {
        /// Interactive.
        const ENABLED = 1 << 0;
        /// Has a checked state.
        const CHECKABLE = 1 << 1;
        /// Checked or toggled on.
        const CHECKED = 1 << 2;
        /// Selected.
        const SELECTED = 1 << 3;
        /// Can take focus.
        const FOCUSABLE = 1 << 4;
        /// Holds input focus.
        const FOCUSED = 1 << 5;
        /// Holds accessibility focus.
        const ACCESSIBILITY_FOCUSED = 1 << 6;
        /// Editable text.
        const EDITABLE = 1 << 7;
        /// Obscured text.
        const PASSWORD = 1 << 8;
        /// A heading.
        const HEADING = 1 << 9;
        /// Scrolls.
        const SCROLLABLE = 1 << 10;
        /// Responds to a click.
        const CLICKABLE = 1 << 11;
        /// Responds to a long click.
        const LONG_CLICKABLE = 1 << 12;
        /// Can be dismissed.
        const DISMISSABLE = 1 << 13;
        /// On screen.
        const VISIBLE = 1 << 14;
        /// Multi-line text.
        const MULTILINE = 1 << 15;
    }
}

/// A host action a node offers, with an optional user-facing label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferedAction {
    /// The action.
    pub action: HostAction,
    /// Label replacing the host's default description.
    pub label: Option<String>,
}

impl OfferedAction {
    fn plain(action: HostAction) -> Self {
        Self {
            action,
            label: None,
        }
    }
}

/// Everything a host accessibility service needs to present one node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeDescriptor {
    /// Virtual id of the node.
    pub virtual_id: u32,
    /// Virtual id of the parent; `None` for the root.
    pub parent: Option<u32>,
    /// Node read immediately before this one.
    pub traversal_after: Option<u32>,
    /// Bounds in the root's coordinate space.
    pub bounds: Rect,
    /// Bounds relative to the parent's bounds.
    pub bounds_in_parent: Rect,
    /// Widget kind.
    pub role: Role,
    /// Text to present, with its attribute runs.
    pub text: Option<AttributedString>,
    /// Hint for editable text.
    pub hint_text: Option<String>,
    /// Tooltip.
    pub tooltip: Option<String>,
    /// Stable identifier for automation.
    pub identifier: Option<String>,
    /// Link target.
    pub link_url: Option<String>,
    /// Locale of the text.
    pub locale: Option<String>,
    /// Boolean states.
    pub states: NodeStates,
    /// Live-region politeness.
    pub live_region: LiveRegion,
    /// Text selection as `(base, extent)`.
    pub text_selection: Option<(i32, i32)>,
    /// Maximum number of characters the field accepts.
    pub max_text_length: Option<i32>,
    /// Cursor movement units supported.
    pub granularities: SmallVec<[Granularity; 2]>,
    /// Actions the host may offer.
    pub actions: Vec<OfferedAction>,
    /// Non-hidden children in reading order, by virtual id.
    pub children: Vec<u32>,
}

/// Join non-empty strings with `", "`, shifting each string's attributes along.
fn join_attributed<'a>(
    parts: impl IntoIterator<Item = &'a AttributedString>,
) -> Option<AttributedString> {
    let mut out = AttributedString::default();
    let mut offset = 0_i32;
    for part in parts {
        let Some(text) = part.as_str().filter(|t| !t.is_empty()) else {
            continue;
        };
        let joined = out.text.get_or_insert_with(String::new);
        if !joined.is_empty() {
            joined.push_str(", ");
            offset = offset.saturating_add(2);
        }
        joined.push_str(text);
        // Runs that cannot be shifted without overflowing are dropped.
        out.attributes.extend(part.attributes.iter().filter_map(|a| {
            Some(StringAttribute {
                start: a.start.checked_add(offset)?,
                end: a.end.checked_add(offset)?,
                kind: a.kind.clone(),
            })
        }));
        offset = offset.saturating_add(i32::try_from(text.chars().count()).unwrap_or(i32::MAX));
    }
    out.text.is_some().then_some(out)
}

fn plain_join<'a>(parts: impl IntoIterator<Item = &'a AttributedString>) -> Option<String> {
    join_attributed(parts).and_then(|s| s.text)
}

/// Build the descriptor of a native node.
pub(crate) fn describe(
    tree: &SemanticsTree,
    node: &SemanticsNode,
    focus: &FocusHoverTracker<NodeId>,
    config: &BridgeConfig,
    default_locale: Option<String>,
) -> NodeDescriptor {
    let data = node.data();
    let id = node.id();
    let has = |f| node.has_flag(f);
    let can = |a| node.has_action(a);

    let mut d = NodeDescriptor {
        virtual_id: id.get(),
        parent: node.parent().map(NodeId::get),
        traversal_after: node.previous_sibling().map(NodeId::get),
        identifier: data.identifier.clone(),
        tooltip: data.tooltip.clone(),
        link_url: data.link_url.clone(),
        locale: data.locale.clone().or(default_locale),
        ..NodeDescriptor::default()
    };

    d.bounds = node.global_rect().unwrap_or(Rect::ZERO);
    d.bounds_in_parent = node
        .parent()
        .and_then(|p| tree.global_rect(p))
        .map_or(d.bounds, |pb| d.bounds - Vec2::new(pb.x0, pb.y0));

    let mut states = NodeStates::VISIBLE;
    states.set(NodeStates::FOCUSABLE, node.is_focusable());
    states.set(
        NodeStates::ENABLED,
        !has(SemanticsFlags::HAS_ENABLED_STATE) || has(SemanticsFlags::IS_ENABLED),
    );
    states.set(NodeStates::FOCUSED, focus.input_focus() == Some(id));
    let accessibility_focused = focus.is_accessibility_focused(id);
    states.set(NodeStates::ACCESSIBILITY_FOCUSED, accessibility_focused);
    states.set(NodeStates::SELECTED, has(SemanticsFlags::IS_SELECTED));
    states.set(NodeStates::HEADING, has(SemanticsFlags::IS_HEADER));
    states.set(NodeStates::MULTILINE, has(SemanticsFlags::IS_MULTILINE));

    if has(SemanticsFlags::IS_TEXT_FIELD) {
        let read_only = has(SemanticsFlags::IS_READ_ONLY);
        states.set(NodeStates::PASSWORD, has(SemanticsFlags::IS_OBSCURED));
        states.set(NodeStates::EDITABLE, !read_only);
        if !read_only {
            d.role = Role::EditText;
        }
        if data.text_selection_base != -1 && data.text_selection_extent != -1 {
            d.text_selection = Some((data.text_selection_base, data.text_selection_extent));
        }
        if accessibility_focused {
            d.live_region = LiveRegion::Polite;
        }
        if data.max_value_length >= 0 {
            let length = data
                .value
                .as_str()
                .map_or(0, |v| i32::try_from(v.chars().count()).unwrap_or(i32::MAX));
            d.max_text_length = Some(
                length
                    .saturating_sub(data.current_value_length)
                    .saturating_add(data.max_value_length),
            );
        }
        d.text = Some(data.value.clone());
        d.hint_text = plain_join([&data.label, &data.hint]);
    } else if !has(SemanticsFlags::SCOPES_ROUTE) {
        d.text = join_attributed([&data.value, &data.label, &data.hint]);
    }

    let mut actions = Vec::new();
    let mut overrides = (None, None);
    let mut custom = Vec::new();
    for action in data.custom_actions.iter().filter_map(|&a| tree.custom_action(a)) {
        match action.overrides() {
            Some(SemanticsActions::TAP) => overrides.0 = Some(action),
            Some(SemanticsActions::LONG_PRESS) => overrides.1 = Some(action),
            _ => custom.push(action),
        }
    }
    if can(SemanticsActions::TAP) {
        states |= NodeStates::CLICKABLE;
        actions.push(OfferedAction {
            action: HostAction::Click,
            label: overrides.0.and_then(|a| a.hint.clone()),
        });
    }
    if can(SemanticsActions::LONG_PRESS) {
        states |= NodeStates::LONG_CLICKABLE;
        actions.push(OfferedAction {
            action: HostAction::LongClick,
            label: overrides.1.and_then(|a| a.hint.clone()),
        });
    }

    if data.actions.intersects(SemanticsActions::SCROLLING) {
        states |= NodeStates::SCROLLABLE;
        if has(SemanticsFlags::HAS_IMPLICIT_SCROLLING) {
            d.role = if data
                .actions
                .intersects(SemanticsActions::SCROLL_LEFT | SemanticsActions::SCROLL_RIGHT)
            {
                Role::HorizontalScrollView
            } else {
                Role::ScrollView
            };
        }
        if data
            .actions
            .intersects(SemanticsActions::SCROLL_LEFT | SemanticsActions::SCROLL_UP)
        {
            actions.push(OfferedAction::plain(HostAction::ScrollForward));
        }
        if data
            .actions
            .intersects(SemanticsActions::SCROLL_RIGHT | SemanticsActions::SCROLL_DOWN)
        {
            actions.push(OfferedAction::plain(HostAction::ScrollBackward));
        }
    }
    if data
        .actions
        .intersects(SemanticsActions::INCREASE | SemanticsActions::DECREASE)
    {
        d.role = Role::SeekBar;
        if can(SemanticsActions::INCREASE) {
            actions.push(OfferedAction::plain(HostAction::ScrollForward));
        }
        if can(SemanticsActions::DECREASE) {
            actions.push(OfferedAction::plain(HostAction::ScrollBackward));
        }
    }

    let by_character = SemanticsActions::MOVE_CURSOR_FORWARD_BY_CHARACTER
        | SemanticsActions::MOVE_CURSOR_BACKWARD_BY_CHARACTER;
    let by_word =
        SemanticsActions::MOVE_CURSOR_FORWARD_BY_WORD | SemanticsActions::MOVE_CURSOR_BACKWARD_BY_WORD;
    if data.actions.intersects(by_character) {
        d.granularities.push(Granularity::Character);
    }
    if data.actions.intersects(by_word) {
        d.granularities.push(Granularity::Word);
    }
    let forward = SemanticsActions::MOVE_CURSOR_FORWARD_BY_CHARACTER
        | SemanticsActions::MOVE_CURSOR_FORWARD_BY_WORD;
    let backward = SemanticsActions::MOVE_CURSOR_BACKWARD_BY_CHARACTER
        | SemanticsActions::MOVE_CURSOR_BACKWARD_BY_WORD;
    if data.actions.intersects(forward) {
        actions.push(OfferedAction::plain(HostAction::NextAtMovementGranularity));
    }
    if data.actions.intersects(backward) {
        actions.push(OfferedAction::plain(HostAction::PreviousAtMovementGranularity));
    }

    for (bit, action) in [
        (SemanticsActions::SET_SELECTION, HostAction::SetSelection),
        (SemanticsActions::COPY, HostAction::Copy),
        (SemanticsActions::CUT, HostAction::Cut),
        (SemanticsActions::PASTE, HostAction::Paste),
        (SemanticsActions::SET_TEXT, HostAction::SetText),
        (SemanticsActions::SHOW_ON_SCREEN, HostAction::ShowOnScreen),
        (SemanticsActions::FOCUS, HostAction::Focus),
    ] {
        if can(bit) {
            actions.push(OfferedAction::plain(action));
        }
    }
    if can(SemanticsActions::DISMISS) {
        states |= NodeStates::DISMISSABLE;
        actions.push(OfferedAction::plain(HostAction::Dismiss));
    }

    if has(SemanticsFlags::IS_BUTTON) || has(SemanticsFlags::IS_LINK) {
        d.role = Role::Button;
    }
    if has(SemanticsFlags::IS_IMAGE) {
        d.role = Role::Image;
    }
    if has(SemanticsFlags::HAS_CHECKED_STATE) {
        states |= NodeStates::CHECKABLE;
        states.set(NodeStates::CHECKED, has(SemanticsFlags::IS_CHECKED));
        d.role = if has(SemanticsFlags::IS_IN_MUTUALLY_EXCLUSIVE_GROUP) {
            Role::RadioButton
        } else {
            Role::CheckBox
        };
    } else if has(SemanticsFlags::HAS_TOGGLED_STATE) {
        states |= NodeStates::CHECKABLE;
        states.set(NodeStates::CHECKED, has(SemanticsFlags::IS_TOGGLED));
        d.role = Role::Switch;
    }
    if has(SemanticsFlags::IS_LIVE_REGION) {
        d.live_region = LiveRegion::Polite;
    }

    for action in custom {
        let host_id = u32::try_from(action.id)
            .ok()
            .and_then(|id| id.checked_add(config.custom_action_offset));
        if let Some(host_id) = host_id {
            actions.push(OfferedAction {
                action: HostAction::Custom(host_id),
                label: action.label.clone(),
            });
        }
    }

    actions.push(OfferedAction::plain(if accessibility_focused {
        HostAction::ClearAccessibilityFocus
    } else {
        HostAction::AccessibilityFocus
    }));

    d.children = data
        .children_in_traversal_order
        .iter()
        .filter(|&&c| {
            tree.get(c)
                .is_some_and(|c| !c.has_flag(SemanticsFlags::IS_HIDDEN))
        })
        .map(|c| c.get())
        .collect();

    d.states = states;
    d.actions = actions;
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use semantics_tree::{CustomAction, NodeData, NodeRecord, StringAttributeKind};

    fn describe_root(
        data: NodeData,
        extra: Vec<NodeRecord>,
        actions: Vec<CustomAction>,
    ) -> NodeDescriptor {
        let mut tree = SemanticsTree::new();
        tree.apply_custom_actions(actions);
        let mut records = extra;
        records.push(NodeRecord {
            id: NodeId::ROOT,
            data,
        });
        tree.apply(records);
        tree.commit(|_| {});
        let focus = FocusHoverTracker::new();
        describe(
            &tree,
            tree.root().expect("root exists"),
            &focus,
            &BridgeConfig::default(),
            Some("en-US".into()),
        )
    }

    #[test]
    fn value_label_and_hint_are_joined_with_shifted_attributes() {
        let data = NodeData {
            value: AttributedString::plain("42"),
            label: AttributedString {
                text: Some("Count".into()),
                attributes: vec![StringAttribute {
                    start: 0,
                    end: 5,
                    kind: StringAttributeKind::SpellOut,
                }],
            },
            hint: AttributedString::plain(""),
            ..NodeData::default()
        };
        let d = describe_root(data, vec![], vec![]);
        let text = d.text.expect("has text");
        assert_eq!(text.as_str(), Some("42, Count"));
        assert_eq!(text.attributes[0].start, 4);
        assert_eq!(text.attributes[0].end, 9);
        assert_eq!(d.locale.as_deref(), Some("en-US"), "falls back to the default locale");
    }

    #[test]
    fn text_field_reports_editing_state() {
        let data = NodeData {
            flags: SemanticsFlags::IS_TEXT_FIELD | SemanticsFlags::IS_OBSCURED,
            value: AttributedString::plain("abc"),
            label: AttributedString::plain("Password"),
            text_selection_base: 1,
            text_selection_extent: 3,
            max_value_length: 10,
            current_value_length: 3,
            ..NodeData::default()
        };
        let d = describe_root(data, vec![], vec![]);
        assert_eq!(d.role, Role::EditText);
        assert!(d.states.contains(NodeStates::EDITABLE | NodeStates::PASSWORD));
        assert_eq!(d.text_selection, Some((1, 3)));
        assert_eq!(d.max_text_length, Some(10));
        assert_eq!(d.hint_text.as_deref(), Some("Password"));
    }

    #[test]
    fn extreme_lengths_saturate() {
        let data = NodeData {
            flags: SemanticsFlags::IS_TEXT_FIELD,
            value: AttributedString::plain("a"),
            max_value_length: i32::MAX,
            ..NodeData::default()
        };
        let d = describe_root(data, vec![], vec![]);
        assert_eq!(d.max_text_length, Some(i32::MAX));
    }

    #[test]
    fn unshiftable_attribute_runs_are_dropped() {
        let run = |start, end| StringAttribute {
            start,
            end,
            kind: StringAttributeKind::SpellOut,
        };
        let data = NodeData {
            value: AttributedString::plain("42"),
            label: AttributedString {
                text: Some("Count".into()),
                attributes: vec![run(i32::MAX - 1, i32::MAX), run(0, 5)],
            },
            ..NodeData::default()
        };
        let d = describe_root(data, vec![], vec![]);
        let text = d.text.expect("has text");
        assert_eq!(text.as_str(), Some("42, Count"));
        assert_eq!(text.attributes, vec![run(4, 9)]);
    }

    #[test]
    fn tap_override_relabels_click_and_custom_actions_use_host_ids() {
        let mut data = NodeData {
            actions: SemanticsActions::TAP | SemanticsActions::CUSTOM_ACTION,
            ..NodeData::default()
        };
        data.custom_actions.extend([1, 2]);
        let actions = vec![
            CustomAction {
                id: 1,
                override_id: 1,
                label: None,
                hint: Some("open the message".into()),
            },
            CustomAction {
                id: 2,
                override_id: -1,
                label: Some("Archive".into()),
                hint: None,
            },
        ];
        let d = describe_root(data, vec![], actions);
        assert_eq!(
            d.actions[0],
            OfferedAction {
                action: HostAction::Click,
                label: Some("open the message".into())
            }
        );
        assert!(d.actions.contains(&OfferedAction {
            action: HostAction::Custom(267_386_883),
            label: Some("Archive".into()),
        }));
        assert_eq!(
            d.actions.last().map(|a| a.action),
            Some(HostAction::AccessibilityFocus)
        );
    }

    #[test]
    fn hidden_children_are_not_listed() {
        let mut data = NodeData::default();
        data.children_in_traversal_order.extend([NodeId(1), NodeId(2)]);
        let hidden = NodeData {
            flags: SemanticsFlags::IS_HIDDEN,
            ..NodeData::default()
        };
        let d = describe_root(
            data,
            vec![
                NodeRecord {
                    id: NodeId(1),
                    data: hidden,
                },
                NodeRecord {
                    id: NodeId(2),
                    data: NodeData::default(),
                },
            ],
            vec![],
        );
        assert_eq!(d.children, vec![2]);
        assert_eq!(d.parent, None);
    }

    #[test]
    fn toggles_and_radio_buttons() {
        let d = describe_root(
            NodeData {
                flags: SemanticsFlags::HAS_TOGGLED_STATE | SemanticsFlags::IS_TOGGLED,
                ..NodeData::default()
            },
            vec![],
            vec![],
        );
        assert_eq!(d.role, Role::Switch);
        assert!(d.states.contains(NodeStates::CHECKABLE | NodeStates::CHECKED));

        let d = describe_root(
            NodeData {
                flags: SemanticsFlags::HAS_CHECKED_STATE
                    | SemanticsFlags::IS_IN_MUTUALLY_EXCLUSIVE_GROUP,
                ..NodeData::default()
            },
            vec![],
            vec![],
        );
        assert_eq!(d.role, Role::RadioButton);
        assert!(!d.states.contains(NodeStates::CHECKED));
    }
}
