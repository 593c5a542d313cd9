// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the semantics tree: node identifiers, flags, actions, and text.

use alloc::string::String;
use alloc::vec::Vec;

/// Identifier of a semantics node, assigned by the engine.
///
/// Identifiers are unique within the live tree. The root is always [`NodeId::ROOT`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node.
    pub const ROOT: Self = Self(0);

    /// Returns the raw identifier.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns true if this is the root identifier.
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags::bitflags! {
    /// Boolean properties of a semantics node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SemanticsFlags: u64 {
        /// The node has a checked state (checkbox, radio button).
        const HAS_CHECKED_STATE = 1 << 0;
        /// The node is checked.
        const IS_CHECKED = 1 << 1;
        /// The node is selected.
        const IS_SELECTED = 1 << 2;
        /// The node is a button.
        const IS_BUTTON = 1 << 3;
        /// The node is an editable text field.
        const IS_TEXT_FIELD = 1 << 4;
        /// The node holds input focus.
        const IS_FOCUSED = 1 << 5;
        /// The node has an enabled state.
        const HAS_ENABLED_STATE = 1 << 6;
        /// The node is enabled.
        const IS_ENABLED = 1 << 7;
        /// The node belongs to a group of mutually exclusive choices.
        const IS_IN_MUTUALLY_EXCLUSIVE_GROUP = 1 << 8;
        /// The node is a header.
        const IS_HEADER = 1 << 9;
        /// The node's value is obscured (password field).
        const IS_OBSCURED = 1 << 10;
        /// The node starts a new route (screen, dialog).
        const SCOPES_ROUTE = 1 << 11;
        /// The node's label names the enclosing route.
        const NAMES_ROUTE = 1 << 12;
        /// The node is hidden from assistive technology.
        const IS_HIDDEN = 1 << 13;
        /// The node is an image.
        const IS_IMAGE = 1 << 14;
        /// Changes to the node's content should be announced.
        const IS_LIVE_REGION = 1 << 15;
        /// The node has a toggled state (switch).
        const HAS_TOGGLED_STATE = 1 << 16;
        /// The node is toggled on.
        const IS_TOGGLED = 1 << 17;
        /// The node scrolls without explicit scroll actions.
        const HAS_IMPLICIT_SCROLLING = 1 << 18;
        /// The text field accepts multiple lines.
        const IS_MULTILINE = 1 << 19;
        /// The text field is read-only.
        const IS_READ_ONLY = 1 << 20;
        /// The node is explicitly focusable.
        const IS_FOCUSABLE = 1 << 21;
        /// The node is a link.
        const IS_LINK = 1 << 22;
        /// The node is a slider.
        const IS_SLIDER = 1 << 23;
        /// The node is a keyboard key.
        const IS_KEYBOARD_KEY = 1 << 24;
        /// The checked state is mixed.
        const IS_CHECK_STATE_MIXED = 1 << 25;
        /// The node has an expanded state.
        const HAS_EXPANDED_STATE = 1 << 26;
        /// The node is expanded.
        const IS_EXPANDED = 1 << 27;
        /// The node is explicitly excluded from focus.
        const IS_FOCUS_BLOCKED = 1 << 28;
    }
}

impl SemanticsFlags {
    /// Flags that make a node focusable under the legacy heuristic.
    pub const INTERACTIVE: Self = Self::HAS_CHECKED_STATE
        .union(Self::IS_CHECKED)
        .union(Self::IS_SELECTED)
        .union(Self::IS_TEXT_FIELD)
        .union(Self::IS_FOCUSED)
        .union(Self::HAS_ENABLED_STATE)
        .union(Self::IS_ENABLED)
        .union(Self::IS_IN_MUTUALLY_EXCLUSIVE_GROUP)
        .union(Self::HAS_TOGGLED_STATE)
        .union(Self::IS_TOGGLED)
        .union(Self::IS_FOCUSABLE)
        .union(Self::IS_SLIDER);
}

bitflags::bitflags! {
    /// Operations a semantics node supports.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SemanticsActions: u32 {
        /// Tap.
        const TAP = 1 << 0;
        /// Long press.
        const LONG_PRESS = 1 << 1;
        /// Scroll content to the left.
        const SCROLL_LEFT = 1 << 2;
        /// Scroll content to the right.
        const SCROLL_RIGHT = 1 << 3;
        /// Scroll content up.
        const SCROLL_UP = 1 << 4;
        /// Scroll content down.
        const SCROLL_DOWN = 1 << 5;
        /// Increase the value of a range widget.
        const INCREASE = 1 << 6;
        /// Decrease the value of a range widget.
        const DECREASE = 1 << 7;
        /// Bring the node on screen.
        const SHOW_ON_SCREEN = 1 << 8;
        /// Move the cursor forward by one character.
        const MOVE_CURSOR_FORWARD_BY_CHARACTER = 1 << 9;
        /// Move the cursor backward by one character.
        const MOVE_CURSOR_BACKWARD_BY_CHARACTER = 1 << 10;
        /// Set the text selection.
        const SET_SELECTION = 1 << 11;
        /// Copy the selection.
        const COPY = 1 << 12;
        /// Cut the selection.
        const CUT = 1 << 13;
        /// Paste into the node.
        const PASTE = 1 << 14;
        /// The node gained accessibility focus.
        const DID_GAIN_ACCESSIBILITY_FOCUS = 1 << 15;
        /// The node lost accessibility focus.
        const DID_LOSE_ACCESSIBILITY_FOCUS = 1 << 16;
        /// Run an app-defined custom action.
        const CUSTOM_ACTION = 1 << 17;
        /// Dismiss the node.
        const DISMISS = 1 << 18;
        /// Move the cursor forward by one word.
        const MOVE_CURSOR_FORWARD_BY_WORD = 1 << 19;
        /// Move the cursor backward by one word.
        const MOVE_CURSOR_BACKWARD_BY_WORD = 1 << 20;
        /// Replace the text of the node.
        const SET_TEXT = 1 << 21;
        /// Request input focus.
        const FOCUS = 1 << 22;
    }
}

impl SemanticsActions {
    /// The four directional scroll actions.
    pub const SCROLLING: Self = Self::SCROLL_LEFT
        .union(Self::SCROLL_RIGHT)
        .union(Self::SCROLL_UP)
        .union(Self::SCROLL_DOWN);
}

/// Reading direction of a node's text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextDirection {
    /// Unknown or unspecified.
    #[default]
    Unknown,
    /// Right to left.
    Rtl,
    /// Left to right.
    Ltr,
}

impl TextDirection {
    /// Decode the wire value; unknown values map to [`TextDirection::Unknown`].
    pub const fn from_wire(value: i32) -> Self {
        match value {
            1 => Self::Rtl,
            2 => Self::Ltr,
            _ => Self::Unknown,
        }
    }

    /// Encode to the wire value.
    pub const fn to_wire(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Rtl => 1,
            Self::Ltr => 2,
        }
    }
}

/// What a [`StringAttribute`] asks of the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StringAttributeKind {
    /// Spell the range out character by character.
    SpellOut,
    /// Pronounce the range in the given locale (a BCP 47 tag).
    Locale(String),
}

/// A tagged sub-range of a node's text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StringAttribute {
    /// Start of the range (inclusive).
    pub start: i32,
    /// End of the range (exclusive).
    pub end: i32,
    /// The attribute payload.
    pub kind: StringAttributeKind,
}

/// An optional string together with its attribute runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AttributedString {
    /// The text, or `None` when the engine sent no string.
    pub text: Option<String>,
    /// Attribute runs over `text`.
    pub attributes: Vec<StringAttribute>,
}

impl AttributedString {
    /// A plain string without attributes.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attributes: Vec::new(),
        }
    }

    /// The text, if any.
    pub fn as_str(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns true when the text is absent or empty.
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty)
    }
}

/// An app-defined action exposed through the host's action menu.
///
/// Custom actions are small value objects owned by the tree's action table and
/// referenced from nodes by [`CustomAction::id`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomAction {
    /// Engine-assigned identifier.
    pub id: i32,
    /// The built-in action bit this action relabels, or `-1`.
    pub override_id: i32,
    /// Label shown to the user.
    pub label: Option<String>,
    /// Hint describing the result of the action.
    pub hint: Option<String>,
}

impl CustomAction {
    /// The built-in action this custom action relabels, if any.
    pub fn overrides(&self) -> Option<SemanticsActions> {
        u32::try_from(self.override_id)
            .ok()
            .and_then(SemanticsActions::from_bits)
            .filter(|a| !a.is_empty())
    }
}
