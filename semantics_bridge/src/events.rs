// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Notifications sent to the host accessibility service.

use alloc::string::String;
use alloc::vec::Vec;

/// Who a notification is about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// The host view itself, not any node inside it.
    HostView,
    /// A node, by virtual id.
    Node(u32),
}

/// What kind of content changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContentChange {
    /// The structure or state of a subtree changed.
    Subtree,
    /// Only the text of a node changed.
    Text,
}

/// Direction a scrollable moves in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollAxis {
    /// Up/down.
    Vertical,
    /// Left/right.
    Horizontal,
}

/// Which children of a scrollable are on screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScrollItems {
    /// All children, including offscreen ones.
    pub item_count: i32,
    /// First visible child.
    pub from_index: i32,
    /// Last visible child.
    pub to_index: i32,
}

/// Payload of a notification.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    /// The pointer entered the target.
    HoverEnter,
    /// The pointer left the target.
    HoverExit,
    /// The target gained accessibility focus.
    AccessibilityFocused,
    /// The target lost accessibility focus.
    AccessibilityFocusCleared,
    /// The target gained input focus.
    InputFocused,
    /// The target was tapped.
    Clicked,
    /// The target was long-pressed.
    LongClicked,
    /// The target became selected, or its value moved.
    Selected {
        /// Text to announce.
        text: Option<String>,
    },
    /// The selection of an editable target changed.
    TextSelectionChanged {
        /// Current text.
        text: String,
        /// Selection anchor.
        from_index: i32,
        /// Selection focus.
        to_index: i32,
        /// Length of `text` in characters.
        item_count: usize,
    },
    /// The text of an editable target changed.
    TextChanged {
        /// Text before the edit.
        before: String,
        /// Text after the edit.
        text: String,
        /// First changed character.
        from_index: usize,
        /// Characters inserted at `from_index`.
        added_count: usize,
        /// Characters removed at `from_index`.
        removed_count: usize,
    },
    /// A scrollable moved.
    Scrolled {
        /// Axis, when the target declares one through its scroll actions.
        axis: Option<ScrollAxis>,
        /// Position, normalized to start at zero.
        position: f32,
        /// Largest position, normalized the same way.
        max: f32,
        /// Visible children, when the target reports a child count.
        items: Option<ScrollItems>,
    },
    /// A new route or window-level state is showing.
    WindowStateChanged {
        /// Title to announce.
        title: String,
    },
    /// Content below the target changed.
    WindowContentChanged {
        /// What changed.
        change: ContentChange,
    },
    /// A message the host should speak.
    Announcement {
        /// The message.
        message: String,
    },
}

/// A notification for the host.
#[derive(Clone, Debug, PartialEq)]
pub struct SemanticsEvent {
    /// Who it is about.
    pub target: EventTarget,
    /// What happened.
    pub kind: EventKind,
}

impl SemanticsEvent {
    /// A notification about the node with the given virtual id.
    pub fn node(id: u32, kind: EventKind) -> Self {
        Self {
            target: EventTarget::Node(id),
            kind,
        }
    }

    /// A notification about the host view.
    pub fn host_view(kind: EventKind) -> Self {
        Self {
            target: EventTarget::HostView,
            kind,
        }
    }
}

/// Ordered channel of notifications to the host.
pub trait EventSink {
    /// Deliver one notification.
    fn send(&mut self, event: SemanticsEvent);
}

impl EventSink for Vec<SemanticsEvent> {
    fn send(&mut self, event: SemanticsEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn send(&mut self, event: SemanticsEvent) {
        (**self).send(event);
    }
}
