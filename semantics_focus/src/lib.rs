// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Semantics Focus: accessibility focus, input focus, and hover tracking.
//!
//! A host accessibility service cares about three independent "current" nodes:
//! - the node its cursor sits on (**accessibility focus**),
//! - the node receiving keyboard input (**input focus**),
//! - the node under a hovering pointer (**hover**).
//!
//! [`FocusHoverTracker`] owns those three, plus a parallel pair of focus
//! identifiers for nodes living inside foreign embedded content. Nodes are
//! referred to by key only, so the tracker never keeps a node alive and the
//! owning cache can evict freely; eviction is reported back through
//! [`FocusHoverTracker::node_removed`].
//!
//! Every transition returns the notifications it implies, in the order a host
//! expects them, instead of invoking callbacks. State is always updated before
//! the notifications are returned, so a host that queries the tracker while
//! delivering them observes the new state.
//!
//! ## Minimal example
//!
//! ```rust
//! use semantics_focus::{FocusEvent, FocusHoverTracker, FocusKind, FocusTarget};
//!
//! let mut tracker: FocusHoverTracker<u32> = FocusHoverTracker::new();
//!
//! // Hovering from nothing onto node 3, then onto node 5.
//! assert_eq!(tracker.hover_to(Some(3)).as_slice(), &[FocusEvent::HoverEnter(3)]);
//! assert_eq!(
//!     tracker.hover_to(Some(5)).as_slice(),
//!     &[FocusEvent::HoverEnter(5), FocusEvent::HoverExit(3)]
//! );
//!
//! // Input focus lookups fall through to accessibility focus.
//! tracker.focus_accessibility(7);
//! assert_eq!(tracker.find_focus(FocusKind::Input), Some(FocusTarget::Native(7)));
//! ```
//!
//! This crate is `no_std`.

#![no_std]

use smallvec::SmallVec;

/// Which focus a host is asking about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FocusKind {
    /// Keyboard input focus.
    Input,
    /// The assistive technology's cursor.
    Accessibility,
}

/// A focused node: either a native node or one inside foreign content.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FocusTarget<K, X = u32> {
    /// A node owned by the semantics cache.
    Native(K),
    /// A node owned by a foreign-content embedder.
    Foreign(X),
}

/// Notifications produced by tracker transitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FocusEvent<K, X = u32> {
    /// The pointer entered a node.
    HoverEnter(K),
    /// The pointer left a node.
    HoverExit(K),
    /// A node gained accessibility focus.
    AccessibilityFocused(K),
    /// A node lost accessibility focus.
    AccessibilityFocusCleared(K),
    /// A node became the announced input-focused node.
    InputFocused(K),
    /// A node inside foreign content lost focus.
    ForeignFocusCleared(X),
}

/// Notifications from a single transition; never more than two.
pub type FocusEvents<K, X = u32> = SmallVec<[FocusEvent<K, X>; 2]>;

/// Focus and hover state machine.
///
/// `K` keys native nodes and `X` keys nodes inside foreign content; the two
/// namespaces are disjoint and tracked separately.
#[derive(Clone, Debug)]
pub struct FocusHoverTracker<K, X = u32> {
    accessibility_focus: Option<K>,
    input_focus: Option<K>,
    last_announced_input: Option<K>,
    hovered: Option<K>,
    foreign_accessibility_focus: Option<X>,
    foreign_input_focus: Option<X>,
}

impl<K, X> Default for FocusHoverTracker<K, X> {
    fn default() -> Self {
        Self {
            accessibility_focus: None,
            input_focus: None,
            last_announced_input: None,
            hovered: None,
            foreign_accessibility_focus: None,
            foreign_input_focus: None,
        }
    }
}

impl<K: Copy + PartialEq, X: Copy + PartialEq> FocusHoverTracker<K, X> {
    /// Create a tracker with nothing focused or hovered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The node holding accessibility focus.
    pub fn accessibility_focus(&self) -> Option<K> {
        self.accessibility_focus
    }

    /// The node holding input focus.
    pub fn input_focus(&self) -> Option<K> {
        self.input_focus
    }

    /// The input-focused node most recently announced.
    pub fn last_announced_input(&self) -> Option<K> {
        self.last_announced_input
    }

    /// The node under the pointer.
    pub fn hovered(&self) -> Option<K> {
        self.hovered
    }

    /// Accessibility focus inside foreign content.
    pub fn foreign_accessibility_focus(&self) -> Option<X> {
        self.foreign_accessibility_focus
    }

    /// Input focus inside foreign content.
    pub fn foreign_input_focus(&self) -> Option<X> {
        self.foreign_input_focus
    }

    /// Returns true if `key` holds accessibility focus.
    pub fn is_accessibility_focused(&self, key: K) -> bool {
        self.accessibility_focus == Some(key)
    }

    /// The host moved accessibility focus onto `key`.
    pub fn focus_accessibility(&mut self, key: K) -> FocusEvents<K, X> {
        self.accessibility_focus = Some(key);
        let mut events = FocusEvents::new();
        events.push(FocusEvent::AccessibilityFocused(key));
        events
    }

    /// The host asked to clear accessibility focus from `key`.
    ///
    /// The state is cleared only if `key` holds focus, but the cleared
    /// notification is always produced: the host asked and expects an answer.
    pub fn clear_accessibility_focus(&mut self, key: K) -> FocusEvents<K, X> {
        if self.accessibility_focus == Some(key) {
            self.accessibility_focus = None;
        }
        let mut events = FocusEvents::new();
        events.push(FocusEvent::AccessibilityFocusCleared(key));
        events
    }

    /// Record the node the latest update marks as input focused.
    pub fn set_input_focus(&mut self, key: Option<K>) {
        self.input_focus = key;
    }

    /// Announce input focus if its identity changed since the last announcement.
    ///
    /// Re-decoding the same focused node does not announce it again. Losing input
    /// focus resets the bookkeeping, so the next focused node is announced even if
    /// it is the one announced before.
    pub fn announce_input_focus(&mut self) -> Option<FocusEvent<K, X>> {
        match self.input_focus {
            Some(key) if self.last_announced_input != Some(key) => {
                self.last_announced_input = Some(key);
                Some(FocusEvent::InputFocused(key))
            }
            Some(_) => None,
            None => {
                self.last_announced_input = None;
                None
            }
        }
    }

    /// The pointer moved and now rests over `target`.
    ///
    /// When the target changes, enter for the new target is reported before exit
    /// for the old one.
    pub fn hover_to(&mut self, target: Option<K>) -> FocusEvents<K, X> {
        let mut events = FocusEvents::new();
        if target == self.hovered {
            return events;
        }
        if let Some(new) = target {
            events.push(FocusEvent::HoverEnter(new));
        }
        if let Some(old) = self.hovered {
            events.push(FocusEvent::HoverExit(old));
        }
        self.hovered = target;
        events
    }

    /// The pointer left the host view.
    pub fn hover_exit(&mut self) -> FocusEvents<K, X> {
        let mut events = FocusEvents::new();
        if let Some(old) = self.hovered.take() {
            events.push(FocusEvent::HoverExit(old));
        }
        events
    }

    /// A node is about to be evicted; drop every reference to it.
    ///
    /// Losing accessibility focus this way is reported. Input focus and hover
    /// are dropped silently.
    pub fn node_removed(&mut self, key: K) -> FocusEvents<K, X> {
        let mut events = FocusEvents::new();
        if self.accessibility_focus == Some(key) {
            self.accessibility_focus = None;
            events.push(FocusEvent::AccessibilityFocusCleared(key));
        }
        if self.input_focus == Some(key) {
            self.input_focus = None;
        }
        if self.hovered == Some(key) {
            self.hovered = None;
        }
        events
    }

    /// Drop foreign input focus, reporting the node that lost it.
    pub fn clear_foreign_input_focus(&mut self) -> Option<FocusEvent<K, X>> {
        self.foreign_input_focus
            .take()
            .map(FocusEvent::ForeignFocusCleared)
    }

    /// Drop foreign accessibility focus.
    pub fn clear_foreign_accessibility_focus(&mut self) {
        self.foreign_accessibility_focus = None;
    }

    /// Foreign content reports that one of its nodes gained accessibility focus.
    pub fn foreign_accessibility_focused(&mut self, id: X) {
        self.foreign_accessibility_focus = Some(id);
        self.accessibility_focus = None;
    }

    /// Foreign content reports that its focused node lost focus.
    pub fn foreign_focus_cleared(&mut self) {
        self.foreign_accessibility_focus = None;
        self.foreign_input_focus = None;
    }

    /// Foreign content reports that one of its nodes gained input focus.
    pub fn foreign_input_focused(&mut self, id: X) {
        self.foreign_input_focus = Some(id);
        self.input_focus = None;
    }

    /// The node holding the requested focus.
    ///
    /// Native focus is preferred over foreign focus. An input lookup with no input
    /// focus anywhere falls through to accessibility focus.
    pub fn find_focus(&self, kind: FocusKind) -> Option<FocusTarget<K, X>> {
        if kind == FocusKind::Input {
            if let Some(key) = self.input_focus {
                return Some(FocusTarget::Native(key));
            }
            if let Some(id) = self.foreign_input_focus {
                return Some(FocusTarget::Foreign(id));
            }
        }
        self.accessibility_focus
            .map(FocusTarget::Native)
            .or(self.foreign_accessibility_focus.map(FocusTarget::Foreign))
    }

    /// Forget all focus and hover state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
