// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host action requests and the semantic actions they turn into.

use alloc::string::String;
use alloc::vec::Vec;
use semantics_tree::{NodeId, SemanticsActions};

/// Unit of a cursor movement request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One user-perceived character.
    Character,
    /// One word.
    Word,
    /// One line.
    Line,
    /// One paragraph.
    Paragraph,
    /// One page.
    Page,
}

/// An interaction requested by the host accessibility service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostAction {
    /// Activate the node.
    Click,
    /// Long-press the node.
    LongClick,
    /// Scroll forward, or increase a range widget.
    ScrollForward,
    /// Scroll backward, or decrease a range widget.
    ScrollBackward,
    /// Move the cursor forward by [`HostActionArgs::granularity`].
    NextAtMovementGranularity,
    /// Move the cursor backward by [`HostActionArgs::granularity`].
    PreviousAtMovementGranularity,
    /// Set the selection to [`HostActionArgs::selection`].
    SetSelection,
    /// Replace the text with [`HostActionArgs::text`].
    SetText,
    /// Copy the selection.
    Copy,
    /// Cut the selection.
    Cut,
    /// Paste at the cursor.
    Paste,
    /// Dismiss the node.
    Dismiss,
    /// Move accessibility focus onto the node.
    AccessibilityFocus,
    /// Clear accessibility focus from the node.
    ClearAccessibilityFocus,
    /// Bring the node on screen.
    ShowOnScreen,
    /// Give the node input focus.
    Focus,
    /// Run a custom action, by host action id.
    Custom(u32),
}

/// Arguments accompanying a [`HostAction`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostActionArgs {
    /// Unit for cursor movement.
    pub granularity: Option<Granularity>,
    /// Extend the selection instead of collapsing it.
    pub extend_selection: bool,
    /// New selection as `(start, end)`.
    pub selection: Option<(i32, i32)>,
    /// New text.
    pub text: Option<String>,
}

/// Arguments sent to the engine with a semantic action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActionArgs {
    /// No arguments.
    #[default]
    None,
    /// Cursor movement: whether to extend the selection.
    ExtendSelection(bool),
    /// Selection to apply.
    Selection {
        /// Selection anchor.
        base: i32,
        /// Selection focus.
        extent: i32,
    },
    /// Replacement text.
    Text(String),
    /// Engine id of the custom action to run.
    CustomAction(i32),
}

/// Outbound channel for semantic actions.
pub trait EngineChannel {
    /// Ask the engine to perform `action` on `node`.
    fn dispatch(&mut self, node: NodeId, action: SemanticsActions, args: ActionArgs);
}

/// A semantic action as sent to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchedAction {
    /// Target node.
    pub node: NodeId,
    /// The action; exactly one bit.
    pub action: SemanticsActions,
    /// Its arguments.
    pub args: ActionArgs,
}

impl EngineChannel for Vec<DispatchedAction> {
    fn dispatch(&mut self, node: NodeId, action: SemanticsActions, args: ActionArgs) {
        self.push(DispatchedAction { node, action, args });
    }
}

impl<E: EngineChannel + ?Sized> EngineChannel for &mut E {
    fn dispatch(&mut self, node: NodeId, action: SemanticsActions, args: ActionArgs) {
        (**self).dispatch(node, action, args);
    }
}
