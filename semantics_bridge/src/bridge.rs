// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The bridge facade: update ingestion, host queries, host actions, and events.

use alloc::string::String;
use alloc::vec::Vec;
use kurbo::{Point, Rect};
use tracing::{debug, trace, warn};

use semantics_focus::{FocusEvent, FocusEvents, FocusHoverTracker, FocusKind, FocusTarget};
use semantics_tree::{
    AttributedString, DecodeError, NodeId, NodeRecord, PartialDecode, SemanticsActions,
    SemanticsFlags, SemanticsNode, SemanticsTree, decode_custom_actions, decode_update,
};

use crate::actions::{ActionArgs, EngineChannel, Granularity, HostAction, HostActionArgs};
use crate::config::BridgeConfig;
use crate::cursor::{self, Selection};
use crate::descriptor::{NodeDescriptor, describe};
use crate::diff;
use crate::embedder::{FixedLocale, ForeignContentEmbedder, LocaleProvider, NoForeignContent};
use crate::events::{ContentChange, EventKind, EventSink, SemanticsEvent};

/// A message the engine sends outside of tree updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineMessage {
    /// Speak a message.
    Announce {
        /// The message.
        message: String,
    },
    /// A node was tapped.
    Tap {
        /// The node.
        node: NodeId,
    },
    /// A node was long-pressed.
    LongPress {
        /// The node.
        node: NodeId,
    },
    /// A node took input focus.
    Focus {
        /// The node.
        node: NodeId,
    },
    /// A tooltip appeared.
    Tooltip {
        /// Its text.
        message: String,
    },
}

/// Focus changes reported by foreign content.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ForeignContentEvent {
    /// A foreign node gained accessibility focus.
    AccessibilityFocused,
    /// The focused foreign node lost focus.
    FocusCleared,
    /// A foreign node gained input focus.
    InputFocused,
}

fn to_event(event: FocusEvent<NodeId>) -> SemanticsEvent {
    match event {
        FocusEvent::HoverEnter(n) => SemanticsEvent::node(n.get(), EventKind::HoverEnter),
        FocusEvent::HoverExit(n) => SemanticsEvent::node(n.get(), EventKind::HoverExit),
        FocusEvent::AccessibilityFocused(n) => {
            SemanticsEvent::node(n.get(), EventKind::AccessibilityFocused)
        }
        FocusEvent::AccessibilityFocusCleared(n) => {
            SemanticsEvent::node(n.get(), EventKind::AccessibilityFocusCleared)
        }
        FocusEvent::InputFocused(n) => SemanticsEvent::node(n.get(), EventKind::InputFocused),
        FocusEvent::ForeignFocusCleared(x) => {
            SemanticsEvent::node(x, EventKind::AccessibilityFocusCleared)
        }
    }
}

/// Announce input focus if `id` holds it and was not announced yet.
///
/// With no input focus at all, the announcement bookkeeping is reset instead.
fn announce_input(focus: &mut FocusHoverTracker<NodeId>, id: NodeId) -> Option<SemanticsEvent> {
    match focus.input_focus() {
        Some(focused) if focused == id => focus.announce_input_focus().map(to_event),
        None => {
            focus.announce_input_focus();
            None
        }
        Some(_) => None,
    }
}

/// Host-side mirror of an engine's semantics tree.
///
/// The bridge owns the cache and the focus state, and talks to three
/// collaborators it is handed at construction: an [`EngineChannel`] for
/// semantic actions, an [`EventSink`] for host notifications, and optionally a
/// [`ForeignContentEmbedder`] and a [`LocaleProvider`].
///
/// Everything runs on the caller's thread. Queries answer from whatever the cache
/// holds, which may lag the engine; actions on stale ids report "not handled".
#[derive(Debug)]
pub struct AccessibilityBridge<E, S, F = NoForeignContent, L = FixedLocale> {
    config: BridgeConfig,
    tree: SemanticsTree,
    focus: FocusHoverTracker<NodeId>,
    routes: Vec<NodeId>,
    last_route: Option<NodeId>,
    engine: E,
    sink: S,
    embedder: F,
    locale: L,
}

impl<E: EngineChannel, S: EventSink> AccessibilityBridge<E, S> {
    /// Create a bridge with the default configuration, no foreign content, and
    /// no default locale.
    pub fn new(engine: E, sink: S) -> Self {
        Self::with_parts(
            BridgeConfig::default(),
            engine,
            sink,
            NoForeignContent,
            FixedLocale::default(),
        )
    }
}

impl<E, S, F, L> AccessibilityBridge<E, S, F, L>
where
    E: EngineChannel,
    S: EventSink,
    F: ForeignContentEmbedder,
    L: LocaleProvider,
{
    /// Create a bridge from all of its parts.
    pub fn with_parts(config: BridgeConfig, engine: E, sink: S, embedder: F, locale: L) -> Self {
        Self {
            config,
            tree: SemanticsTree::new(),
            focus: FocusHoverTracker::new(),
            routes: Vec::new(),
            last_route: None,
            engine,
            sink,
            embedder,
            locale,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The node cache.
    pub fn tree(&self) -> &SemanticsTree {
        &self.tree
    }

    /// Focus and hover state.
    pub fn focus(&self) -> &FocusHoverTracker<NodeId> {
        &self.focus
    }

    /// The engine channel.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine channel, mutably.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The event sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The event sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The foreign-content embedder.
    pub fn embedder(&self) -> &F {
        &self.embedder
    }

    fn emit(&mut self, event: SemanticsEvent) {
        trace!(?event, "semantics event");
        self.sink.send(event);
    }

    fn emit_all(&mut self, events: impl IntoIterator<Item = SemanticsEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    fn emit_focus(&mut self, events: FocusEvents<NodeId>) {
        self.emit_all(events.into_iter().map(to_event));
    }

    fn dispatch(&mut self, node: NodeId, action: SemanticsActions, args: ActionArgs) {
        trace!(%node, ?action, "dispatching semantic action");
        self.engine.dispatch(node, action, args);
    }

    /// Split a decode result according to the protocol error policy.
    ///
    /// Debug builds reject a malformed buffer outright; release builds keep the
    /// records decoded before the error.
    fn accept<T>(
        result: Result<Vec<T>, PartialDecode<T>>,
        what: &str,
    ) -> Result<(Vec<T>, Option<DecodeError>), DecodeError> {
        match result {
            Ok(records) => Ok((records, None)),
            Err(PartialDecode { error, .. }) if cfg!(debug_assertions) => {
                debug!(%error, what, "rejecting malformed buffer");
                Err(error)
            }
            Err(PartialDecode { records, error }) => {
                warn!(%error, what, applied = records.len(), "malformed buffer, applying decoded prefix");
                Ok((records, Some(error)))
            }
        }
    }

    /// Ingest a node update buffer.
    ///
    /// Decodes the buffer, applies it, evicts unreachable nodes, and emits every
    /// notification the update implies. A malformed buffer returns the error; see
    /// [`BridgeConfig`] and the crate docs for what is applied in that case.
    pub fn update_tree<T: AsRef<str>, A: AsRef<[u8]>>(
        &mut self,
        buffer: &[u8],
        strings: &[T],
        attribute_args: &[A],
    ) -> Result<(), DecodeError> {
        let (records, error) = Self::accept(
            decode_update(buffer, strings, attribute_args),
            "node update",
        )?;
        self.apply_update(records);
        error.map_or(Ok(()), Err)
    }

    /// Ingest a custom action buffer.
    pub fn update_custom_actions<T: AsRef<str>>(
        &mut self,
        buffer: &[u8],
        strings: &[T],
    ) -> Result<(), DecodeError> {
        let (actions, error) =
            Self::accept(decode_custom_actions(buffer, strings), "custom actions")?;
        debug!(count = actions.len(), "custom actions updated");
        self.tree.apply_custom_actions(actions);
        error.map_or(Ok(()), Err)
    }

    fn apply_update(&mut self, records: Vec<NodeRecord>) {
        let flags: Vec<(NodeId, SemanticsFlags)> =
            records.iter().map(|r| (r.id, r.data.flags)).collect();
        let applied = self.tree.apply(records);

        // Non-hidden decoded nodes, and whether each was seen before this update.
        let mut updated: Vec<(NodeId, bool)> = Vec::new();
        for (id, flags) in flags {
            if flags.contains(SemanticsFlags::IS_HIDDEN) {
                continue;
            }
            if flags.contains(SemanticsFlags::IS_FOCUSED) {
                self.focus.set_input_focus(Some(id));
            } else if self.focus.input_focus() == Some(id) {
                self.focus.set_input_focus(None);
            }
            let seen_before = self
                .tree
                .get(id)
                .is_some_and(SemanticsNode::had_previous_config);
            if !updated.iter().any(|&(u, _)| u == id) {
                updated.push((id, seen_before));
            }
        }

        // Eviction notifications wait until the route change has been announced.
        let mut evicted = Vec::new();
        let focus = &mut self.focus;
        let embedder = &self.embedder;
        let commit = self.tree.commit(|node| {
            if node.hosts_foreign_content()
                && let Some(foreign) = focus.foreign_input_focus()
                && embedder.platform_view_of(foreign) == Some(node.data().platform_view_id)
            {
                evicted.extend(focus.clear_foreign_input_focus());
            }
            evicted.extend(focus.node_removed(node.id()));
        });

        if let Some(route) = diff::newest_route(&self.routes, &commit.routes)
            && (self.last_route != Some(route) || commit.routes.len() != self.routes.len())
        {
            self.last_route = Some(route);
            let title = self.tree.route_name(route).unwrap_or(" ").into();
            self.emit(SemanticsEvent::node(
                route.get(),
                EventKind::WindowStateChanged { title },
            ));
        }
        self.routes = commit.routes;

        self.emit_all(evicted.into_iter().map(to_event));

        debug!(
            decoded = applied.decoded.len(),
            created = applied.created.len(),
            removed = commit.removed.len(),
            "semantics update applied"
        );
        if applied.changed || !applied.created.is_empty() || !commit.removed.is_empty() {
            self.emit(SemanticsEvent::node(
                NodeId::ROOT.get(),
                EventKind::WindowContentChanged {
                    change: ContentChange::Subtree,
                },
            ));
        }

        for (id, seen_before) in updated {
            if seen_before {
                let events = self.changes_of(id);
                self.emit_all(events);
            } else if let Some(event) = announce_input(&mut self.focus, id) {
                // A first decode has nothing to diff, but may still take input focus.
                self.emit(event);
            }
        }
    }

    /// Notifications for one node updated in place.
    fn changes_of(&mut self, id: NodeId) -> Vec<SemanticsEvent> {
        let mut events = Vec::new();
        let Some(node) = self.tree.get(id) else {
            return events;
        };
        let raw = id.get();

        if node.did_scroll() {
            events.push(SemanticsEvent::node(
                raw,
                diff::scrolled(&self.tree, node, &self.config),
            ));
        }
        if node.has_flag(SemanticsFlags::IS_LIVE_REGION) && node.did_change_label() {
            events.push(SemanticsEvent::node(
                raw,
                EventKind::WindowContentChanged {
                    change: ContentChange::Text,
                },
            ));
        }
        if self.focus.is_accessibility_focused(id) && diff::became_selected(node) {
            events.push(SemanticsEvent::node(
                raw,
                EventKind::Selected {
                    text: node.data().label.text.clone(),
                },
            ));
        }

        events.extend(announce_input(&mut self.focus, id));

        let accessibility_focus = self.focus.accessibility_focus();
        if self.focus.input_focus() == Some(id)
            && node.had_flag(SemanticsFlags::IS_TEXT_FIELD)
            && node.has_flag(SemanticsFlags::IS_TEXT_FIELD)
            && accessibility_focus.is_none_or(|a| a == id)
        {
            let value = node.data().value.as_str();
            let before = node.previous().and_then(|p| p.value.as_deref());
            if let Some(kind) = diff::text_changed(before, value) {
                events.push(SemanticsEvent::node(raw, kind));
            }
            if diff::selection_moved(node) {
                let data = node.data();
                events.push(SemanticsEvent::node(
                    raw,
                    diff::selection_changed(
                        value,
                        data.text_selection_base,
                        data.text_selection_extent,
                    ),
                ));
            }
        }
        events
    }

    /// Describe the node with the given virtual id.
    pub fn node_info(&self, virtual_id: u32) -> Option<NodeDescriptor> {
        if self.config.is_foreign(virtual_id) {
            debug!(virtual_id, "forwarding node query to foreign content");
            return self.embedder.node_info(virtual_id);
        }
        let Some(node) = self.tree.get(NodeId(virtual_id)) else {
            debug!(virtual_id, "node query for unknown id");
            return None;
        };
        if node.hosts_foreign_content() {
            let bounds = node.global_rect().unwrap_or(Rect::ZERO);
            if let Some(root) =
                self.embedder
                    .root_node_info(node.data().platform_view_id, virtual_id, bounds)
            {
                return Some(root);
            }
        }
        Some(describe(
            &self.tree,
            node,
            &self.focus,
            &self.config,
            self.locale.default_locale(),
        ))
    }

    /// The node under `point`, in root coordinates.
    ///
    /// With `stop_at_foreign_content`, a node hosting foreign content is a hit
    /// even when it is not focusable.
    pub fn hit_test(&self, point: Point, stop_at_foreign_content: bool) -> Option<NodeId> {
        self.tree.hit_test(point, stop_at_foreign_content)
    }

    /// Virtual id of the node holding the requested focus.
    pub fn find_focus(&self, kind: FocusKind) -> Option<u32> {
        self.focus.find_focus(kind).map(|target| match target {
            FocusTarget::Native(node) => node.get(),
            FocusTarget::Foreign(id) => id,
        })
    }

    /// Perform a host action on the node with the given virtual id.
    ///
    /// Returns whether the action was handled.
    pub fn perform_action(
        &mut self,
        virtual_id: u32,
        action: HostAction,
        args: &HostActionArgs,
    ) -> bool {
        if self.config.is_foreign(virtual_id) {
            debug!(virtual_id, ?action, "forwarding action to foreign content");
            let done = self.embedder.perform_action(virtual_id, action, args);
            if done && action == HostAction::ClearAccessibilityFocus {
                self.focus.clear_foreign_accessibility_focus();
            }
            return done;
        }
        let id = NodeId(virtual_id);
        let Some(node) = self.tree.get(id) else {
            debug!(virtual_id, ?action, "action on unknown id");
            return false;
        };
        let supports_range = node
            .data()
            .actions
            .intersects(SemanticsActions::INCREASE | SemanticsActions::DECREASE);

        match action {
            HostAction::Click => self.dispatch(id, SemanticsActions::TAP, ActionArgs::None),
            HostAction::LongClick => {
                self.dispatch(id, SemanticsActions::LONG_PRESS, ActionArgs::None);
            }
            HostAction::ScrollForward => return self.scroll(id, true),
            HostAction::ScrollBackward => return self.scroll(id, false),
            HostAction::NextAtMovementGranularity => return self.move_cursor(id, args, true),
            HostAction::PreviousAtMovementGranularity => {
                return self.move_cursor(id, args, false);
            }
            HostAction::AccessibilityFocus => {
                let events = self.focus.focus_accessibility(id);
                self.dispatch(
                    id,
                    SemanticsActions::DID_GAIN_ACCESSIBILITY_FOCUS,
                    ActionArgs::None,
                );
                self.emit_focus(events);
                if supports_range {
                    self.emit(SemanticsEvent::node(
                        virtual_id,
                        EventKind::Selected { text: None },
                    ));
                }
            }
            HostAction::ClearAccessibilityFocus => {
                let events = self.focus.clear_accessibility_focus(id);
                self.dispatch(
                    id,
                    SemanticsActions::DID_LOSE_ACCESSIBILITY_FOCUS,
                    ActionArgs::None,
                );
                self.emit_focus(events);
            }
            HostAction::SetSelection => {
                let extent = node.data().text_selection_extent;
                let (base, extent) = args.selection.unwrap_or((extent, extent));
                if let Some(node) = self.tree.get_mut(id) {
                    node.data_mut().text_selection_base = base;
                    node.data_mut().text_selection_extent = extent;
                }
                self.dispatch(
                    id,
                    SemanticsActions::SET_SELECTION,
                    ActionArgs::Selection { base, extent },
                );
            }
            HostAction::SetText => {
                let text = args.text.clone().unwrap_or_default();
                if let Some(node) = self.tree.get_mut(id) {
                    node.data_mut().value = AttributedString::plain(text.clone());
                }
                self.dispatch(id, SemanticsActions::SET_TEXT, ActionArgs::Text(text));
            }
            HostAction::Copy => self.dispatch(id, SemanticsActions::COPY, ActionArgs::None),
            HostAction::Cut => self.dispatch(id, SemanticsActions::CUT, ActionArgs::None),
            HostAction::Paste => self.dispatch(id, SemanticsActions::PASTE, ActionArgs::None),
            HostAction::Dismiss => self.dispatch(id, SemanticsActions::DISMISS, ActionArgs::None),
            HostAction::ShowOnScreen => {
                self.dispatch(id, SemanticsActions::SHOW_ON_SCREEN, ActionArgs::None);
            }
            HostAction::Focus => self.dispatch(id, SemanticsActions::FOCUS, ActionArgs::None),
            HostAction::Custom(host_id) => {
                let action = host_id
                    .checked_sub(self.config.custom_action_offset)
                    .and_then(|id| i32::try_from(id).ok())
                    .and_then(|id| self.tree.custom_action(id));
                let Some(action) = action else {
                    debug!(virtual_id, host_id, "unknown custom action");
                    return false;
                };
                let engine_id = action.id;
                self.dispatch(
                    id,
                    SemanticsActions::CUSTOM_ACTION,
                    ActionArgs::CustomAction(engine_id),
                );
            }
        }
        true
    }

    fn scroll(&mut self, id: NodeId, forward: bool) -> bool {
        let (vertical, horizontal, range) = if forward {
            (
                SemanticsActions::SCROLL_UP,
                SemanticsActions::SCROLL_LEFT,
                SemanticsActions::INCREASE,
            )
        } else {
            (
                SemanticsActions::SCROLL_DOWN,
                SemanticsActions::SCROLL_RIGHT,
                SemanticsActions::DECREASE,
            )
        };
        let Some(node) = self.tree.get_mut(id) else {
            return false;
        };
        let action = if node.has_action(vertical) {
            vertical
        } else if node.has_action(horizontal) {
            horizontal
        } else if node.has_action(range) {
            let data = node.data_mut();
            data.value = if forward {
                data.increased_value.clone()
            } else {
                data.decreased_value.clone()
            };
            self.emit(SemanticsEvent::node(
                id.get(),
                EventKind::Selected { text: None },
            ));
            range
        } else {
            return false;
        };
        self.dispatch(id, action, ActionArgs::None);
        true
    }

    fn move_cursor(&mut self, id: NodeId, args: &HostActionArgs, forward: bool) -> bool {
        let Some(granularity) = args.granularity else {
            return false;
        };
        let Some(node) = self.tree.get_mut(id) else {
            return false;
        };
        let data = node.data_mut();
        let current = Selection {
            base: data.text_selection_base,
            extent: data.text_selection_extent,
        };
        let value = data.value.as_str().unwrap_or_default();
        let predicted =
            cursor::predict(value, current, granularity, forward, args.extend_selection);
        if let Some(next) = predicted
            && next != current
        {
            let event = diff::selection_changed(Some(value), next.base, next.extent);
            data.text_selection_base = next.base;
            data.text_selection_extent = next.extent;
            self.emit(SemanticsEvent::node(id.get(), event));
        }

        let action = match (granularity, forward) {
            (Granularity::Character, true) => SemanticsActions::MOVE_CURSOR_FORWARD_BY_CHARACTER,
            (Granularity::Character, false) => {
                SemanticsActions::MOVE_CURSOR_BACKWARD_BY_CHARACTER
            }
            (Granularity::Word, true) => SemanticsActions::MOVE_CURSOR_FORWARD_BY_WORD,
            (Granularity::Word, false) => SemanticsActions::MOVE_CURSOR_BACKWARD_BY_WORD,
            // The engine has no line, paragraph, or page movement; the prediction is all there is.
            (Granularity::Line | Granularity::Paragraph | Granularity::Page, _) => return true,
        };
        let supported = self.tree.get(id).is_some_and(|n| n.has_action(action));
        if supported {
            self.dispatch(id, action, ActionArgs::ExtendSelection(args.extend_selection));
        }
        supported
    }

    /// The pointer hovered at `point` in root coordinates.
    ///
    /// Returns whether the hover was consumed. Hovering over foreign content is
    /// forwarded to the embedder.
    pub fn on_hover_move(&mut self, point: Point, stop_at_foreign_content: bool) -> bool {
        if self.tree.is_empty() {
            return false;
        }
        let hit = self.tree.hit_test(point, stop_at_foreign_content);
        if let Some(id) = hit
            && self.tree.get(id).is_some_and(SemanticsNode::hosts_foreign_content)
        {
            return self.embedder.on_hover(id.get(), point);
        }
        let events = self.focus.hover_to(hit);
        self.emit_focus(events);
        true
    }

    /// The pointer left the host view.
    pub fn on_hover_exit(&mut self) -> bool {
        let events = self.focus.hover_exit();
        self.emit_focus(events);
        true
    }

    /// Handle a message from the engine.
    pub fn handle_engine_message(&mut self, message: EngineMessage) {
        let event = match message {
            EngineMessage::Announce { message } => {
                SemanticsEvent::host_view(EventKind::Announcement { message })
            }
            EngineMessage::Tap { node } => SemanticsEvent::node(node.get(), EventKind::Clicked),
            EngineMessage::LongPress { node } => {
                SemanticsEvent::node(node.get(), EventKind::LongClicked)
            }
            EngineMessage::Focus { node } => {
                SemanticsEvent::node(node.get(), EventKind::InputFocused)
            }
            EngineMessage::Tooltip { message } => SemanticsEvent::node(
                NodeId::ROOT.get(),
                EventKind::WindowStateChanged { title: message },
            ),
        };
        self.emit(event);
    }

    /// Foreign content reports a focus change on one of its nodes.
    pub fn on_foreign_content_event(&mut self, virtual_id: u32, event: ForeignContentEvent) {
        if !self.config.is_foreign(virtual_id) {
            debug_assert!(false, "foreign content event for native id {virtual_id}");
            return;
        }
        match event {
            ForeignContentEvent::AccessibilityFocused => {
                self.focus.foreign_accessibility_focused(virtual_id);
            }
            ForeignContentEvent::FocusCleared => self.focus.foreign_focus_cleared(),
            ForeignContentEvent::InputFocused => self.focus.foreign_input_focused(virtual_id),
        }
    }

    /// Drop all cached state.
    pub fn reset(&mut self) {
        self.tree.clear();
        self.focus.reset();
        self.routes.clear();
        self.last_route = None;
        self.emit(SemanticsEvent::node(
            NodeId::ROOT.get(),
            EventKind::WindowContentChanged {
                change: ContentChange::Subtree,
            },
        ));
    }
}
