// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Semantics Bridge: keeps a host's accessibility view in sync with an engine.
//!
//! The engine owns the semantics tree and streams it to the host as binary
//! update buffers. [`AccessibilityBridge`] decodes those buffers into a cache
//! ([`semantics_tree::SemanticsTree`]), tracks focus and hover
//! ([`semantics_focus::FocusHoverTracker`]), and turns both directions of traffic
//! into plain values:
//!
//! - Host queries become [`NodeDescriptor`]s built from the cache.
//! - Host actions become engine dispatches through an [`EngineChannel`], with
//!   cursor, selection, and value changes predicted locally so that screen
//!   readers get immediate feedback.
//! - Tree updates become [`SemanticsEvent`]s delivered to an [`EventSink`]:
//!   content changes, scrolls, text edits, route changes, and focus changes.
//!
//! Virtual ids at or above [`BridgeConfig::min_foreign_id`] belong to foreign
//! content (native views embedded in the tree) and are forwarded untouched to a
//! [`ForeignContentEmbedder`].
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use semantics_bridge::{
//!     AccessibilityBridge, ActionArgs, DispatchedAction, EventKind, HostAction,
//!     HostActionArgs, SemanticsEvent,
//! };
//! use semantics_tree::encode::UpdateEncoder;
//! use semantics_tree::{NodeData, NodeId, SemanticsActions};
//!
//! let mut root = NodeData {
//!     rect: Rect::new(0.0, 0.0, 200.0, 100.0),
//!     ..NodeData::default()
//! };
//! root.children_in_traversal_order.push(NodeId(1));
//! root.children_in_hit_test_order.push(NodeId(1));
//! let button = NodeData {
//!     rect: Rect::new(10.0, 10.0, 60.0, 30.0),
//!     actions: SemanticsActions::TAP,
//!     ..NodeData::default()
//! };
//! let mut enc = UpdateEncoder::new();
//! enc.push(NodeId::ROOT, &root).push(NodeId(1), &button);
//! let update = enc.finish();
//!
//! let engine: Vec<DispatchedAction> = Vec::new();
//! let sink: Vec<SemanticsEvent> = Vec::new();
//! let mut bridge = AccessibilityBridge::new(engine, sink);
//! bridge
//!     .update_tree(&update.buffer, &update.strings, &update.attribute_args)
//!     .unwrap();
//!
//! assert!(bridge.on_hover_move(Point::new(20.0, 20.0), false));
//! assert_eq!(
//!     bridge.sink().last(),
//!     Some(&SemanticsEvent::node(1, EventKind::HoverEnter))
//! );
//!
//! assert!(bridge.perform_action(1, HostAction::Click, &HostActionArgs::default()));
//! assert_eq!(
//!     bridge.engine().last(),
//!     Some(&DispatchedAction {
//!         node: NodeId(1),
//!         action: SemanticsActions::TAP,
//!         args: ActionArgs::None,
//!     })
//! );
//! ```
//!
//! ## Malformed updates
//!
//! A malformed buffer is a protocol violation. Builds with debug assertions
//! reject the whole update and leave the cache untouched. Release builds apply
//! the records decoded before the error, log a warning through `tracing`, and
//! still return the error.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod actions;
mod bridge;
mod config;
pub mod cursor;
mod descriptor;
pub mod diff;
mod embedder;
mod events;

pub use actions::{
    ActionArgs, DispatchedAction, EngineChannel, Granularity, HostAction, HostActionArgs,
};
pub use bridge::{AccessibilityBridge, EngineMessage, ForeignContentEvent};
pub use config::BridgeConfig;
pub use descriptor::{LiveRegion, NodeDescriptor, NodeStates, OfferedAction, Role};
pub use embedder::{FixedLocale, ForeignContentEmbedder, LocaleProvider, NoForeignContent};
pub use events::{
    ContentChange, EventKind, EventSink, EventTarget, ScrollAxis, ScrollItems, SemanticsEvent,
};
