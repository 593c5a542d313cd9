// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Semantics Tree: a host-side cache of an engine-owned semantics tree.
//!
//! A UI engine describes what is on screen as a tree of semantics nodes and sends
//! that tree to the host incrementally, as binary update buffers. This crate holds
//! the host's copy.
//!
//! - Decodes node update buffers and custom action buffers ([`decode_update`],
//!   [`decode_custom_actions`]) into plain records, without touching the cache.
//! - Applies records to a [`SemanticsTree`], keeping a [`NodeSnapshot`] of each
//!   node's previous state so callers can tell what changed.
//! - Resolves parent links and global geometry in a [`SemanticsTree::commit`] step
//!   that also evicts every node no longer reachable from the root.
//! - Answers hit tests through each child's inverse hit-test transform.
//!
//! ## Update lifecycle
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use semantics_tree::encode::UpdateEncoder;
//! use semantics_tree::{NodeData, NodeId, SemanticsActions, SemanticsTree, decode_update};
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
//!
//! let mut enc = UpdateEncoder::new();
//! enc.push(NodeId::ROOT, &root).push(NodeId(1), &button);
//! let update = enc.finish();
//!
//! let mut tree = SemanticsTree::new();
//! let records = decode_update(&update.buffer, &update.strings, &update.attribute_args).unwrap();
//! tree.apply(records);
//! let commit = tree.commit(|_| {});
//! assert!(commit.removed.is_empty());
//!
//! assert_eq!(tree.hit_test(Point::new(20.0, 20.0), false), Some(NodeId(1)));
//! assert_eq!(tree.get(NodeId(1)).unwrap().parent(), Some(NodeId::ROOT));
//! ```
//!
//! ## Geometry
//!
//! Transforms are 4×4 column-major matrices ([`Matrix4`]) because the engine may
//! send perspective. Global bounds are the axis-aligned box around all four
//! transformed corners, so they are loose under rotation. Hit testing works in
//! homogeneous coordinates and divides by `w` before every bounds check; a point
//! that projects to infinity hits nothing.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod decode;
pub mod encode;
mod error;
mod matrix;
mod node;
mod tree;
mod types;

pub use decode::{
    ABSENT_STRING, ATTRIBUTE_LOCALE, ATTRIBUTE_SPELL_OUT, NodeRecord, PartialDecode,
    decode_custom_actions, decode_update,
};
pub use error::DecodeError;
pub use matrix::Matrix4;
pub use node::{ChildList, NodeData, NodeSnapshot, ScrollMetrics, SemanticsNode};
pub use tree::{Applied, Commit, SemanticsTree};
pub use types::{
    AttributedString, CustomAction, NodeId, SemanticsActions, SemanticsFlags, StringAttribute,
    StringAttributeKind, TextDirection,
};
