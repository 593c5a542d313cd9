// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writers for the update wire format.
//!
//! These mirror [`crate::decode`] and are what an engine (or a test harness
//! standing in for one) uses to produce update buffers.
//!
//! ```rust
//! use semantics_tree::encode::UpdateEncoder;
//! use semantics_tree::{NodeData, NodeId, decode_update};
//!
//! let mut enc = UpdateEncoder::new();
//! enc.push(NodeId::ROOT, &NodeData::default());
//! let update = enc.finish();
//!
//! let records = decode_update(&update.buffer, &update.strings, &update.attribute_args).unwrap();
//! assert_eq!(records[0].id, NodeId::ROOT);
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::decode::{ABSENT_STRING, ATTRIBUTE_LOCALE, ATTRIBUTE_SPELL_OUT};
use crate::matrix::Matrix4;
use crate::node::NodeData;
use crate::types::{AttributedString, CustomAction, NodeId, StringAttributeKind};

/// A complete node update: buffer plus its side tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedUpdate {
    /// Node records.
    pub buffer: Vec<u8>,
    /// String table.
    pub strings: Vec<String>,
    /// Locale attribute arguments, UTF-8 encoded.
    pub attribute_args: Vec<Vec<u8>>,
}

/// Shared string-table bookkeeping.
#[derive(Clone, Debug, Default)]
struct Writer {
    buffer: Vec<u8>,
    strings: Vec<String>,
}

impl Writer {
    fn i32(&mut self, v: i32) {
        self.buffer.extend_from_slice(&v.to_le_bytes());
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "The wire carries single-precision floats."
    )]
    fn f32(&mut self, v: f64) {
        self.buffer.extend_from_slice(&(v as f32).to_le_bytes());
    }

    fn len_i32(&mut self, len: usize) {
        self.i32(i32::try_from(len).unwrap_or(i32::MAX));
    }

    fn string(&mut self, s: Option<&str>) {
        let Some(s) = s else {
            self.i32(ABSENT_STRING);
            return;
        };
        let index = match self.strings.iter().position(|t| t == s) {
            Some(i) => i,
            None => {
                self.strings.push(s.into());
                self.strings.len() - 1
            }
        };
        self.len_i32(index);
    }

    fn matrix(&mut self, m: &Matrix4) {
        for v in m.0 {
            self.f32(v);
        }
    }
}

/// Builds a node update buffer record by record.
#[derive(Clone, Debug, Default)]
pub struct UpdateEncoder {
    w: Writer,
    attribute_args: Vec<Vec<u8>>,
}

impl UpdateEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    fn attributed(&mut self, s: &AttributedString) {
        self.w.string(s.as_str());
        if s.attributes.is_empty() {
            self.w.i32(-1);
            return;
        }
        self.w.len_i32(s.attributes.len());
        for attr in &s.attributes {
            self.w.i32(attr.start);
            self.w.i32(attr.end);
            match &attr.kind {
                StringAttributeKind::SpellOut => {
                    self.w.i32(ATTRIBUTE_SPELL_OUT);
                    self.w.i32(0);
                }
                StringAttributeKind::Locale(locale) => {
                    self.w.i32(ATTRIBUTE_LOCALE);
                    self.attribute_args.push(locale.as_bytes().to_vec());
                    self.w.len_i32(self.attribute_args.len() - 1);
                }
            }
        }
    }

    /// Append one node record.
    pub fn push(&mut self, id: NodeId, data: &NodeData) -> &mut Self {
        self.w.i32(i32::try_from(id.get()).unwrap_or(i32::MAX));
        self.w
            .buffer
            .extend_from_slice(&data.flags.bits().to_le_bytes());
        self.w.buffer.extend_from_slice(&data.actions.bits().to_le_bytes());
        self.w.i32(data.max_value_length);
        self.w.i32(data.current_value_length);
        self.w.i32(data.text_selection_base);
        self.w.i32(data.text_selection_extent);
        self.w.i32(data.platform_view_id);
        self.w.i32(data.scroll_child_count);
        self.w.i32(data.scroll_index);
        self.w.i32(data.scroll_parent);
        for v in [
            data.scroll.position,
            data.scroll.extent_max,
            data.scroll.extent_min,
        ] {
            self.w.buffer.extend_from_slice(&v.to_le_bytes());
        }
        self.w.string(data.identifier.as_deref());
        self.attributed(&data.label);
        self.attributed(&data.value);
        self.attributed(&data.increased_value);
        self.attributed(&data.decreased_value);
        self.attributed(&data.hint);
        self.w.string(data.tooltip.as_deref());
        self.w.string(data.link_url.as_deref());
        self.w.string(data.locale.as_deref());
        self.w.i32(data.heading_level);
        self.w.i32(data.text_direction.to_wire());
        for v in [data.rect.x0, data.rect.y0, data.rect.x1, data.rect.y1] {
            self.w.f32(v);
        }
        self.w.matrix(&data.transform);
        self.w.matrix(&data.hit_test_transform);
        for list in [
            &data.children_in_traversal_order,
            &data.children_in_hit_test_order,
        ] {
            self.w.len_i32(list.len());
            for child in list {
                self.w.i32(i32::try_from(child.get()).unwrap_or(i32::MAX));
            }
        }
        self.w.len_i32(data.custom_actions.len());
        for &action in &data.custom_actions {
            self.w.i32(action);
        }
        self
    }

    /// Finish and return the buffer and side tables.
    pub fn finish(self) -> EncodedUpdate {
        EncodedUpdate {
            buffer: self.w.buffer,
            strings: self.w.strings,
            attribute_args: self.attribute_args,
        }
    }
}

/// Builds a custom action buffer.
#[derive(Clone, Debug, Default)]
pub struct CustomActionEncoder {
    w: Writer,
}

impl CustomActionEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one action.
    pub fn push(&mut self, action: &CustomAction) -> &mut Self {
        self.w.i32(action.id);
        self.w.i32(action.override_id);
        self.w.string(action.label.as_deref());
        self.w.string(action.hint.as_deref());
        self
    }

    /// Finish and return the buffer and string table.
    pub fn finish(self) -> (Vec<u8>, Vec<String>) {
        (self.w.buffer, self.w.strings)
    }
}
