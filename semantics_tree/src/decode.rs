// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoding of engine update buffers.
//!
//! An update buffer is a sequence of records, each read in a fixed field order
//! (see [`NodeData`] for the fields). Strings are references into a side table;
//! locale attributes reference a second table of UTF-8 byte buffers. All
//! numbers are little-endian.
//!
//! Decoding is pure: it produces records without touching any cache, so a
//! malformed buffer never leaves a half-applied tree behind.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use kurbo::Rect;

use crate::error::DecodeError;
use crate::matrix::Matrix4;
use crate::node::{ChildList, NodeData, ScrollMetrics};
use crate::types::{
    AttributedString, CustomAction, NodeId, SemanticsActions, SemanticsFlags, StringAttribute,
    StringAttributeKind, TextDirection,
};

/// String reference value meaning "no string".
pub const ABSENT_STRING: i32 = -1;

/// Attribute-run type tag for spell-out runs.
pub const ATTRIBUTE_SPELL_OUT: i32 = 0;

/// Attribute-run type tag for locale runs.
pub const ATTRIBUTE_LOCALE: i32 = 1;

/// One decoded node record.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    /// Node the record applies to.
    pub id: NodeId,
    /// Decoded fields.
    pub data: NodeData,
}

/// Records decoded before a malformed one, together with the error.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialDecode<T> {
    /// Records fully decoded before the error.
    pub records: Vec<T>,
    /// What went wrong.
    pub error: DecodeError,
}

/// Little-endian cursor over a byte buffer.
#[derive(Debug)]
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn has_remaining(&self) -> bool {
        self.pos < self.buf.len()
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: N,
            })?;
        let mut out = [0_u8; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Ok(out)
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        self.take::<4>().map(i32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, DecodeError> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    fn f32(&mut self) -> Result<f32, DecodeError> {
        self.take::<4>().map(f32::from_le_bytes)
    }

    fn id(&mut self) -> Result<NodeId, DecodeError> {
        let offset = self.pos;
        let id = self.i32()?;
        u32::try_from(id)
            .map(NodeId)
            .map_err(|_| DecodeError::NegativeId { offset, id })
    }

    fn count(&mut self) -> Result<usize, DecodeError> {
        let offset = self.pos;
        let count = self.i32()?;
        usize::try_from(count).map_err(|_| DecodeError::NegativeCount { offset, count })
    }

    fn string<S: AsRef<str>>(&mut self, strings: &[S]) -> Result<Option<String>, DecodeError> {
        let index = self.i32()?;
        if index == ABSENT_STRING {
            return Ok(None);
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| strings.get(i))
            .map(|s| Some(s.as_ref().to_string()))
            .ok_or(DecodeError::StringIndexOutOfRange {
                index,
                len: strings.len(),
            })
    }

    fn attributes<A: AsRef<[u8]>>(
        &mut self,
        args: &[A],
    ) -> Result<Vec<StringAttribute>, DecodeError> {
        let count = self.i32()?;
        if count == -1 {
            return Ok(Vec::new());
        }
        let offset = self.pos - 4;
        let count =
            usize::try_from(count).map_err(|_| DecodeError::NegativeCount { offset, count })?;
        let mut out = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let start = self.i32()?;
            let end = self.i32()?;
            let kind = match self.i32()? {
                ATTRIBUTE_SPELL_OUT => {
                    // Reserved payload.
                    self.i32()?;
                    StringAttributeKind::SpellOut
                }
                ATTRIBUTE_LOCALE => {
                    let index = self.i32()?;
                    let slot = usize::try_from(index)
                        .ok()
                        .filter(|&i| i < args.len())
                        .ok_or(DecodeError::AttributeArgOutOfRange {
                            index,
                            len: args.len(),
                        })?;
                    let locale = core::str::from_utf8(args[slot].as_ref())
                        .map_err(|_| DecodeError::InvalidUtf8 { index: slot })?;
                    StringAttributeKind::Locale(locale.to_string())
                }
                kind => return Err(DecodeError::UnknownAttributeKind { kind }),
            };
            out.push(StringAttribute { start, end, kind });
        }
        Ok(out)
    }

    fn attributed<S: AsRef<str>, A: AsRef<[u8]>>(
        &mut self,
        strings: &[S],
        args: &[A],
    ) -> Result<AttributedString, DecodeError> {
        let text = self.string(strings)?;
        let attributes = self.attributes(args)?;
        Ok(AttributedString { text, attributes })
    }

    fn matrix(&mut self) -> Result<Matrix4, DecodeError> {
        let mut m = [0.0; 16];
        for v in &mut m {
            *v = f64::from(self.f32()?);
        }
        Ok(Matrix4(m))
    }

    fn id_list(&mut self) -> Result<ChildList, DecodeError> {
        let count = self.count()?;
        let mut out = ChildList::with_capacity(count.min(64));
        for _ in 0..count {
            out.push(self.id()?);
        }
        Ok(out)
    }
}

fn decode_node<S: AsRef<str>, A: AsRef<[u8]>>(
    r: &mut Reader<'_>,
    strings: &[S],
    args: &[A],
) -> Result<NodeRecord, DecodeError> {
    let id = r.id()?;
    let flags = SemanticsFlags::from_bits_retain(r.u64()?);
    let actions = SemanticsActions::from_bits_retain(r.i32()? as u32);
    let max_value_length = r.i32()?;
    let current_value_length = r.i32()?;
    let text_selection_base = r.i32()?;
    let text_selection_extent = r.i32()?;
    let platform_view_id = r.i32()?;
    let scroll_child_count = r.i32()?;
    let scroll_index = r.i32()?;
    let scroll_parent = r.i32()?;
    let scroll = ScrollMetrics {
        position: r.f32()?,
        extent_max: r.f32()?,
        extent_min: r.f32()?,
    };
    let identifier = r.string(strings)?;
    let label = r.attributed(strings, args)?;
    let value = r.attributed(strings, args)?;
    let increased_value = r.attributed(strings, args)?;
    let decreased_value = r.attributed(strings, args)?;
    let hint = r.attributed(strings, args)?;
    let tooltip = r.string(strings)?;
    let link_url = r.string(strings)?;
    let locale = r.string(strings)?;
    let heading_level = r.i32()?;
    let text_direction = TextDirection::from_wire(r.i32()?);
    let left = f64::from(r.f32()?);
    let top = f64::from(r.f32()?);
    let right = f64::from(r.f32()?);
    let bottom = f64::from(r.f32()?);
    let transform = r.matrix()?;
    let hit_test_transform = r.matrix()?;
    let children_in_traversal_order = r.id_list()?;
    let children_in_hit_test_order = r.id_list()?;
    let action_count = r.count()?;
    let mut custom_actions = smallvec::SmallVec::with_capacity(action_count.min(16));
    for _ in 0..action_count {
        custom_actions.push(r.i32()?);
    }

    Ok(NodeRecord {
        id,
        data: NodeData {
            flags,
            actions,
            max_value_length,
            current_value_length,
            text_selection_base,
            text_selection_extent,
            platform_view_id,
            scroll_child_count,
            scroll_index,
            scroll_parent,
            scroll,
            identifier,
            label,
            value,
            increased_value,
            decreased_value,
            hint,
            tooltip,
            link_url,
            locale,
            heading_level,
            text_direction,
            rect: Rect::new(left, top, right, bottom),
            transform,
            hit_test_transform,
            children_in_traversal_order,
            children_in_hit_test_order,
            custom_actions,
        },
    })
}

/// Decode a node update buffer.
///
/// On error, the records decoded before the malformed one are returned with it.
pub fn decode_update<S: AsRef<str>, A: AsRef<[u8]>>(
    buffer: &[u8],
    strings: &[S],
    attribute_args: &[A],
) -> Result<Vec<NodeRecord>, PartialDecode<NodeRecord>> {
    let mut r = Reader::new(buffer);
    let mut records = Vec::new();
    while r.has_remaining() {
        match decode_node(&mut r, strings, attribute_args) {
            Ok(record) => records.push(record),
            Err(error) => return Err(PartialDecode { records, error }),
        }
    }
    Ok(records)
}

fn decode_action<S: AsRef<str>>(
    r: &mut Reader<'_>,
    strings: &[S],
) -> Result<CustomAction, DecodeError> {
    Ok(CustomAction {
        id: r.i32()?,
        override_id: r.i32()?,
        label: r.string(strings)?,
        hint: r.string(strings)?,
    })
}

/// Decode a custom action buffer.
pub fn decode_custom_actions<S: AsRef<str>>(
    buffer: &[u8],
    strings: &[S],
) -> Result<Vec<CustomAction>, PartialDecode<CustomAction>> {
    let mut r = Reader::new(buffer);
    let mut records = Vec::new();
    while r.has_remaining() {
        match decode_action(&mut r, strings) {
            Ok(action) => records.push(action),
            Err(error) => return Err(PartialDecode { records, error }),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{CustomActionEncoder, UpdateEncoder};
    use alloc::vec;

    #[test]
    fn round_trips_a_full_record() {
        let mut data = NodeData {
            flags: SemanticsFlags::IS_TEXT_FIELD | SemanticsFlags::IS_FOCUSED,
            actions: SemanticsActions::TAP | SemanticsActions::SET_TEXT,
            text_selection_base: 1,
            text_selection_extent: 3,
            label: AttributedString::plain("Name"),
            value: AttributedString {
                text: Some("hello".into()),
                attributes: vec![StringAttribute {
                    start: 0,
                    end: 5,
                    kind: StringAttributeKind::Locale("fr-FR".into()),
                }],
            },
            hint: AttributedString {
                text: Some("ABC".into()),
                attributes: vec![StringAttribute {
                    start: 0,
                    end: 3,
                    kind: StringAttributeKind::SpellOut,
                }],
            },
            tooltip: Some("tip".into()),
            text_direction: TextDirection::Rtl,
            rect: Rect::new(0.0, 0.0, 100.0, 40.0),
            transform: Matrix4::translate(5.0, 6.0),
            ..NodeData::default()
        };
        data.children_in_traversal_order.extend([NodeId(2), NodeId(3)]);
        data.children_in_hit_test_order.extend([NodeId(3), NodeId(2)]);
        data.custom_actions.push(7);

        let mut enc = UpdateEncoder::new();
        enc.push(NodeId(1), &data);
        let update = enc.finish();

        let records = decode_update(&update.buffer, &update.strings, &update.attribute_args)
            .expect("well-formed buffer");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, NodeId(1));
        assert_eq!(records[0].data, data);
    }

    #[derive(Default)]
    struct Bytes(Vec<u8>);

    impl Bytes {
        fn i32(&mut self, v: i32) -> &mut Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn f32s(&mut self, vs: &[f32]) -> &mut Self {
            for v in vs {
                self.0.extend_from_slice(&v.to_le_bytes());
            }
            self
        }
    }

    #[test]
    fn decodes_fields_in_wire_order() {
        let identity = [
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let mut b = Bytes::default();
        b.i32(9);
        b.0.extend_from_slice(&((1_u64 << 4) | (1_u64 << 5)).to_le_bytes());
        b.i32(1 << 21) // actions
            .i32(11) // max value length
            .i32(12) // current value length
            .i32(13) // selection base
            .i32(14) // selection extent
            .i32(15) // platform view
            .i32(16) // scroll child count
            .i32(17) // scroll index
            .i32(18) // scroll parent
            .f32s(&[1.5, 2.5, 3.5])
            .i32(0) // identifier
            .i32(1)
            .i32(1) // label, one run
            .i32(0)
            .i32(2)
            .i32(ATTRIBUTE_LOCALE)
            .i32(0)
            .i32(2)
            .i32(-1) // value
            .i32(ABSENT_STRING)
            .i32(-1) // increased value
            .i32(ABSENT_STRING)
            .i32(-1) // decreased value
            .i32(3)
            .i32(1) // hint, one run
            .i32(1)
            .i32(3)
            .i32(ATTRIBUTE_SPELL_OUT)
            .i32(0)
            .i32(4) // tooltip
            .i32(5) // link url
            .i32(6) // locale
            .i32(2) // heading level
            .i32(1) // rtl
            .f32s(&[1.0, 2.0, 30.0, 40.0])
            .f32s(&identity)
            .f32s(&identity)
            .i32(1)
            .i32(20)
            .i32(2)
            .i32(21)
            .i32(20)
            .i32(1)
            .i32(99);
        let strings = ["id", "label", "value", "hint", "tooltip", "https://x", "de-DE"];
        let args: [&[u8]; 1] = [b"fr-FR"];

        let records = decode_update(&b.0, &strings, &args).expect("well-formed buffer");
        assert_eq!(records.len(), 1);
        let (id, d) = (records[0].id, &records[0].data);
        assert_eq!(id, NodeId(9));
        assert_eq!(
            d.flags,
            SemanticsFlags::IS_TEXT_FIELD | SemanticsFlags::IS_FOCUSED
        );
        assert_eq!(d.actions, SemanticsActions::SET_TEXT);
        assert_eq!(
            [
                d.max_value_length,
                d.current_value_length,
                d.text_selection_base,
                d.text_selection_extent,
                d.platform_view_id,
                d.scroll_child_count,
                d.scroll_index,
                d.scroll_parent,
            ],
            [11, 12, 13, 14, 15, 16, 17, 18]
        );
        assert_eq!(
            (d.scroll.position, d.scroll.extent_max, d.scroll.extent_min),
            (1.5, 2.5, 3.5)
        );
        assert_eq!(d.identifier.as_deref(), Some("id"));
        assert_eq!(d.label.as_str(), Some("label"));
        assert_eq!(
            d.label.attributes,
            vec![StringAttribute {
                start: 0,
                end: 2,
                kind: StringAttributeKind::Locale("fr-FR".into()),
            }]
        );
        assert_eq!(d.value.as_str(), Some("value"));
        assert_eq!(d.increased_value.text, None);
        assert_eq!(d.decreased_value.text, None);
        assert_eq!(d.hint.as_str(), Some("hint"));
        assert_eq!(d.hint.attributes[0].kind, StringAttributeKind::SpellOut);
        assert_eq!(d.tooltip.as_deref(), Some("tooltip"));
        assert_eq!(d.link_url.as_deref(), Some("https://x"));
        assert_eq!(d.locale.as_deref(), Some("de-DE"));
        assert_eq!(d.heading_level, 2);
        assert_eq!(d.text_direction, TextDirection::Rtl);
        assert_eq!(d.rect, Rect::new(1.0, 2.0, 30.0, 40.0));
        assert_eq!(d.transform, Matrix4::IDENTITY);
        assert_eq!(d.children_in_traversal_order.as_slice(), &[NodeId(20)]);
        assert_eq!(
            d.children_in_hit_test_order.as_slice(),
            &[NodeId(21), NodeId(20)]
        );
        assert_eq!(d.custom_actions.as_slice(), &[99]);
    }

    #[test]
    fn absent_strings_do_not_touch_the_table() {
        let mut enc = UpdateEncoder::new();
        enc.push(NodeId(0), &NodeData::default());
        let update = enc.finish();
        assert!(update.strings.is_empty());
        let empty: [&str; 0] = [];
        let no_args: [&[u8]; 0] = [];
        let records = decode_update(&update.buffer, &empty, &no_args).unwrap();
        assert_eq!(records[0].data.label.text, None);
    }

    #[test]
    fn truncated_buffer_keeps_complete_records() {
        let mut enc = UpdateEncoder::new();
        enc.push(NodeId(0), &NodeData::default());
        enc.push(NodeId(1), &NodeData::default());
        let update = enc.finish();
        let cut = &update.buffer[..update.buffer.len() - 3];
        let err = decode_update(cut, &update.strings, &update.attribute_args).unwrap_err();
        assert_eq!(err.records.len(), 1);
        assert!(matches!(err.error, DecodeError::UnexpectedEof { .. }));
    }

    #[test]
    fn string_index_out_of_range_is_reported() {
        let mut enc = UpdateEncoder::new();
        enc.push(NodeId(0), &NodeData {
            label: AttributedString::plain("x"),
            ..NodeData::default()
        });
        let update = enc.finish();
        let empty: [&str; 0] = [];
        let err = decode_update(&update.buffer, &empty, &update.attribute_args).unwrap_err();
        assert_eq!(
            err.error,
            DecodeError::StringIndexOutOfRange { index: 0, len: 0 }
        );
    }

    #[test]
    fn negative_id_is_rejected() {
        let buffer = (-5_i32).to_le_bytes();
        let empty: [&str; 0] = [];
        let no_args: [&[u8]; 0] = [];
        let err = decode_update(&buffer, &empty, &no_args).unwrap_err();
        assert_eq!(err.error, DecodeError::NegativeId { offset: 0, id: -5 });
    }

    #[test]
    fn custom_actions_decode_in_order() {
        let mut enc = CustomActionEncoder::new();
        enc.push(&CustomAction {
            id: 3,
            override_id: -1,
            label: Some("Archive".into()),
            hint: None,
        });
        enc.push(&CustomAction {
            id: 4,
            override_id: 1,
            label: Some("Open".into()),
            hint: Some("opens the message".into()),
        });
        let (buffer, strings) = enc.finish();
        let actions = decode_custom_actions(&buffer, &strings).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].label.as_deref(), Some("Archive"));
        assert_eq!(actions[1].overrides(), Some(SemanticsActions::TAP));
    }
}
