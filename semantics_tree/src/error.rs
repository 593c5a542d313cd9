// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while decoding engine update buffers.

use thiserror::Error;

/// A malformed update buffer.
///
/// Offsets are byte positions in the buffer being decoded.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended in the middle of a record.
    #[error("buffer ended at byte {offset}, {needed} more bytes needed")]
    UnexpectedEof {
        /// Where the read started.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
    },
    /// A node identifier was negative.
    #[error("negative node id {id} at byte {offset}")]
    NegativeId {
        /// Where the identifier was read.
        offset: usize,
        /// The offending value.
        id: i32,
    },
    /// A list length was negative.
    #[error("negative count {count} at byte {offset}")]
    NegativeCount {
        /// Where the count was read.
        offset: usize,
        /// The offending value.
        count: i32,
    },
    /// A string reference pointed past the end of the string table.
    #[error("string index {index} out of range for table of {len}")]
    StringIndexOutOfRange {
        /// The offending index.
        index: i32,
        /// Size of the string table.
        len: usize,
    },
    /// A locale attribute pointed past the end of the argument table.
    #[error("attribute argument {index} out of range for table of {len}")]
    AttributeArgOutOfRange {
        /// The offending index.
        index: i32,
        /// Size of the argument table.
        len: usize,
    },
    /// A locale attribute argument was not UTF-8.
    #[error("attribute argument {index} is not valid UTF-8")]
    InvalidUtf8 {
        /// Index into the argument table.
        index: usize,
    },
    /// An attribute run had an unknown type tag.
    #[error("unknown string attribute kind {kind}")]
    UnknownAttributeKind {
        /// The offending tag.
        kind: i32,
    },
}
