// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Local prediction of cursor movement.
//!
//! A host expects the selection of a text field to move as soon as it asks for
//! it, long before the engine answers with an update. The prediction below is
//! made against the cached value; the engine's update overwrites it later.
//!
//! Selection indices count Unicode scalar values.

use unicode_segmentation::UnicodeSegmentation;

use crate::actions::Granularity;

/// A text selection, as anchor and focus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Anchor.
    pub base: i32,
    /// Focus; the end that moves.
    pub extent: i32,
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

fn to_index(chars: usize) -> i32 {
    i32::try_from(chars).unwrap_or(i32::MAX)
}

fn is_word(segment: &str) -> bool {
    segment.chars().any(char::is_alphabetic)
}

/// New focus position, in characters, after one step from `extent`.
fn step(text: &str, extent: usize, granularity: Granularity, forward: bool) -> usize {
    let len = char_count(text);
    let at = byte_offset(text, extent);
    let (before, after) = text.split_at(at);
    match (granularity, forward) {
        (Granularity::Character, true) => after
            .graphemes(true)
            .next()
            .map_or(extent, |g| extent + char_count(g)),
        (Granularity::Character, false) => before
            .graphemes(true)
            .next_back()
            .map_or(extent, |g| extent - char_count(g)),
        (Granularity::Word, true) => after
            .split_word_bound_indices()
            .find(|(_, segment)| is_word(segment))
            .map_or(len, |(i, segment)| char_count(&text[..at + i + segment.len()])),
        (Granularity::Word, false) => before
            .split_word_bound_indices()
            .rev()
            .find(|(_, segment)| is_word(segment))
            .map_or(extent, |(i, _)| char_count(&before[..i])),
        // A newline right at the cursor ends the line the cursor just left.
        (Granularity::Line, true) => after
            .chars()
            .enumerate()
            .skip(1)
            .find(|&(_, c)| c == '\n')
            .map_or(len, |(i, _)| extent + i),
        (Granularity::Line, false) => before
            .chars()
            .enumerate()
            .filter(|&(_, c)| c == '\n')
            .last()
            .map_or(0, |(i, _)| i),
        (Granularity::Paragraph | Granularity::Page, true) => len,
        (Granularity::Paragraph | Granularity::Page, false) => 0,
    }
}

/// Predict the selection after a cursor movement request.
///
/// Returns `None` when `current` is not a valid selection (either end is
/// negative). Without `extend_selection`, the selection collapses onto the moved
/// focus.
pub fn predict(
    text: &str,
    current: Selection,
    granularity: Granularity,
    forward: bool,
    extend_selection: bool,
) -> Option<Selection> {
    let extent = usize::try_from(current.extent).ok()?;
    if current.base < 0 {
        return None;
    }
    let extent = to_index(step(text, extent.min(char_count(text)), granularity, forward));
    let base = if extend_selection { current.base } else { extent };
    Some(Selection { base, extent })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caret(at: i32) -> Selection {
        Selection {
            base: at,
            extent: at,
        }
    }

    fn moved(text: &str, at: i32, g: Granularity, forward: bool) -> i32 {
        predict(text, caret(at), g, forward, false)
            .expect("valid selection")
            .extent
    }

    #[test]
    fn character_steps_over_grapheme_clusters() {
        // "e" + combining acute accent is two scalars, one grapheme.
        let text = "ae\u{301}b";
        assert_eq!(moved(text, 1, Granularity::Character, true), 3);
        assert_eq!(moved(text, 3, Granularity::Character, false), 1);
        assert_eq!(moved(text, 4, Granularity::Character, true), 4, "stays at the end");
        assert_eq!(moved(text, 0, Granularity::Character, false), 0);
    }

    #[test]
    fn word_moves_to_word_edges() {
        let text = "hello big world";
        assert_eq!(moved(text, 0, Granularity::Word, true), 5);
        assert_eq!(moved(text, 5, Granularity::Word, true), 9);
        assert_eq!(moved(text, 7, Granularity::Word, true), 9, "mid-word goes to its end");
        assert_eq!(moved(text, 15, Granularity::Word, false), 10);
        assert_eq!(moved(text, 10, Granularity::Word, false), 6);
    }

    #[test]
    fn word_without_letters_hits_the_ends() {
        assert_eq!(moved("12 34", 0, Granularity::Word, true), 5);
        assert_eq!(moved("12 34", 5, Granularity::Word, false), 5, "backward leaves it");
    }

    #[test]
    fn line_moves_between_newlines() {
        let text = "ab\ncd\nef";
        assert_eq!(moved(text, 0, Granularity::Line, true), 2);
        assert_eq!(moved(text, 2, Granularity::Line, true), 5);
        assert_eq!(moved(text, 6, Granularity::Line, true), 8);
        assert_eq!(moved(text, 7, Granularity::Line, false), 5);
        assert_eq!(moved(text, 2, Granularity::Line, false), 0);
    }

    #[test]
    fn paragraph_and_page_jump_to_the_ends() {
        assert_eq!(moved("abc", 1, Granularity::Paragraph, true), 3);
        assert_eq!(moved("abc", 1, Granularity::Page, false), 0);
    }

    #[test]
    fn extending_keeps_the_anchor() {
        let s = predict(
            "hello",
            Selection { base: 1, extent: 2 },
            Granularity::Character,
            true,
            true,
        );
        assert_eq!(s, Some(Selection { base: 1, extent: 3 }));
    }

    #[test]
    fn invalid_selection_is_not_predicted() {
        assert_eq!(
            predict("abc", caret(-1), Granularity::Character, true, false),
            None
        );
        assert_eq!(
            predict(
                "abc",
                Selection { base: -1, extent: 1 },
                Granularity::Word,
                true,
                true
            ),
            None
        );
    }

    #[test]
    fn indices_count_scalars_not_bytes() {
        let text = "héllo wörld";
        assert_eq!(moved(text, 0, Granularity::Word, true), 5);
        assert_eq!(moved(text, 11, Granularity::Word, false), 6);
    }
}
