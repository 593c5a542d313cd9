// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change synthesis: turning current-vs-previous node state into notifications.

use alloc::string::String;
use alloc::vec::Vec;
use semantics_tree::{NodeId, SemanticsActions, SemanticsFlags, SemanticsNode, SemanticsTree};

use crate::config::BridgeConfig;
use crate::events::{EventKind, ScrollAxis, ScrollItems};

/// Minimal description of an edit between two strings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    /// First differing character.
    pub from_index: usize,
    /// Characters inserted at `from_index`.
    pub added_count: usize,
    /// Characters removed at `from_index`.
    pub removed_count: usize,
}

/// Locate the single edit that turns `before` into `after`.
///
/// Finds the longest common prefix, then the longest common suffix that does not
/// overlap it. Returns `None` when the strings are equal.
pub fn text_edit(before: &str, after: &str) -> Option<TextEdit> {
    let old: Vec<char> = before.chars().collect();
    let new: Vec<char> = after.chars().collect();
    let first = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    if first >= old.len() && first >= new.len() {
        return None;
    }
    let common_suffix = old[first..]
        .iter()
        .rev()
        .zip(new[first..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    Some(TextEdit {
        from_index: first,
        added_count: new.len() - first - common_suffix,
        removed_count: old.len() - first - common_suffix,
    })
}

/// The text-changed notification for an edit, if anything changed.
pub(crate) fn text_changed(before: Option<&str>, after: Option<&str>) -> Option<EventKind> {
    let before = before.unwrap_or_default();
    let after = after.unwrap_or_default();
    let edit = text_edit(before, after)?;
    Some(EventKind::TextChanged {
        before: before.into(),
        text: after.into(),
        from_index: edit.from_index,
        added_count: edit.added_count,
        removed_count: edit.removed_count,
    })
}

/// The selection-changed notification for a node's current value and selection.
pub(crate) fn selection_changed(value: Option<&str>, base: i32, extent: i32) -> EventKind {
    let text: String = value.unwrap_or_default().into();
    EventKind::TextSelectionChanged {
        item_count: text.chars().count(),
        text,
        from_index: base,
        to_index: extent,
    }
}

/// The scroll notification for a node that scrolled in the last update.
///
/// Positions are normalized so that the start of the range is zero. An infinite
/// extent is replaced by a fixed range, with the position capped inside it, so
/// that hosts still see movement in endless lists.
pub(crate) fn scrolled(
    tree: &SemanticsTree,
    node: &SemanticsNode,
    config: &BridgeConfig,
) -> EventKind {
    let scroll = node.data().scroll;
    let mut position = scroll.position;
    let mut max = scroll.extent_max;
    if max.is_infinite() {
        max = config.scroll_extent_for_infinity;
        position = position.min(config.scroll_position_cap_for_infinity);
    }
    if scroll.extent_min.is_infinite() {
        max += config.scroll_extent_for_infinity;
        position = position.max(-config.scroll_position_cap_for_infinity);
        position += config.scroll_extent_for_infinity;
    } else {
        max -= scroll.extent_min;
        position -= scroll.extent_min;
    }

    // The axis comes from what the node could do before it moved.
    let axis = if node.had_action(SemanticsActions::SCROLL_UP)
        || node.had_action(SemanticsActions::SCROLL_DOWN)
    {
        Some(ScrollAxis::Vertical)
    } else if node.had_action(SemanticsActions::SCROLL_LEFT)
        || node.had_action(SemanticsActions::SCROLL_RIGHT)
    {
        Some(ScrollAxis::Horizontal)
    } else {
        None
    };

    let data = node.data();
    let items = (data.scroll_child_count > 0).then(|| {
        let visible = visible_children(tree, &data.children_in_hit_test_order);
        ScrollItems {
            item_count: data.scroll_child_count,
            from_index: data.scroll_index,
            to_index: data.scroll_index.saturating_add(visible).saturating_sub(1),
        }
    });

    EventKind::Scrolled {
        axis,
        position,
        max,
        items,
    }
}

fn visible_children(tree: &SemanticsTree, children: &[NodeId]) -> i32 {
    let count = children
        .iter()
        .filter_map(|&c| tree.get(c))
        .filter(|c| !c.has_flag(SemanticsFlags::IS_HIDDEN))
        .count();
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Returns true if `node` became selected in the last update.
pub(crate) fn became_selected(node: &SemanticsNode) -> bool {
    node.has_flag(SemanticsFlags::IS_SELECTED) && !node.had_flag(SemanticsFlags::IS_SELECTED)
}

/// Returns true if the selection of `node` moved in the last update.
pub(crate) fn selection_moved(node: &SemanticsNode) -> bool {
    node.previous().is_some_and(|p| {
        p.text_selection_base != node.data().text_selection_base
            || p.text_selection_extent != node.data().text_selection_extent
    })
}

/// The route whose name should be announced, given the previous and new route stacks.
///
/// The first route that was not on the previous stack wins; when every route
/// was already there, the top of the new stack does.
pub(crate) fn newest_route(previous: &[NodeId], routes: &[NodeId]) -> Option<NodeId> {
    routes
        .iter()
        .copied()
        .find(|r| !previous.contains(r))
        .or_else(|| routes.last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use semantics_tree::{NodeData, NodeRecord, ScrollMetrics};

    #[test]
    fn appending_one_character() {
        assert_eq!(
            text_edit("cat", "cats"),
            Some(TextEdit {
                from_index: 3,
                added_count: 1,
                removed_count: 0
            })
        );
    }

    #[test]
    fn replacing_in_the_middle() {
        assert_eq!(
            text_edit("hello world", "hello there world"),
            Some(TextEdit {
                from_index: 6,
                added_count: 6,
                removed_count: 0
            })
        );
        assert_eq!(
            text_edit("abcd", "axyd"),
            Some(TextEdit {
                from_index: 1,
                added_count: 2,
                removed_count: 2
            })
        );
    }

    #[test]
    fn repeated_characters_do_not_overlap() {
        // The suffix scan stops at the end of the common prefix.
        assert_eq!(
            text_edit("aa", "aaa"),
            Some(TextEdit {
                from_index: 2,
                added_count: 1,
                removed_count: 0
            })
        );
        assert_eq!(
            text_edit("aaa", ""),
            Some(TextEdit {
                from_index: 0,
                added_count: 0,
                removed_count: 3
            })
        );
    }

    #[test]
    fn equal_strings_have_no_edit() {
        assert_eq!(text_edit("same", "same"), None);
        assert_eq!(text_edit("", ""), None);
        assert_eq!(text_changed(None, Some("")), None);
    }

    #[test]
    fn counts_scalars() {
        assert_eq!(
            text_edit("añb", "añcb"),
            Some(TextEdit {
                from_index: 2,
                added_count: 1,
                removed_count: 0
            })
        );
    }

    #[test]
    fn newest_route_prefers_first_new_route() {
        let (a, b, c) = (NodeId(1), NodeId(2), NodeId(3));
        assert_eq!(newest_route(&[a], &[a, b, c]), Some(b));
        assert_eq!(newest_route(&[a, b], &[a, b]), Some(b));
        assert_eq!(newest_route(&[a, b], &[a]), Some(a));
        assert_eq!(newest_route(&[a], &[]), None);
    }

    fn scrolled_node(
        previous_actions: SemanticsActions,
        scroll: ScrollMetrics,
        child_count: i32,
        index: i32,
        children: &[(u32, bool)],
    ) -> (SemanticsTree, EventKind) {
        let mut tree = SemanticsTree::new();
        let mut data = NodeData {
            actions: previous_actions,
            scroll: ScrollMetrics {
                position: 0.0,
                ..scroll
            },
            scroll_child_count: child_count,
            scroll_index: index,
            ..NodeData::default()
        };
        let mut records = vec![];
        for &(id, hidden) in children {
            data.children_in_hit_test_order.push(NodeId(id));
            data.children_in_traversal_order.push(NodeId(id));
            let flags = if hidden {
                SemanticsFlags::IS_HIDDEN
            } else {
                SemanticsFlags::empty()
            };
            records.push(NodeRecord {
                id: NodeId(id),
                data: NodeData {
                    flags,
                    ..NodeData::default()
                },
            });
        }
        records.push(NodeRecord {
            id: NodeId::ROOT,
            data: data.clone(),
        });
        tree.apply(records);
        data.scroll = scroll;
        data.actions = SemanticsActions::empty();
        tree.apply(vec![NodeRecord {
            id: NodeId::ROOT,
            data,
        }]);
        tree.commit(|_| {});
        let node = tree.root().expect("root exists");
        assert!(node.did_scroll(), "fixture must scroll");
        let event = scrolled(&tree, node, &BridgeConfig::default());
        (tree, event)
    }

    #[test]
    fn scroll_items_count_visible_children() {
        let (_, event) = scrolled_node(
            SemanticsActions::SCROLL_UP,
            ScrollMetrics {
                position: 50.0,
                extent_max: 500.0,
                extent_min: 0.0,
            },
            10,
            2,
            &[(1, false), (2, true), (3, false), (4, false)],
        );
        assert_eq!(
            event,
            EventKind::Scrolled {
                axis: Some(ScrollAxis::Vertical),
                position: 50.0,
                max: 500.0,
                items: Some(ScrollItems {
                    item_count: 10,
                    from_index: 2,
                    to_index: 4
                }),
            }
        );
    }

    #[test]
    fn scroll_indices_saturate_at_the_edges() {
        let scroll = ScrollMetrics {
            position: 5.0,
            extent_max: 100.0,
            extent_min: 0.0,
        };
        let (_, event) = scrolled_node(
            SemanticsActions::SCROLL_UP,
            scroll,
            3,
            i32::MAX,
            &[(1, false), (2, false)],
        );
        assert!(matches!(
            event,
            EventKind::Scrolled {
                items: Some(ScrollItems {
                    from_index: i32::MAX,
                    to_index: i32::MAX,
                    ..
                }),
                ..
            }
        ));
        let (_, event) = scrolled_node(SemanticsActions::SCROLL_UP, scroll, 3, i32::MIN, &[]);
        assert!(matches!(
            event,
            EventKind::Scrolled {
                items: Some(ScrollItems {
                    from_index: i32::MIN,
                    to_index: i32::MIN,
                    ..
                }),
                ..
            }
        ));
    }

    #[test]
    fn infinite_max_extent_is_clamped() {
        let (_, event) = scrolled_node(
            SemanticsActions::SCROLL_LEFT,
            ScrollMetrics {
                position: 80_000.0,
                extent_max: f32::INFINITY,
                extent_min: 0.0,
            },
            0,
            0,
            &[],
        );
        assert_eq!(
            event,
            EventKind::Scrolled {
                axis: Some(ScrollAxis::Horizontal),
                position: 70_000.0,
                max: 100_000.0,
                items: None,
            }
        );
    }

    #[test]
    fn infinite_min_extent_shifts_the_origin() {
        let (_, event) = scrolled_node(
            SemanticsActions::empty(),
            ScrollMetrics {
                position: -90_000.0,
                extent_max: 100.0,
                extent_min: f32::NEG_INFINITY,
            },
            0,
            0,
            &[],
        );
        assert_eq!(
            event,
            EventKind::Scrolled {
                axis: None,
                position: 30_000.0,
                max: 100_100.0,
                items: None,
            }
        );
    }

    #[test]
    fn finite_min_extent_is_subtracted() {
        let (_, event) = scrolled_node(
            SemanticsActions::SCROLL_DOWN,
            ScrollMetrics {
                position: 10.0,
                extent_max: 200.0,
                extent_min: -100.0,
            },
            0,
            0,
            &[],
        );
        assert_eq!(
            event,
            EventKind::Scrolled {
                axis: Some(ScrollAxis::Vertical),
                position: 110.0,
                max: 300.0,
                items: None,
            }
        );
    }
}
