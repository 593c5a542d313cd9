// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bridge configuration.

/// Tunable constants of the bridge.
///
/// The defaults match what engines and host accessibility services expect; a
/// host should only change them in lockstep with its engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BridgeConfig {
    /// First virtual id handed to foreign content. Ids below it address cached
    /// semantics nodes; ids at or above it belong to the foreign-content embedder.
    pub min_foreign_id: u32,
    /// Offset added to a custom action's id to form its host action id, chosen
    /// so that it cannot collide with the host's built-in action ids.
    pub custom_action_offset: u32,
    /// Scroll range reported for a scrollable with an infinite extent.
    pub scroll_extent_for_infinity: f32,
    /// Largest scroll position reported for a scrollable with an infinite extent.
    pub scroll_position_cap_for_infinity: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            min_foreign_id: 1 << 16,
            custom_action_offset: 267_386_881,
            scroll_extent_for_infinity: 100_000.0,
            scroll_position_cap_for_infinity: 70_000.0,
        }
    }
}

impl BridgeConfig {
    /// Returns true if `virtual_id` belongs to foreign content.
    pub fn is_foreign(&self, virtual_id: u32) -> bool {
        virtual_id >= self.min_foreign_id
    }
}
