// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborators the bridge consumes but does not own.

use alloc::string::String;
use kurbo::{Point, Rect};

use crate::actions::{HostAction, HostActionArgs};
use crate::descriptor::NodeDescriptor;

/// Accessibility provider for foreign content embedded in the semantics tree.
///
/// Foreign content (a native view hosted by a semantics node) exposes its own
/// accessibility nodes under virtual ids at or above
/// [`BridgeConfig::min_foreign_id`](crate::BridgeConfig::min_foreign_id). The
/// embedder allocates those ids; the bridge forwards them untouched.
pub trait ForeignContentEmbedder {
    /// Describe a foreign node.
    fn node_info(&self, virtual_id: u32) -> Option<NodeDescriptor>;

    /// Describe the root of the foreign content hosted by `host_node`, which
    /// shows platform view `platform_view_id` within `bounds`.
    fn root_node_info(
        &self,
        platform_view_id: i32,
        host_node: u32,
        bounds: Rect,
    ) -> Option<NodeDescriptor>;

    /// Perform a host action on a foreign node.
    fn perform_action(&mut self, virtual_id: u32, action: HostAction, args: &HostActionArgs)
    -> bool;

    /// Forward a hover over `host_node` to the content it hosts.
    fn on_hover(&mut self, host_node: u32, point: Point) -> bool;

    /// The platform view a foreign node belongs to.
    fn platform_view_of(&self, virtual_id: u32) -> Option<i32>;
}

/// Embedder for hosts without foreign content.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoForeignContent;

impl ForeignContentEmbedder for NoForeignContent {
    fn node_info(&self, _: u32) -> Option<NodeDescriptor> {
        None
    }

    fn root_node_info(&self, _: i32, _: u32, _: Rect) -> Option<NodeDescriptor> {
        None
    }

    fn perform_action(&mut self, _: u32, _: HostAction, _: &HostActionArgs) -> bool {
        false
    }

    fn on_hover(&mut self, _: u32, _: Point) -> bool {
        false
    }

    fn platform_view_of(&self, _: u32) -> Option<i32> {
        None
    }
}

/// Source of the locale used for nodes that do not declare one.
pub trait LocaleProvider {
    /// The host's default locale as a BCP 47 tag.
    fn default_locale(&self) -> Option<String>;
}

/// A fixed default locale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedLocale(pub Option<String>);

impl LocaleProvider for FixedLocale {
    fn default_locale(&self) -> Option<String> {
        self.0.clone()
    }
}
