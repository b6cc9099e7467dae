// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cached-unit graph of an expression tree

use super::node::{Geometry2D, Geometry3D, NodeId, NodeRef};
use ahash::{AHashMap, AHashSet};

/// Cached units reachable from a root, with nesting and reference counts
///
/// Units are listed in dependency order: a unit appears after every unit its
/// body refers to.
#[derive(Debug, Clone, Default)]
pub struct CacheGraph {
    order: Vec<NodeId>,
    /// Units referenced directly by each unit body
    nested: AHashMap<NodeId, Vec<NodeId>>,
    /// Reference sites per unit
    references: AHashMap<NodeId, usize>,
    /// Nodes in the expanded program, counting each unit body once
    expanded_nodes: usize,
}

impl CacheGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_2d(root: &Geometry2D) -> Self {
        Self::from_node(NodeRef::Planar(root))
    }

    pub fn from_3d(root: &Geometry3D) -> Self {
        Self::from_node(NodeRef::Solid(root))
    }

    pub fn from_node(root: NodeRef<'_>) -> Self {
        let mut graph = Self::new();
        let mut seen = AHashSet::new();
        graph.visit(root, None, &mut seen);
        graph
    }

    fn visit(&mut self, node: NodeRef<'_>, owner: Option<NodeId>, seen: &mut AHashSet<NodeId>) {
        self.expanded_nodes += 1;

        if !node.is_cached() {
            for child in node.children() {
                self.visit(child, owner, seen);
            }
            return;
        }

        let id = node.id();
        *self.references.entry(id).or_insert(0) += 1;
        if let Some(owner) = owner {
            let nested = self.nested.entry(owner).or_default();
            if !nested.contains(&id) {
                nested.push(id);
            }
        }

        if seen.insert(id) {
            self.nested.entry(id).or_default();
            for child in node.children() {
                self.visit(child, Some(id), seen);
            }
            self.order.push(id);
        }
    }

    /// Units in dependency order
    pub fn units(&self) -> &[NodeId] {
        &self.order
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nested.contains_key(&id)
    }

    /// Number of places that refer to the unit
    pub fn references(&self, id: NodeId) -> usize {
        self.references.get(&id).copied().unwrap_or(0)
    }

    /// Units referenced directly from the body of `id`
    pub fn nested_units(&self, id: NodeId) -> &[NodeId] {
        self.nested.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            units: self.order.len(),
            references: self.references.values().sum(),
            expanded_nodes: self.expanded_nodes,
        }
    }
}

/// Summary of cache usage in a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub units: usize,
    pub references: usize,
    pub expanded_nodes: usize,
}

impl CacheStats {
    /// Percentage of unit references served by an already materialized unit
    pub fn reuse_rate(&self) -> f32 {
        if self.references == 0 {
            0.0
        } else {
            ((self.references - self.units) as f32 / self.references as f32) * 100.0
        }
    }
}
