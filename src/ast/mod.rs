// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry expression tree
//!
//! Nodes are immutable and shared through reference-counted handles, so a
//! subtree can appear under many parents. Every combinator returns a new node
//! and leaves its inputs untouched. The only state written after construction
//! is the memoized bounding box of each node.

mod cache_graph;
mod node;
mod ops;

pub use cache_graph::{CacheGraph, CacheStats};
pub use node::{
    BooleanOp, Geometry2D, Geometry2DKind, Geometry3D, Geometry3DKind, LinearExtrude, Modifiers,
    NodeId, NodeRef, Offset, BASELINE_RATIO, GLYPH_ADVANCE, GLYPH_HEIGHT, TEXT_SIZE,
};
