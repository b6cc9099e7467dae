// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry node definitions

use crate::angle::Angle;
use crate::color::Color;
use crate::engine::{Bounds2, Bounds3, MeshFormat};
use crate::transform::{Transform2D, Transform3D};
use crate::vector::{Vector2D, Vector3D};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Unique identifier of a geometry node
pub type NodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Advisory flags attached to a reference to a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    /// Highlight the node when rendering
    pub debug: bool,
    /// Leave the node out of its parent's result
    pub disabled: bool,
}

/// Boolean and combinator operations shared by 2D and 3D nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Intersection,
    /// First child minus the union of the rest
    Difference,
    Hull,
    Minkowski,
}

impl BooleanOp {
    pub fn name(self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Intersection => "intersection",
            BooleanOp::Difference => "difference",
            BooleanOp::Hull => "hull",
            BooleanOp::Minkowski => "minkowski",
        }
    }
}

/// Font size of text leaves
pub const TEXT_SIZE: f64 = 10.0;
/// Advance of one monospaced glyph cell at [`TEXT_SIZE`]
pub const GLYPH_ADVANCE: f64 = 7.5;
/// Height of a glyph cell at [`TEXT_SIZE`]
pub const GLYPH_HEIGHT: f64 = 15.0;
/// Part of the cell height below the baseline
pub const BASELINE_RATIO: f64 = 0.2;

/// Outline offset of a 2D shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Offset {
    /// Straight offset; `chamfer` cuts convex corners instead of extending them
    Delta { delta: f64, chamfer: bool },
    /// Rounded offset approximated with `resolution` segments per full circle
    Round { radius: f64, resolution: u32 },
}

impl Offset {
    /// Signed distance the outline moves
    pub fn distance(&self) -> f64 {
        match *self {
            Offset::Delta { delta, .. } => delta,
            Offset::Round { radius, .. } => radius,
        }
    }
}

/// Parameters of a linear extrusion along +z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearExtrude {
    pub height: f64,
    /// Total rotation of the top face relative to the bottom
    pub twist: Angle,
    /// Scale of the top face relative to the bottom
    pub scale: f64,
    pub slices: u32,
    /// Center the sweep on z = 0 instead of starting there
    pub center: bool,
}

impl LinearExtrude {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            twist: Angle::ZERO,
            scale: 1.0,
            slices: 1,
            center: false,
        }
    }

    pub fn with_twist(mut self, twist: Angle) -> Self {
        self.twist = twist;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_slices(mut self, slices: u32) -> Self {
        self.slices = slices;
        self
    }

    pub fn centered(mut self, center: bool) -> Self {
        self.center = center;
        self
    }
}

/// Shape of a 2D node
#[derive(Debug)]
pub enum Geometry2DKind {
    /// Polygon with optional explicit outlines; without paths the points form
    /// a single outline in order
    Polygon {
        points: Vec<Vector2D>,
        paths: Option<Vec<Vec<usize>>>,
    },
    Transformed {
        transform: Transform2D,
        child: Geometry2D,
    },
    Boolean {
        op: BooleanOp,
        children: Vec<Geometry2D>,
    },
    Offset {
        offset: Offset,
        children: Vec<Geometry2D>,
    },
    /// Shadow of a 3D node on the xy plane, or its z = 0 section when `cut`
    Projection { cut: bool, child: Geometry3D },
    /// Glyphs of `text` at [`TEXT_SIZE`], left aligned on the x axis as
    /// baseline
    Text { text: String, resolution: u32 },
    /// Reusable unit evaluated once by the engine
    Cached(Geometry2D),
}

/// Shape of a 3D node
#[derive(Debug)]
pub enum Geometry3DKind {
    /// Closed polyhedron; faces list vertex indices
    Polyhedron {
        points: Vec<Vector3D>,
        faces: Vec<Vec<usize>>,
    },
    Transformed {
        transform: Transform3D,
        child: Geometry3D,
    },
    Boolean {
        op: BooleanOp,
        children: Vec<Geometry3D>,
    },
    LinearExtrude {
        params: LinearExtrude,
        child: Geometry2D,
    },
    /// Sweep of a profile in the xz half plane x >= 0 around the z axis
    RotateExtrude {
        angle: Angle,
        resolution: u32,
        child: Geometry2D,
    },
    Color { color: Color, child: Geometry3D },
    /// Mesh loaded from a file by the engine
    Imported { path: PathBuf, format: MeshFormat },
    /// Reusable unit evaluated once by the engine
    Cached(Geometry3D),
}

#[derive(Debug)]
pub(crate) struct Node<K, B> {
    pub(crate) id: NodeId,
    pub(crate) kind: K,
    pub(crate) bounds: OnceLock<B>,
}

impl<K, B> Node<K, B> {
    fn new(kind: K) -> Arc<Self> {
        Arc::new(Self {
            id: next_node_id(),
            kind,
            bounds: OnceLock::new(),
        })
    }
}

/// Immutable handle to a 2D node
///
/// Cloning is cheap and shares the node, including its memoized bounds.
#[derive(Debug, Clone)]
pub struct Geometry2D {
    pub(crate) node: Arc<Node<Geometry2DKind, Bounds2>>,
    pub(crate) modifiers: Modifiers,
}

/// Immutable handle to a 3D node
///
/// Cloning is cheap and shares the node, including its memoized bounds.
#[derive(Debug, Clone)]
pub struct Geometry3D {
    pub(crate) node: Arc<Node<Geometry3DKind, Bounds3>>,
    pub(crate) modifiers: Modifiers,
}

macro_rules! handle_accessors {
    ($handle:ident, $kind:ident) => {
        impl $handle {
            pub(crate) fn from_kind(kind: $kind) -> Self {
                Self {
                    node: Node::new(kind),
                    modifiers: Modifiers::default(),
                }
            }

            /// Identity of the underlying node; shared by all handles to it
            pub fn id(&self) -> NodeId {
                self.node.id
            }

            pub fn kind(&self) -> &$kind {
                &self.node.kind
            }

            pub fn modifiers(&self) -> Modifiers {
                self.modifiers
            }

            pub fn is_cached(&self) -> bool {
                matches!(self.node.kind, $kind::Cached(_))
            }

            pub fn is_disabled(&self) -> bool {
                self.modifiers.disabled
            }

            /// True if both handles point at the same node
            pub fn same_node(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.node, &other.node)
            }

            /// Copy of this handle highlighted when rendered
            pub fn debug_mark(&self) -> Self {
                Self {
                    node: Arc::clone(&self.node),
                    modifiers: Modifiers {
                        debug: true,
                        ..self.modifiers
                    },
                }
            }

            /// Copy of this handle that its parent leaves out
            pub fn disable(&self) -> Self {
                Self {
                    node: Arc::clone(&self.node),
                    modifiers: Modifiers {
                        disabled: true,
                        ..self.modifiers
                    },
                }
            }

            /// Handle to the same node without modifiers
            pub(crate) fn plain(&self) -> Self {
                Self {
                    node: Arc::clone(&self.node),
                    modifiers: Modifiers::default(),
                }
            }

            /// Wrap the node as a reusable unit
            ///
            /// Caching a cached node returns it unchanged.
            pub fn cache(&self) -> Self {
                if self.is_cached() {
                    return self.clone();
                }
                Self::from_kind($kind::Cached(self.clone()))
            }
        }
    };
}

handle_accessors!(Geometry2D, Geometry2DKind);
handle_accessors!(Geometry3D, Geometry3DKind);

impl Geometry2D {
    pub(crate) fn transformed(transform: Transform2D, child: &Geometry2D) -> Self {
        Self::from_kind(Geometry2DKind::Transformed {
            transform,
            child: child.clone(),
        })
    }

    /// Memoized bounds, if an engine has computed them
    pub fn cached_bounds(&self) -> Option<Bounds2> {
        self.node.bounds.get().copied()
    }

    /// Child handles in declaration order
    pub fn children(&self) -> Vec<NodeRef<'_>> {
        match &self.node.kind {
            Geometry2DKind::Polygon { .. } | Geometry2DKind::Text { .. } => Vec::new(),
            Geometry2DKind::Transformed { child, .. } | Geometry2DKind::Cached(child) => {
                vec![NodeRef::Planar(child)]
            }
            Geometry2DKind::Boolean { children, .. } | Geometry2DKind::Offset { children, .. } => {
                children.iter().map(NodeRef::Planar).collect()
            }
            Geometry2DKind::Projection { child, .. } => vec![NodeRef::Solid(child)],
        }
    }
}

impl Geometry3D {
    pub(crate) fn transformed(transform: Transform3D, child: &Geometry3D) -> Self {
        Self::from_kind(Geometry3DKind::Transformed {
            transform,
            child: child.clone(),
        })
    }

    /// Memoized bounds, if an engine has computed them
    pub fn cached_bounds(&self) -> Option<Bounds3> {
        self.node.bounds.get().copied()
    }

    /// Child handles in declaration order
    pub fn children(&self) -> Vec<NodeRef<'_>> {
        match &self.node.kind {
            Geometry3DKind::Polyhedron { .. } | Geometry3DKind::Imported { .. } => Vec::new(),
            Geometry3DKind::Transformed { child, .. }
            | Geometry3DKind::Color { child, .. }
            | Geometry3DKind::Cached(child) => vec![NodeRef::Solid(child)],
            Geometry3DKind::Boolean { children, .. } => {
                children.iter().map(NodeRef::Solid).collect()
            }
            Geometry3DKind::LinearExtrude { child, .. }
            | Geometry3DKind::RotateExtrude { child, .. } => vec![NodeRef::Planar(child)],
        }
    }
}

/// Borrowed reference to a node of either dimension
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Planar(&'a Geometry2D),
    Solid(&'a Geometry3D),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            NodeRef::Planar(g) => g.id(),
            NodeRef::Solid(g) => g.id(),
        }
    }

    pub fn is_cached(&self) -> bool {
        match self {
            NodeRef::Planar(g) => g.is_cached(),
            NodeRef::Solid(g) => g.is_cached(),
        }
    }

    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match *self {
            NodeRef::Planar(g) => g.children(),
            NodeRef::Solid(g) => g.children(),
        }
    }
}
