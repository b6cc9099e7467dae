// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG
//!
//! An immutable, OpenSCAD-style modeling front end. Shapes are built as
//! expression trees from polygons, polyhedra, affine transforms, boolean
//! combinators and extrusions. Repeated subtrees can be cached so that an
//! engine evaluates them once. Evaluation is delegated to a
//! [`GeometryEngine`]: [`LocalEngine`] answers extent queries in process and
//! [`OpenScadEngine`] runs the `openscad` executable for extents, views and
//! mesh export.
//!
//! ```no_run
//! use polyframe_csg::{degrees, shapes, Kernel, Transform3D};
//!
//! # fn main() -> polyframe_csg::Result<()> {
//! let kernel = Kernel::local();
//! let post = shapes::cylinder(2.0, 10.0, 32, false)?.cache();
//! let posts: Vec<_> = (0..8)
//!     .map(|i| Transform3D::rotate_z(degrees(45.0 * f64::from(i))).then_after(&Transform3D::translate_x(20.0)))
//!     .map(|t| t.transform(&post))
//!     .collect();
//! let ring = polyframe_csg::Geometry3D::union(&posts)?;
//! println!("{:?}", kernel.bounds_3d(&ring)?);
//! # Ok(())
//! # }
//! ```

pub mod angle;
pub mod ast;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod kernel;
pub mod scad;
pub mod shapes;
pub mod transform;
pub mod vector;

pub use angle::{degrees, radians, rotations, Angle};
pub use ast::{
    BooleanOp, CacheGraph, CacheStats, Geometry2D, Geometry3D, LinearExtrude, Modifiers, NodeId,
};
pub use color::Color;
pub use config::EngineConfig;
pub use engine::{Bounds2, Bounds3, GeometryEngine, LocalEngine, MeshFormat};
pub use error::{EngineError, Error, Result};
pub use kernel::Kernel;
pub use scad::{OpenScadEngine, ScadProgram};
pub use transform::{Transform2D, Transform3D};
pub use vector::{vector2d, vector3d, Polar2D, Vector2D, Vector3D, VectorExt};
