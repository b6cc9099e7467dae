// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry engine boundary
//!
//! The modeling core only builds trees. Anything that needs the resolved
//! geometry (extents, rendering, mesh files) is delegated to a
//! [`GeometryEngine`].

mod bbox;
mod local;

pub use bbox::{Bounds2, Bounds3};
pub use local::LocalEngine;
pub(crate) use local::read_stl_points;

use crate::ast::{Geometry2D, Geometry3D};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Interchange mesh formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshFormat {
    Stl,
    ThreeMf,
}

impl MeshFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::ThreeMf => "3mf",
        }
    }

    /// Format implied by the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(MeshFormat::Stl),
            "3mf" => Some(MeshFormat::ThreeMf),
            _ => None,
        }
    }
}

/// Evaluator of finished geometry trees
///
/// Every call receives a root whose descendants are fully built. Cached units
/// inside the tree should be evaluated at most once per engine.
pub trait GeometryEngine: Send + Sync {
    /// Extent of a resolved 2D tree
    fn bounds_2d(&self, geometry: &Geometry2D) -> Result<Bounds2, EngineError>;

    /// Extent of a resolved 3D tree
    fn bounds_3d(&self, geometry: &Geometry3D) -> Result<Bounds3, EngineError>;

    /// Write a renderable artifact for the numbered window
    fn view_2d(&self, geometry: &Geometry2D, window: u32) -> Result<(), EngineError>;

    fn view_3d(&self, geometry: &Geometry3D, window: u32) -> Result<(), EngineError>;

    /// Write the mesh of a 3D tree to `path`
    fn export(
        &self,
        geometry: &Geometry3D,
        path: &Path,
        format: MeshFormat,
    ) -> Result<(), EngineError>;

    /// Leaf node for a mesh file; the mesh is read when the tree is evaluated
    fn import(&self, path: &Path, format: MeshFormat) -> Result<Geometry3D, EngineError> {
        if !path.is_file() {
            return Err(EngineError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "mesh file not found"),
            ));
        }
        Ok(Geometry3D::imported(path, format))
    }
}
