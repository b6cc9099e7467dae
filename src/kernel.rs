// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API tying trees to an engine

use crate::ast::{CacheGraph, CacheStats, Geometry2D, Geometry3D};
use crate::engine::{Bounds2, Bounds3, GeometryEngine, LocalEngine, MeshFormat};
use crate::error::{Error, Result};
use crate::scad::OpenScadEngine;
use crate::shapes;
use crate::vector::{Vector2D, Vector3D};
use std::path::Path;
use tracing::debug;

/// Margin added around the extent of sliced geometry
const SLICE_MARGIN: f64 = 1.0;

/// Main kernel: extent queries, viewing, mesh files and slicing
pub struct Kernel<E = OpenScadEngine> {
    engine: E,
}

impl Kernel<OpenScadEngine> {
    /// Kernel on OpenSCAD configured from `polyframe-csg.toml` and the
    /// environment
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(OpenScadEngine::from_env()?))
    }
}

impl Kernel<LocalEngine> {
    /// Kernel that answers extent queries in process
    pub fn local() -> Self {
        Self::new(LocalEngine::new())
    }
}

impl<E: GeometryEngine> Kernel<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn bounds_2d(&self, geometry: &Geometry2D) -> Result<Bounds2> {
        geometry.bounds(&self.engine)
    }

    pub fn bounds_3d(&self, geometry: &Geometry3D) -> Result<Bounds3> {
        geometry.bounds(&self.engine)
    }

    pub fn min_2d(&self, geometry: &Geometry2D) -> Result<Vector2D> {
        geometry.min(&self.engine)
    }

    pub fn max_2d(&self, geometry: &Geometry2D) -> Result<Vector2D> {
        geometry.max(&self.engine)
    }

    pub fn min_3d(&self, geometry: &Geometry3D) -> Result<Vector3D> {
        geometry.min(&self.engine)
    }

    pub fn max_3d(&self, geometry: &Geometry3D) -> Result<Vector3D> {
        geometry.max(&self.engine)
    }

    /// Write a renderable artifact for the numbered window
    pub fn view_2d(&self, geometry: &Geometry2D, window: u32) -> Result<()> {
        Ok(self.engine.view_2d(geometry, window)?)
    }

    pub fn view_3d(&self, geometry: &Geometry3D, window: u32) -> Result<()> {
        Ok(self.engine.view_3d(geometry, window)?)
    }

    pub fn save_stl(&self, geometry: &Geometry3D, path: impl AsRef<Path>) -> Result<()> {
        debug!(path = ?path.as_ref(), "saving STL");
        Ok(self.engine.export(geometry, path.as_ref(), MeshFormat::Stl)?)
    }

    pub fn save_3mf(&self, geometry: &Geometry3D, path: impl AsRef<Path>) -> Result<()> {
        debug!(path = ?path.as_ref(), "saving 3MF");
        Ok(self.engine.export(geometry, path.as_ref(), MeshFormat::ThreeMf)?)
    }

    pub fn load_stl(&self, path: impl AsRef<Path>) -> Result<Geometry3D> {
        Ok(self.engine.import(path.as_ref(), MeshFormat::Stl)?)
    }

    pub fn load_3mf(&self, path: impl AsRef<Path>) -> Result<Geometry3D> {
        Ok(self.engine.import(path.as_ref(), MeshFormat::ThreeMf)?)
    }

    /// Part of `geometry` with `min <= x <= max`
    pub fn slice_x(&self, min: f64, max: f64, geometry: &Geometry3D) -> Result<Geometry3D> {
        self.slice(0, min, max, geometry)
    }

    /// Part of `geometry` with `min <= y <= max`
    pub fn slice_y(&self, min: f64, max: f64, geometry: &Geometry3D) -> Result<Geometry3D> {
        self.slice(1, min, max, geometry)
    }

    /// Part of `geometry` with `min <= z <= max`
    pub fn slice_z(&self, min: f64, max: f64, geometry: &Geometry3D) -> Result<Geometry3D> {
        self.slice(2, min, max, geometry)
    }

    fn slice(&self, axis: usize, min: f64, max: f64, geometry: &Geometry3D) -> Result<Geometry3D> {
        if !(min < max) {
            return Err(Error::invalid(
                "min",
                format!("slice range must be increasing, got {min}..{max}"),
            ));
        }
        let extent = self.bounds_3d(geometry)?.expanded(SLICE_MARGIN);
        let (mut lo, mut hi) = (extent.min, extent.max);
        lo[axis] = min;
        hi[axis] = max;
        let cutter = shapes::box_corners(&lo, &hi)?;
        Ok(geometry.intersection_with(&cutter))
    }

    /// Cache usage of a 3D tree
    pub fn cache_stats(&self, geometry: &Geometry3D) -> CacheStats {
        CacheGraph::from_3d(geometry).stats()
    }
}

impl Default for Kernel<OpenScadEngine> {
    fn default() -> Self {
        Self::new(OpenScadEngine::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::vector3d;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_bounds() {
        let kernel = Kernel::local();
        let cube = shapes::box3d(10.0, 10.0, 10.0, false).unwrap();

        assert_eq!(kernel.min_3d(&cube).unwrap(), vector3d(-5.0, -5.0, 0.0));
        assert_eq!(kernel.max_3d(&cube).unwrap(), vector3d(5.0, 5.0, 10.0));
    }

    #[test]
    fn test_slice_limits_one_axis() {
        let kernel = Kernel::local();
        let cube = shapes::box3d(10.0, 10.0, 10.0, false).unwrap();
        let slab = kernel.slice_z(2.0, 3.0, &cube).unwrap();
        let b = kernel.bounds_3d(&slab).unwrap();

        assert_relative_eq!(b.min.z, 2.0, epsilon = 1e-9);
        assert_relative_eq!(b.max.z, 3.0, epsilon = 1e-9);
        assert_relative_eq!(b.min.x, -5.0, epsilon = 1e-9);
        assert_relative_eq!(b.max.y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slice_rejects_empty_range() {
        let kernel = Kernel::local();
        let cube = shapes::box3d(1.0, 1.0, 1.0, true).unwrap();
        assert!(matches!(
            kernel.slice_x(2.0, 1.0, &cube),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_engine_errors_surface_as_engine_category() {
        let kernel = Kernel::local();
        let cube = shapes::box3d(1.0, 1.0, 1.0, true).unwrap();
        let err = kernel.save_stl(&cube, "unused.stl").unwrap_err();
        assert!(err.is_engine_error());

        let err = kernel.load_stl("/nonexistent/part.stl").unwrap_err();
        assert!(err.is_engine_error());
    }
}
