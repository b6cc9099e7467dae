// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! In-process extent evaluator

use super::{Bounds2, Bounds3, GeometryEngine, MeshFormat};
use crate::angle::Angle;
use crate::ast::{
    BooleanOp, Geometry2D, Geometry2DKind, Geometry3D, Geometry3DKind, LinearExtrude, NodeId,
    Offset, BASELINE_RATIO, GLYPH_ADVANCE, GLYPH_HEIGHT,
};
use crate::error::EngineError;
use crate::vector::{Vector2D, Vector3D};
use dashmap::DashMap;
use nalgebra::{Matrix3, Matrix4, Point2, Point3};
use std::f64::consts::SQRT_2;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Engine that computes extents from vertex data without an external tool
///
/// Extents are exact for polygons, polyhedra, transforms, unions, hulls,
/// extrusions and imported meshes. Intersections, differences, Minkowski
/// sums, offsets and sections return a box that contains the true result.
/// Text extents are the glyph cells, one per character.
/// Sharp-cornered offsets grow the box by every possible miter tip, which
/// needs the child's outline; a mitered offset of a clipped outline
/// or of text is unsupported.
/// Each cached unit is resolved once per engine and reused at every
/// reference. Rendering and mesh export need a real geometry kernel and are
/// not supported.
#[derive(Debug, Default)]
pub struct LocalEngine {
    units_2d: DashMap<NodeId, Arc<[Vector2D]>>,
    units_3d: DashMap<NodeId, Arc<[Vector3D]>>,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached units resolved so far
    pub fn evaluated_units(&self) -> usize {
        self.units_2d.len() + self.units_3d.len()
    }

    /// Extreme points of the resolved 2D geometry under `m`
    fn points_2d(&self, g: &Geometry2D, m: &Matrix3<f64>) -> Result<Vec<Vector2D>, EngineError> {
        if g.is_disabled() {
            return Ok(Vec::new());
        }

        match g.kind() {
            Geometry2DKind::Polygon { points, paths } => Ok(match paths {
                None => points.iter().map(|p| apply_2d(m, p)).collect(),
                Some(paths) => paths
                    .iter()
                    .flatten()
                    .filter_map(|&i| points.get(i))
                    .map(|p| apply_2d(m, p))
                    .collect(),
            }),

            Geometry2DKind::Transformed { transform, child } => {
                self.points_2d(child, &(m * transform.to_matrix()))
            }

            Geometry2DKind::Boolean { op, children } => {
                let enabled: Vec<&Geometry2D> =
                    children.iter().filter(|c| !c.is_disabled()).collect();
                match op {
                    BooleanOp::Union | BooleanOp::Hull => {
                        let mut all = Vec::new();
                        for child in enabled {
                            all.extend(self.points_2d(child, m)?);
                        }
                        Ok(all)
                    }
                    BooleanOp::Difference => match enabled.first() {
                        Some(base) => self.points_2d(base, m),
                        None => Ok(Vec::new()),
                    },
                    BooleanOp::Intersection => {
                        let mut overlap: Option<Bounds2> = None;
                        for child in enabled {
                            let b = Bounds2::from_points(&self.points_2d(child, m)?);
                            overlap = Some(match overlap {
                                Some(acc) => acc.intersection(&b),
                                None => b,
                            });
                        }
                        Ok(box_points_2d(overlap, &Matrix3::identity()))
                    }
                    BooleanOp::Minkowski => {
                        let mut sum: Option<Bounds2> = None;
                        for child in enabled {
                            let b = Bounds2::from_points(&self.points_2d(child, &Matrix3::identity())?);
                            sum = Some(match sum {
                                Some(acc) => Bounds2::new(acc.min + b.min, acc.max + b.max),
                                None => b,
                            });
                        }
                        Ok(box_points_2d(sum, m))
                    }
                }
            }

            Geometry2DKind::Offset { offset, children } => {
                let enabled: Vec<&Geometry2D> =
                    children.iter().filter(|c| !c.is_disabled()).collect();
                let mut local = Bounds2::empty();
                for child in &enabled {
                    for p in self.points_2d(child, &Matrix3::identity())? {
                        local.expand_to_include(&p);
                    }
                }
                let grown = match *offset {
                    Offset::Delta {
                        delta,
                        chamfer: false,
                    } if delta > 0.0 => {
                        let mut grown = local.expanded(delta);
                        for child in &enabled {
                            let rings = self
                                .outlines_2d(child, &Matrix3::identity())?
                                .ok_or(EngineError::Unsupported("mitered offset of a derived outline"))?;
                            for tip in miter_tips(&rings, delta) {
                                grown.expand_to_include(&tip);
                            }
                        }
                        grown
                    }
                    Offset::Delta {
                        delta,
                        chamfer: true,
                    } => local.expanded(delta.max(0.0) * SQRT_2),
                    _ => local.expanded(offset.distance().max(0.0)),
                };
                Ok(box_points_2d(Some(grown), m))
            }

            Geometry2DKind::Projection { cut, child } => {
                let solid = self.points_3d(child, &Matrix4::identity())?;
                if *cut {
                    let b = Bounds3::from_points(&solid);
                    if b.is_empty() || b.min.z > 0.0 || b.max.z < 0.0 {
                        return Ok(Vec::new());
                    }
                }
                Ok(solid
                    .iter()
                    .map(|p| apply_2d(m, &Vector2D::new(p.x, p.y)))
                    .collect())
            }

            Geometry2DKind::Text { text, .. } => {
                let cells = text.chars().count();
                if cells == 0 {
                    return Ok(Vec::new());
                }
                // Glyph cells, not the ink extent of the font
                let descent = BASELINE_RATIO * GLYPH_HEIGHT;
                let cell = Bounds2::new(
                    Vector2D::new(0.0, -descent),
                    Vector2D::new(GLYPH_ADVANCE * cells as f64, GLYPH_HEIGHT - descent),
                );
                Ok(box_points_2d(Some(cell), m))
            }

            Geometry2DKind::Cached(body) => {
                let unit = self.unit_points_2d(g.id(), body)?;
                Ok(unit.iter().map(|p| apply_2d(m, p)).collect())
            }
        }
    }

    /// Extreme points of the resolved 3D geometry under `m`
    fn points_3d(&self, g: &Geometry3D, m: &Matrix4<f64>) -> Result<Vec<Vector3D>, EngineError> {
        if g.is_disabled() {
            return Ok(Vec::new());
        }

        match g.kind() {
            Geometry3DKind::Polyhedron { points, .. } => {
                Ok(points.iter().map(|p| apply_3d(m, p)).collect())
            }

            Geometry3DKind::Transformed { transform, child } => {
                self.points_3d(child, &(m * transform.to_matrix()))
            }

            Geometry3DKind::Boolean { op, children } => {
                let enabled: Vec<&Geometry3D> =
                    children.iter().filter(|c| !c.is_disabled()).collect();
                match op {
                    BooleanOp::Union | BooleanOp::Hull => {
                        let mut all = Vec::new();
                        for child in enabled {
                            all.extend(self.points_3d(child, m)?);
                        }
                        Ok(all)
                    }
                    BooleanOp::Difference => match enabled.first() {
                        Some(base) => self.points_3d(base, m),
                        None => Ok(Vec::new()),
                    },
                    BooleanOp::Intersection => {
                        let mut overlap: Option<Bounds3> = None;
                        for child in enabled {
                            let b = Bounds3::from_points(&self.points_3d(child, m)?);
                            overlap = Some(match overlap {
                                Some(acc) => acc.intersection(&b),
                                None => b,
                            });
                        }
                        Ok(box_points_3d(overlap, &Matrix4::identity()))
                    }
                    BooleanOp::Minkowski => {
                        let mut sum: Option<Bounds3> = None;
                        for child in enabled {
                            let b = Bounds3::from_points(&self.points_3d(child, &Matrix4::identity())?);
                            sum = Some(match sum {
                                Some(acc) => Bounds3::new(acc.min + b.min, acc.max + b.max),
                                None => b,
                            });
                        }
                        Ok(box_points_3d(sum, m))
                    }
                }
            }

            Geometry3DKind::LinearExtrude { params, child } => {
                let profile = self.points_2d(child, &Matrix3::identity())?;
                Ok(linear_sweep(params, &profile)
                    .iter()
                    .map(|p| apply_3d(m, p))
                    .collect())
            }

            Geometry3DKind::RotateExtrude {
                angle,
                resolution,
                child,
            } => {
                let profile = self.points_2d(child, &Matrix3::identity())?;
                Ok(rotate_sweep(*angle, *resolution, &profile)
                    .iter()
                    .map(|p| apply_3d(m, p))
                    .collect())
            }

            Geometry3DKind::Color { child, .. } => self.points_3d(child, m),

            Geometry3DKind::Imported { path, format } => match format {
                MeshFormat::Stl => Ok(read_stl_points(path)?
                    .iter()
                    .map(|p| apply_3d(m, p))
                    .collect()),
                MeshFormat::ThreeMf => Err(EngineError::Unsupported("3mf import")),
            },

            Geometry3DKind::Cached(body) => {
                let unit = self.unit_points_3d(g.id(), body)?;
                Ok(unit.iter().map(|p| apply_3d(m, p)).collect())
            }
        }
    }

    /// Closed outlines of a 2D tree under `m`, when they follow from its
    /// vertex data; `None` when the outline only exists after clipping
    fn outlines_2d(
        &self,
        g: &Geometry2D,
        m: &Matrix3<f64>,
    ) -> Result<Option<Vec<Vec<Vector2D>>>, EngineError> {
        if g.is_disabled() {
            return Ok(Some(Vec::new()));
        }

        match g.kind() {
            Geometry2DKind::Polygon { points, paths } => Ok(Some(match paths {
                None => vec![points.iter().map(|p| apply_2d(m, p)).collect()],
                Some(paths) => paths
                    .iter()
                    .map(|path| {
                        path.iter()
                            .filter_map(|&i| points.get(i))
                            .map(|p| apply_2d(m, p))
                            .collect()
                    })
                    .collect(),
            })),

            Geometry2DKind::Transformed { transform, child } => {
                self.outlines_2d(child, &(m * transform.to_matrix()))
            }

            Geometry2DKind::Boolean {
                op: BooleanOp::Union,
                children,
            } => {
                let mut rings = Vec::new();
                for child in children {
                    match self.outlines_2d(child, m)? {
                        Some(more) => rings.extend(more),
                        None => return Ok(None),
                    }
                }
                Ok(Some(rings))
            }

            Geometry2DKind::Boolean {
                op: BooleanOp::Hull,
                ..
            } => Ok(Some(vec![convex_hull(self.points_2d(g, m)?)])),

            Geometry2DKind::Cached(body) => self.outlines_2d(body, m),

            Geometry2DKind::Boolean { .. }
            | Geometry2DKind::Offset { .. }
            | Geometry2DKind::Projection { .. }
            | Geometry2DKind::Text { .. } => Ok(None),
        }
    }

    fn unit_points_2d(&self, id: NodeId, body: &Geometry2D) -> Result<Arc<[Vector2D]>, EngineError> {
        if let Some(points) = self.units_2d.get(&id) {
            return Ok(Arc::clone(points.value()));
        }
        debug!(unit = id, "resolving cached 2D unit");
        let points: Arc<[Vector2D]> = self.points_2d(body, &Matrix3::identity())?.into();
        self.units_2d.insert(id, Arc::clone(&points));
        Ok(points)
    }

    fn unit_points_3d(&self, id: NodeId, body: &Geometry3D) -> Result<Arc<[Vector3D]>, EngineError> {
        if let Some(points) = self.units_3d.get(&id) {
            return Ok(Arc::clone(points.value()));
        }
        debug!(unit = id, "resolving cached 3D unit");
        let points: Arc<[Vector3D]> = self.points_3d(body, &Matrix4::identity())?.into();
        self.units_3d.insert(id, Arc::clone(&points));
        Ok(points)
    }
}

impl GeometryEngine for LocalEngine {
    fn bounds_2d(&self, geometry: &Geometry2D) -> Result<Bounds2, EngineError> {
        let points = self.points_2d(geometry, &Matrix3::identity())?;
        let bounds = Bounds2::from_points(&points);
        if bounds.is_empty() {
            return Err(EngineError::EmptyGeometry);
        }
        debug!(node = geometry.id(), points = points.len(), "computed 2D extent");
        Ok(bounds)
    }

    fn bounds_3d(&self, geometry: &Geometry3D) -> Result<Bounds3, EngineError> {
        let points = self.points_3d(geometry, &Matrix4::identity())?;
        let bounds = Bounds3::from_points(&points);
        if bounds.is_empty() {
            return Err(EngineError::EmptyGeometry);
        }
        debug!(node = geometry.id(), points = points.len(), "computed 3D extent");
        Ok(bounds)
    }

    fn view_2d(&self, _geometry: &Geometry2D, _window: u32) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("view"))
    }

    fn view_3d(&self, _geometry: &Geometry3D, _window: u32) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("view"))
    }

    fn export(
        &self,
        _geometry: &Geometry3D,
        _path: &Path,
        _format: MeshFormat,
    ) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("export"))
    }
}

fn apply_2d(m: &Matrix3<f64>, p: &Vector2D) -> Vector2D {
    m.transform_point(&Point2::from(*p)).coords
}

fn apply_3d(m: &Matrix4<f64>, p: &Vector3D) -> Vector3D {
    m.transform_point(&Point3::from(*p)).coords
}

fn box_points_2d(bounds: Option<Bounds2>, m: &Matrix3<f64>) -> Vec<Vector2D> {
    match bounds {
        Some(b) if !b.is_empty() => b.corners().iter().map(|p| apply_2d(m, p)).collect(),
        _ => Vec::new(),
    }
}

fn box_points_3d(bounds: Option<Bounds3>, m: &Matrix4<f64>) -> Vec<Vector3D> {
    match bounds {
        Some(b) if !b.is_empty() => b.corners().iter().map(|p| apply_3d(m, p)).collect(),
        _ => Vec::new(),
    }
}

/// Ratio of miter length to offset distance beyond which corners are
/// squared off, as in OpenSCAD's `offset(delta=...)`
const MITER_LIMIT: f64 = 1.0e6;

/// Possible miter tips of a sharp-cornered outward offset by `delta`
///
/// Both sides of every corner are covered, so ring orientation and hole
/// nesting do not matter.
fn miter_tips(rings: &[Vec<Vector2D>], delta: f64) -> Vec<Vector2D> {
    let mut tips = Vec::new();
    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        for i in 0..n {
            let v = ring[i];
            let to_prev = ring[(i + n - 1) % n] - v;
            let to_next = ring[(i + 1) % n] - v;
            let (a, b) = (to_prev.norm(), to_next.norm());
            if a == 0.0 || b == 0.0 {
                continue;
            }
            let (e1, e2) = (to_prev / a, to_next / b);
            let half_sin = ((1.0 - e1.dot(&e2)) / 2.0).max(0.0).sqrt();
            let bisector = e1 + e2;
            let len = bisector.norm();
            if len < 1e-12 {
                continue;
            }
            let reach = delta * (1.0 / half_sin.max(1.0 / MITER_LIMIT));
            let step = bisector / len * reach;
            tips.push(v + step);
            tips.push(v - step);
        }
    }
    tips
}

/// Convex hull in counter-clockwise order (monotone chain)
fn convex_hull(mut points: Vec<Vector2D>) -> Vec<Vector2D> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let cross = |o: &Vector2D, a: &Vector2D, b: &Vector2D| {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };
    let mut hull: Vec<Vector2D> = Vec::with_capacity(points.len() + 1);
    let push = |hull: &mut Vec<Vector2D>, start: usize, p: &Vector2D| {
        while hull.len() >= start + 2
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    };
    for p in &points {
        push(&mut hull, 0, p);
    }
    let lower = hull.len();
    for p in points.iter().rev().skip(1) {
        push(&mut hull, lower - 1, p);
    }
    hull.pop();
    hull
}

/// Profile vertices at every slice of a linear extrusion
///
/// A positive twist turns the top clockwise when viewed from above.
fn linear_sweep(params: &LinearExtrude, profile: &[Vector2D]) -> Vec<Vector3D> {
    let slices = params.slices.max(1);
    let base = if params.center { -params.height / 2.0 } else { 0.0 };
    let mut out = Vec::with_capacity(profile.len() * (slices as usize + 1));

    for i in 0..=slices {
        let t = f64::from(i) / f64::from(slices);
        let z = base + params.height * t;
        let s = 1.0 + (params.scale - 1.0) * t;
        let (sin, cos) = (-(params.twist * t)).sin_cos();
        for p in profile {
            let (x, y) = (p.x * s, p.y * s);
            out.push(Vector3D::new(x * cos - y * sin, x * sin + y * cos, z));
        }
    }
    out
}

/// Profile vertices at every angular step of a rotational sweep
fn rotate_sweep(angle: Angle, resolution: u32, profile: &[Vector2D]) -> Vec<Vector3D> {
    let span = if angle.rotations().abs() >= 1.0 {
        Angle::FULL
    } else {
        angle
    };
    let segments = ((f64::from(resolution) * span.rotations().abs()).ceil() as u32).max(1);
    let mut out = Vec::with_capacity(profile.len() * (segments as usize + 1));

    for k in 0..=segments {
        let (sin, cos) = (span * (f64::from(k) / f64::from(segments))).sin_cos();
        for p in profile {
            out.push(Vector3D::new(p.x * cos, p.x * sin, p.y));
        }
    }
    out
}

/// Vertices of an STL file
pub(crate) fn read_stl_points(path: &Path) -> Result<Vec<Vector3D>, EngineError> {
    let mut file = File::open(path).map_err(|e| EngineError::io(path, e))?;
    let stl = stl_io::read_stl(&mut file).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(stl
        .vertices
        .iter()
        .map(|v| Vector3D::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::degrees;
    use crate::transform::{Transform2D, Transform3D};
    use crate::vector::vector2d;
    use approx::assert_relative_eq;

    fn unit_square() -> Geometry2D {
        Geometry2D::polygon([
            vector2d(0.0, 0.0),
            vector2d(1.0, 0.0),
            vector2d(1.0, 1.0),
            vector2d(0.0, 1.0),
        ])
        .unwrap()
    }

    fn cube(size: f64) -> Geometry3D {
        unit_square()
            .transform(&Transform2D::scale_uniform(size).unwrap())
            .extrude(size)
            .unwrap()
    }

    #[test]
    fn test_rotated_square_is_exact() {
        let engine = LocalEngine::new();
        let rotated = Transform2D::rotate(degrees(45.0)).transform(&unit_square());
        let b = engine.bounds_2d(&rotated).unwrap();
        let h = 0.5f64.sqrt();

        assert_relative_eq!(b.min.x, -h, epsilon = 1e-12);
        assert_relative_eq!(b.max.x, h, epsilon = 1e-12);
        assert_relative_eq!(b.min.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(b.max.y, 2.0 * h, epsilon = 1e-12);
    }

    #[test]
    fn test_difference_and_intersection_are_conservative() {
        let engine = LocalEngine::new();
        let a = cube(2.0);
        let b = Transform3D::translate(1.0, 1.0, 1.0).transform(&cube(2.0));

        let both = engine.bounds_3d(&(&a & &b)).unwrap();
        assert_eq!(both.min, Vector3D::new(1.0, 1.0, 1.0));
        assert_eq!(both.max, Vector3D::new(2.0, 2.0, 2.0));

        let cut = engine.bounds_3d(&(&a - &b)).unwrap();
        assert_eq!(cut, engine.bounds_3d(&a).unwrap());
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let engine = LocalEngine::new();
        let a = cube(1.0);
        let b = Transform3D::translate_x(5.0).transform(&cube(1.0));
        assert!(matches!(
            engine.bounds_3d(&(&a & &b)),
            Err(EngineError::EmptyGeometry)
        ));
    }

    #[test]
    fn test_disabled_child_is_skipped() {
        let engine = LocalEngine::new();
        let far = Transform3D::translate_x(10.0).transform(&cube(1.0));
        let u = Geometry3D::union([cube(1.0), far.disable()]).unwrap();
        assert_eq!(engine.bounds_3d(&u).unwrap().max.x, 1.0);

        let debug = Geometry3D::union([cube(1.0), far.debug_mark()]).unwrap();
        assert_eq!(engine.bounds_3d(&debug).unwrap().max.x, 11.0);
    }

    #[test]
    fn test_cached_unit_resolved_once() {
        let engine = LocalEngine::new();
        let unit = cube(1.0).cache();
        let copies: Vec<Geometry3D> = (0..5)
            .map(|i| Transform3D::translate_x(f64::from(i) * 2.0).transform(&unit))
            .collect();
        let row = Geometry3D::union(&copies).unwrap();

        let b = engine.bounds_3d(&row).unwrap();
        assert_eq!(b.max, Vector3D::new(9.0, 1.0, 1.0));
        assert_eq!(engine.evaluated_units(), 1);
    }

    #[test]
    fn test_linear_extrude_scale_and_center() {
        let engine = LocalEngine::new();
        let centered = Transform2D::translate(-0.5, -0.5).transform(&unit_square());
        let params = LinearExtrude::new(4.0).with_scale(2.0).centered(true);
        let solid = Geometry3D::linear_extrude(params, &centered).unwrap();
        let b = engine.bounds_3d(&solid).unwrap();

        assert_eq!(b.min, Vector3D::new(-1.0, -1.0, -2.0));
        assert_eq!(b.max, Vector3D::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn test_rotate_extrude_quarter() {
        let engine = LocalEngine::new();
        let profile = Transform2D::translate(2.0, 0.0).transform(&unit_square());
        let solid = Geometry3D::rotate_extrude(degrees(90.0), 64, &profile).unwrap();
        let b = engine.bounds_3d(&solid).unwrap();

        assert_relative_eq!(b.min.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(b.max.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(b.min.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(b.max.y, 3.0, epsilon = 1e-12);
        assert_eq!((b.min.z, b.max.z), (0.0, 1.0));
    }

    #[test]
    fn test_projection_and_offset() {
        let engine = LocalEngine::new();
        let lifted = Transform3D::translate_z(5.0).transform(&cube(2.0));

        let shadow = engine.bounds_2d(&lifted.project(false)).unwrap();
        assert_eq!(shadow.max, vector2d(2.0, 2.0));
        assert!(engine.bounds_2d(&lifted.project(true)).is_err());

        let grown = Geometry2D::offset(0.5, false, [&unit_square()]).unwrap();
        let b = engine.bounds_2d(&grown).unwrap();
        assert_relative_eq!(b.min.x, -0.5, epsilon = 1e-12);
        assert_relative_eq!(b.min.y, -0.5, epsilon = 1e-12);
        assert_relative_eq!(b.max.x, 1.5, epsilon = 1e-12);
        assert_relative_eq!(b.max.y, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sharp_offset_covers_miter_tip() {
        let engine = LocalEngine::new();
        let sliver =
            Geometry2D::polygon([vector2d(0.0, 0.0), vector2d(10.0, 0.0), vector2d(0.0, 1.0)])
                .unwrap();

        // The corner at (10, 0) spans about 5.7 degrees, so its miter reaches x = 30.05
        let mitered = Geometry2D::offset(1.0, false, [&sliver]).unwrap();
        let b = engine.bounds_2d(&mitered).unwrap();
        assert!(b.max.x >= 30.04, "max.x = {}", b.max.x);
        assert!(b.min.x <= -1.0 && b.min.y <= -1.0);

        // Mirrored input keeps the tip on the other side
        let flipped = Transform2D::mirror(1.0, 0.0).unwrap().transform(&sliver);
        let b = engine
            .bounds_2d(&Geometry2D::offset(1.0, false, [&flipped]).unwrap())
            .unwrap();
        assert!(b.min.x <= -30.04, "min.x = {}", b.min.x);

        let chamfered = Geometry2D::offset(1.0, true, [&sliver]).unwrap();
        let b = engine.bounds_2d(&chamfered).unwrap();
        assert!(b.max.x >= 11.0 && b.max.x < 30.0);
    }

    #[test]
    fn test_sharp_offset_of_union_and_hull() {
        let engine = LocalEngine::new();
        let sliver =
            Geometry2D::polygon([vector2d(0.0, 0.0), vector2d(10.0, 0.0), vector2d(0.0, 1.0)])
                .unwrap();
        let moved = Transform2D::translate(0.0, 5.0).transform(&unit_square());

        let joined = Geometry2D::union([&sliver, &moved]).unwrap();
        let b = engine
            .bounds_2d(&Geometry2D::offset(1.0, false, [&joined]).unwrap())
            .unwrap();
        assert!(b.max.x >= 30.04);

        let hulled = Geometry2D::hull([&sliver, &moved]).unwrap();
        let b = engine
            .bounds_2d(&Geometry2D::offset(1.0, false, [&hulled]).unwrap())
            .unwrap();
        assert!(b.max.x >= 11.0);
        assert!(b.max.y >= 7.0);
    }

    #[test]
    fn test_sharp_offset_of_clipped_outline_is_unsupported() {
        let engine = LocalEngine::new();
        let bite = Transform2D::translate(0.5, 0.5).transform(&unit_square());
        let clipped = unit_square().difference([&bite]);
        let mitered = Geometry2D::offset(1.0, false, [&clipped]).unwrap();
        assert!(matches!(
            engine.bounds_2d(&mitered),
            Err(EngineError::Unsupported(_))
        ));

        let shrunk = Geometry2D::offset(-0.1, false, [&clipped]).unwrap();
        assert!(engine.bounds_2d(&shrunk).is_ok());
        let rounded = Geometry2D::offset_round(1.0, 16, [&clipped]).unwrap();
        assert_eq!(engine.bounds_2d(&rounded).unwrap().max, vector2d(2.0, 2.0));
    }

    #[test]
    fn test_text_is_bounded_by_glyph_cells() {
        let engine = LocalEngine::new();
        let word = Geometry2D::text("abc", 12).unwrap();
        let b = engine.bounds_2d(&word).unwrap();
        assert_eq!(b.min, vector2d(0.0, -3.0));
        assert_eq!(b.max, vector2d(22.5, 12.0));

        let lifted = Transform2D::translate(0.0, 3.0).transform(&word);
        assert_eq!(engine.bounds_2d(&lifted).unwrap().min, vector2d(0.0, 0.0));

        assert!(engine.bounds_2d(&Geometry2D::text("", 12).unwrap()).is_err());
        let mitered = Geometry2D::offset(0.5, false, [&word]).unwrap();
        assert!(matches!(
            engine.bounds_2d(&mitered),
            Err(EngineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_unsupported_operations() {
        let engine = LocalEngine::new();
        assert!(matches!(
            engine.view_3d(&cube(1.0), 0),
            Err(EngineError::Unsupported("view"))
        ));
    }
}
