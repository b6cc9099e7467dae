// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 2D transforms

use super::{check_scale, flatten, unit_normal_2d, Transform3D, Transform3DKind};
use crate::angle::Angle;
use crate::ast::Geometry2D;
use crate::error::{Error, Result};
use crate::vector::{Vector2D, Vector3D};
use nalgebra::{Matrix3, Rotation2};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::ops::Mul;
use std::sync::Arc;

/// Immutable 2D affine transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Transform2DKind", into = "Transform2DKind")]
pub struct Transform2D {
    kind: Transform2DKind,
}

/// Variants of a [`Transform2D`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transform2DKind {
    Identity,
    Translate(Vector2D),
    /// Counter-clockwise rotation about the origin
    Rotate(Angle),
    Scale(Vector2D),
    /// Reflection about the line through the origin with this unit normal
    Mirror(Vector2D),
    /// Flat list, outermost first
    Composed(Arc<[Transform2D]>),
}

impl Transform2D {
    const IDENTITY: Transform2D = Transform2D {
        kind: Transform2DKind::Identity,
    };

    fn from_kind(kind: Transform2DKind) -> Self {
        Self { kind }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self::translate_vec(&Vector2D::new(x, y))
    }

    pub fn translate_x(x: f64) -> Self {
        Self::translate(x, 0.0)
    }

    pub fn translate_y(y: f64) -> Self {
        Self::translate(0.0, y)
    }

    pub fn translate_vec(v: &Vector2D) -> Self {
        Self::from_kind(Transform2DKind::Translate(*v))
    }

    pub fn translate_from_to(from: &Vector2D, to: &Vector2D) -> Self {
        Self::translate_vec(&(to - from))
    }

    pub fn rotate(angle: Angle) -> Self {
        Self::from_kind(Transform2DKind::Rotate(angle))
    }

    /// Rotation about `point`: move it to the origin, rotate, move back
    pub fn rotate_around(point: &Vector2D, angle: Angle) -> Self {
        Self::compose([
            Self::translate_vec(point),
            Self::rotate(angle),
            Self::translate_vec(&-point),
        ])
    }

    /// Non-uniform scale. Zero factors are rejected; negative ones flip.
    pub fn scale(x: f64, y: f64) -> Result<Self> {
        check_scale('x', x)?;
        check_scale('y', y)?;
        Ok(Self::from_kind(Transform2DKind::Scale(Vector2D::new(x, y))))
    }

    pub fn scale_uniform(s: f64) -> Result<Self> {
        Self::scale(s, s)
    }

    /// Reflection about the line through the origin with normal `(x, y)`
    pub fn mirror(x: f64, y: f64) -> Result<Self> {
        let normal = unit_normal_2d(Vector2D::new(x, y))?;
        Ok(Self::from_kind(Transform2DKind::Mirror(normal)))
    }

    /// Compose transforms, outermost first
    pub fn compose<I>(transforms: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Transform2D>,
    {
        let mut flat = flatten(transforms, Transform2D::is_identity, |t: &Transform2D| {
            match &t.kind {
                Transform2DKind::Composed(parts) => Some(&parts[..]),
                _ => None,
            }
        });
        match flat.len() {
            0 => Self::identity(),
            1 => flat.pop().unwrap_or_default(),
            _ => Self::from_kind(Transform2DKind::Composed(flat.into())),
        }
    }

    /// `self` applied after `inner`
    pub fn then_after(&self, inner: &Transform2D) -> Self {
        Self::compose([self, inner])
    }

    pub fn kind(&self) -> &Transform2DKind {
        &self.kind
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.kind, Transform2DKind::Identity)
    }

    pub fn parts(&self) -> &[Transform2D] {
        match &self.kind {
            Transform2DKind::Identity => &[],
            Transform2DKind::Composed(parts) => parts,
            _ => std::slice::from_ref(self),
        }
    }

    pub fn inverse(&self) -> Self {
        match &self.kind {
            Transform2DKind::Identity | Transform2DKind::Mirror(_) => self.clone(),
            Transform2DKind::Translate(v) => Self::translate_vec(&-v),
            Transform2DKind::Rotate(a) => Self::rotate(-*a),
            Transform2DKind::Scale(s) => Self::from_kind(Transform2DKind::Scale(s.map(|f| 1.0 / f))),
            Transform2DKind::Composed(parts) => {
                Self::compose(parts.iter().rev().map(Transform2D::inverse))
            }
        }
    }

    pub fn transform_point(&self, p: &Vector2D) -> Vector2D {
        match &self.kind {
            Transform2DKind::Translate(v) => p + v,
            Transform2DKind::Composed(parts) => parts
                .iter()
                .rev()
                .fold(*p, |acc, t| t.transform_point(&acc)),
            _ => self.transform_direction(p),
        }
    }

    pub fn transform_direction(&self, d: &Vector2D) -> Vector2D {
        match &self.kind {
            Transform2DKind::Identity | Transform2DKind::Translate(_) => *d,
            Transform2DKind::Rotate(a) => {
                let (sin, cos) = a.sin_cos();
                Vector2D::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
            }
            Transform2DKind::Scale(s) => d.component_mul(s),
            Transform2DKind::Mirror(n) => d - n * (2.0 * d.dot(n)),
            Transform2DKind::Composed(parts) => parts
                .iter()
                .rev()
                .fold(*d, |acc, t| t.transform_direction(&acc)),
        }
    }

    pub fn transform(&self, geometry: &Geometry2D) -> Geometry2D {
        match &self.kind {
            Transform2DKind::Identity => geometry.clone(),
            Transform2DKind::Composed(parts) => parts
                .iter()
                .rev()
                .fold(geometry.clone(), |acc, t| t.transform(&acc)),
            _ => Geometry2D::transformed(self.clone(), geometry),
        }
    }

    /// The same map acting on the z = 0 plane of 3D space
    pub fn to_3d(&self) -> Transform3D {
        match &self.kind {
            Transform2DKind::Identity => Transform3D::identity(),
            Transform2DKind::Translate(v) => Transform3D::translate(v.x, v.y, 0.0),
            Transform2DKind::Rotate(a) => Transform3D::rotate_z(*a),
            Transform2DKind::Scale(s) => {
                Transform3D::from_kind(Transform3DKind::Scale(Vector3D::new(s.x, s.y, 1.0)))
            }
            Transform2DKind::Mirror(n) => {
                Transform3D::from_kind(Transform3DKind::Mirror(Vector3D::new(n.x, n.y, 0.0)))
            }
            Transform2DKind::Composed(parts) => {
                Transform3D::compose(parts.iter().map(Transform2D::to_3d))
            }
        }
    }

    pub fn to_matrix(&self) -> Matrix3<f64> {
        match &self.kind {
            Transform2DKind::Identity => Matrix3::identity(),
            Transform2DKind::Translate(v) => Matrix3::new_translation(v),
            Transform2DKind::Rotate(a) => Rotation2::new(a.radians()).to_homogeneous(),
            Transform2DKind::Scale(s) => Matrix3::new_nonuniform_scaling(s),
            Transform2DKind::Mirror(n) => {
                let reflect = nalgebra::Matrix2::identity() - n * n.transpose() * 2.0;
                reflect.to_homogeneous()
            }
            Transform2DKind::Composed(parts) => parts
                .iter()
                .fold(Matrix3::identity(), |acc, t| acc * t.to_matrix()),
        }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<&Transform2D> for Transform3D {
    fn from(transform: &Transform2D) -> Self {
        transform.to_3d()
    }
}

impl Mul for Transform2D {
    type Output = Transform2D;

    fn mul(self, rhs: Transform2D) -> Transform2D {
        Transform2D::compose([self, rhs])
    }
}

impl<'a> Mul<&'a Transform2D> for &'a Transform2D {
    type Output = Transform2D;

    fn mul(self, rhs: &'a Transform2D) -> Transform2D {
        Transform2D::compose([self, rhs])
    }
}

impl TryFrom<Transform2DKind> for Transform2D {
    type Error = Error;

    fn try_from(kind: Transform2DKind) -> Result<Self> {
        match kind {
            Transform2DKind::Identity => Ok(Self::identity()),
            Transform2DKind::Scale(s) => Self::scale(s.x, s.y),
            Transform2DKind::Mirror(n) => Self::mirror(n.x, n.y),
            Transform2DKind::Composed(parts) => Ok(Self::compose(parts.iter())),
            other => Ok(Self::from_kind(other)),
        }
    }
}

impl From<Transform2D> for Transform2DKind {
    fn from(transform: Transform2D) -> Self {
        transform.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::degrees;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Vector2D {
        Vector2D::new(x, y)
    }

    fn samples() -> Vec<Transform2D> {
        vec![
            Transform2D::translate(3.0, -1.0),
            Transform2D::rotate(degrees(33.0)),
            Transform2D::scale(-2.0, 0.25).unwrap(),
            Transform2D::mirror(3.0, 4.0).unwrap(),
            Transform2D::rotate_around(&p(2.0, 2.0), degrees(-120.0)),
        ]
    }

    #[test]
    fn test_unit_square_rotation_symmetry() {
        let corners = [p(0.5, 0.5), p(-0.5, 0.5), p(-0.5, -0.5), p(0.5, -0.5)];
        let r = Transform2D::rotate(degrees(90.0));
        for c in &corners {
            let moved = r.transform_point(c);
            assert!(
                corners.iter().any(|o| (o - moved).norm() < 1e-12),
                "{moved:?} is not a corner"
            );
        }
    }

    #[test]
    fn test_compose_matches_nested_application() {
        let ts = samples();
        let point = p(0.7, -2.1);
        let composed = Transform2D::compose(&ts);
        let manual = ts.iter().rev().fold(point, |acc, t| t.transform_point(&acc));
        assert_relative_eq!(composed.transform_point(&point), manual, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_of_composed_reverses() {
        let composed = Transform2D::compose(samples());
        let inverse = composed.inverse();
        let expected = Transform2D::compose(samples().iter().rev().map(Transform2D::inverse));
        assert_eq!(composed.parts().len(), 7);
        assert_eq!(inverse.parts(), expected.parts());

        let point = p(4.0, 5.0);
        let back = inverse.transform_point(&composed.transform_point(&point));
        assert_relative_eq!(back, point, epsilon = 1e-9);
    }

    #[test]
    fn test_rotate_around_fixes_center() {
        let center = p(2.0, 3.0);
        let t = Transform2D::rotate_around(&center, degrees(77.0));
        assert_relative_eq!(t.transform_point(&center), center, epsilon = 1e-12);
        assert_eq!(t.parts().len(), 3);
    }

    #[test]
    fn test_to_3d_preserves_order_and_plane() {
        let t2 = Transform2D::compose(samples());
        let t3 = t2.to_3d();
        assert_eq!(t3.parts().len(), t2.parts().len());

        let point = p(1.25, -0.75);
        let expected = t2.transform_point(&point);
        let got = t3.transform_point(&Vector3D::new(point.x, point.y, 0.0));
        assert_relative_eq!(got, Vector3D::new(expected.x, expected.y, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_direction_ignores_translation() {
        let t = Transform2D::compose([Transform2D::translate(9.0, 9.0), Transform2D::rotate(degrees(90.0))]);
        assert_relative_eq!(t.transform_direction(&p(1.0, 0.0)), p(0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_twice_returns_point() {
        let m = Transform2D::mirror(1.0, 2.0).unwrap();
        let point = p(3.0, -7.0);
        let twice = m.inverse().transform_point(&m.inverse().transform_point(&point));
        assert_relative_eq!(twice, point, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_agrees() {
        let t = Transform2D::compose(samples());
        let point = p(-1.0, 2.0);
        let m = t.to_matrix();
        let via_matrix = m.transform_point(&nalgebra::Point2::from(point)).coords;
        assert_relative_eq!(via_matrix, t.transform_point(&point), epsilon = 1e-9);
    }
}
