// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 3D transforms

use super::{check_scale, flatten, unit_normal_3d};
use crate::angle::Angle;
use crate::ast::Geometry3D;
use crate::error::{Error, Result};
use crate::vector::Vector3D;
use nalgebra::{Matrix4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::ops::Mul;
use std::sync::Arc;

/// Immutable 3D affine transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Transform3DKind", into = "Transform3DKind")]
pub struct Transform3D {
    kind: Transform3DKind,
}

/// Variants of a [`Transform3D`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transform3DKind {
    Identity,
    Translate(Vector3D),
    RotateX(Angle),
    RotateY(Angle),
    RotateZ(Angle),
    Scale(Vector3D),
    /// Reflection about the plane through the origin with this unit normal
    Mirror(Vector3D),
    /// Flat list, outermost first
    Composed(Arc<[Transform3D]>),
}

impl Transform3D {
    const IDENTITY: Transform3D = Transform3D {
        kind: Transform3DKind::Identity,
    };

    pub(super) fn from_kind(kind: Transform3DKind) -> Self {
        Self { kind }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(x: f64, y: f64, z: f64) -> Self {
        Self::translate_vec(&Vector3D::new(x, y, z))
    }

    pub fn translate_x(x: f64) -> Self {
        Self::translate(x, 0.0, 0.0)
    }

    pub fn translate_y(y: f64) -> Self {
        Self::translate(0.0, y, 0.0)
    }

    pub fn translate_z(z: f64) -> Self {
        Self::translate(0.0, 0.0, z)
    }

    pub fn translate_vec(v: &Vector3D) -> Self {
        Self::from_kind(Transform3DKind::Translate(*v))
    }

    /// Translation moving `from` onto `to`
    pub fn translate_from_to(from: &Vector3D, to: &Vector3D) -> Self {
        Self::translate_vec(&(to - from))
    }

    pub fn rotate_x(angle: Angle) -> Self {
        Self::from_kind(Transform3DKind::RotateX(angle))
    }

    pub fn rotate_y(angle: Angle) -> Self {
        Self::from_kind(Transform3DKind::RotateY(angle))
    }

    pub fn rotate_z(angle: Angle) -> Self {
        Self::from_kind(Transform3DKind::RotateZ(angle))
    }

    /// Rotation about X, then Y, then Z
    pub fn rotate(x: Angle, y: Angle, z: Angle) -> Self {
        Self::compose([Self::rotate_z(z), Self::rotate_y(y), Self::rotate_x(x)])
    }

    pub fn rotate_x_around(point: &Vector3D, angle: Angle) -> Self {
        Self::around(point, Self::rotate_x(angle))
    }

    pub fn rotate_y_around(point: &Vector3D, angle: Angle) -> Self {
        Self::around(point, Self::rotate_y(angle))
    }

    pub fn rotate_z_around(point: &Vector3D, angle: Angle) -> Self {
        Self::around(point, Self::rotate_z(angle))
    }

    pub fn rotate_around(point: &Vector3D, x: Angle, y: Angle, z: Angle) -> Self {
        Self::around(point, Self::rotate(x, y, z))
    }

    /// Conjugate `inner` so it acts about `point` instead of the origin
    fn around(point: &Vector3D, inner: Transform3D) -> Self {
        Self::compose([
            Self::translate_vec(point),
            inner,
            Self::translate_vec(&-point),
        ])
    }

    /// Non-uniform scale. Zero factors are rejected; negative ones flip.
    pub fn scale(x: f64, y: f64, z: f64) -> Result<Self> {
        check_scale('x', x)?;
        check_scale('y', y)?;
        check_scale('z', z)?;
        Ok(Self::from_kind(Transform3DKind::Scale(Vector3D::new(x, y, z))))
    }

    pub fn scale_uniform(s: f64) -> Result<Self> {
        Self::scale(s, s, s)
    }

    /// Reflection about the plane through the origin with normal `(x, y, z)`.
    /// The normal does not need to be unit length but must not be zero.
    pub fn mirror(x: f64, y: f64, z: f64) -> Result<Self> {
        let normal = unit_normal_3d(Vector3D::new(x, y, z))?;
        Ok(Self::from_kind(Transform3DKind::Mirror(normal)))
    }

    /// Compose transforms, outermost first. Nested compositions are spliced
    /// in and identities dropped.
    pub fn compose<I>(transforms: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Transform3D>,
    {
        let mut flat = flatten(transforms, Transform3D::is_identity, |t: &Transform3D| {
            match &t.kind {
                Transform3DKind::Composed(parts) => Some(&parts[..]),
                _ => None,
            }
        });
        match flat.len() {
            0 => Self::identity(),
            1 => flat.pop().unwrap_or_default(),
            _ => Self::from_kind(Transform3DKind::Composed(flat.into())),
        }
    }

    /// `self` applied after `inner`
    pub fn then_after(&self, inner: &Transform3D) -> Self {
        Self::compose([self, inner])
    }

    pub fn kind(&self) -> &Transform3DKind {
        &self.kind
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.kind, Transform3DKind::Identity)
    }

    /// The flat list of primitive transforms, outermost first
    pub fn parts(&self) -> &[Transform3D] {
        match &self.kind {
            Transform3DKind::Identity => &[],
            Transform3DKind::Composed(parts) => parts,
            _ => std::slice::from_ref(self),
        }
    }

    pub fn inverse(&self) -> Self {
        match &self.kind {
            Transform3DKind::Identity | Transform3DKind::Mirror(_) => self.clone(),
            Transform3DKind::Translate(v) => Self::translate_vec(&-v),
            Transform3DKind::RotateX(a) => Self::rotate_x(-*a),
            Transform3DKind::RotateY(a) => Self::rotate_y(-*a),
            Transform3DKind::RotateZ(a) => Self::rotate_z(-*a),
            Transform3DKind::Scale(s) => Self::from_kind(Transform3DKind::Scale(s.map(|f| 1.0 / f))),
            Transform3DKind::Composed(parts) => {
                Self::compose(parts.iter().rev().map(Transform3D::inverse))
            }
        }
    }

    /// Apply the full affine map, translation included
    pub fn transform_point(&self, p: &Vector3D) -> Vector3D {
        match &self.kind {
            Transform3DKind::Translate(v) => p + v,
            Transform3DKind::Composed(parts) => parts
                .iter()
                .rev()
                .fold(*p, |acc, t| t.transform_point(&acc)),
            _ => self.transform_direction(p),
        }
    }

    /// Apply only the linear part; translations leave directions unchanged
    pub fn transform_direction(&self, d: &Vector3D) -> Vector3D {
        match &self.kind {
            Transform3DKind::Identity | Transform3DKind::Translate(_) => *d,
            Transform3DKind::RotateX(a) => {
                let (sin, cos) = a.sin_cos();
                Vector3D::new(d.x, d.y * cos - d.z * sin, d.y * sin + d.z * cos)
            }
            Transform3DKind::RotateY(a) => {
                let (sin, cos) = a.sin_cos();
                Vector3D::new(d.x * cos + d.z * sin, d.y, -d.x * sin + d.z * cos)
            }
            Transform3DKind::RotateZ(a) => {
                let (sin, cos) = a.sin_cos();
                Vector3D::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos, d.z)
            }
            Transform3DKind::Scale(s) => d.component_mul(s),
            Transform3DKind::Mirror(n) => d - n * (2.0 * d.dot(n)),
            Transform3DKind::Composed(parts) => parts
                .iter()
                .rev()
                .fold(*d, |acc, t| t.transform_direction(&acc)),
        }
    }

    /// Wrap `geometry` in this transform. Composed transforms nest one node
    /// per part, innermost part closest to the geometry.
    pub fn transform(&self, geometry: &Geometry3D) -> Geometry3D {
        match &self.kind {
            Transform3DKind::Identity => geometry.clone(),
            Transform3DKind::Composed(parts) => parts
                .iter()
                .rev()
                .fold(geometry.clone(), |acc, t| t.transform(&acc)),
            _ => Geometry3D::transformed(self.clone(), geometry),
        }
    }

    /// Homogeneous matrix of this transform
    pub fn to_matrix(&self) -> Matrix4<f64> {
        match &self.kind {
            Transform3DKind::Identity => Matrix4::identity(),
            Transform3DKind::Translate(v) => Matrix4::new_translation(v),
            Transform3DKind::RotateX(a) => {
                Rotation3::from_axis_angle(&Vector3::x_axis(), a.radians()).to_homogeneous()
            }
            Transform3DKind::RotateY(a) => {
                Rotation3::from_axis_angle(&Vector3::y_axis(), a.radians()).to_homogeneous()
            }
            Transform3DKind::RotateZ(a) => {
                Rotation3::from_axis_angle(&Vector3::z_axis(), a.radians()).to_homogeneous()
            }
            Transform3DKind::Scale(s) => Matrix4::new_nonuniform_scaling(s),
            Transform3DKind::Mirror(n) => {
                let reflect = nalgebra::Matrix3::identity() - n * n.transpose() * 2.0;
                reflect.to_homogeneous()
            }
            Transform3DKind::Composed(parts) => parts
                .iter()
                .fold(Matrix4::identity(), |acc, t| acc * t.to_matrix()),
        }
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform3D {
    type Output = Transform3D;

    fn mul(self, rhs: Transform3D) -> Transform3D {
        Transform3D::compose([self, rhs])
    }
}

impl<'a> Mul<&'a Transform3D> for &'a Transform3D {
    type Output = Transform3D;

    fn mul(self, rhs: &'a Transform3D) -> Transform3D {
        Transform3D::compose([self, rhs])
    }
}

impl TryFrom<Transform3DKind> for Transform3D {
    type Error = Error;

    fn try_from(kind: Transform3DKind) -> Result<Self> {
        match kind {
            Transform3DKind::Identity => Ok(Self::identity()),
            Transform3DKind::Scale(s) => Self::scale(s.x, s.y, s.z),
            Transform3DKind::Mirror(n) => Self::mirror(n.x, n.y, n.z),
            Transform3DKind::Composed(parts) => Ok(Self::compose(parts.iter())),
            other => Ok(Self::from_kind(other)),
        }
    }
}

impl From<Transform3D> for Transform3DKind {
    fn from(transform: Transform3D) -> Self {
        transform.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::degrees;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Vector3D {
        Vector3D::new(x, y, z)
    }

    fn samples() -> Vec<Transform3D> {
        vec![
            Transform3D::identity(),
            Transform3D::translate(1.0, -2.0, 3.5),
            Transform3D::rotate_x(degrees(30.0)),
            Transform3D::rotate_y(degrees(-75.0)),
            Transform3D::rotate_z(degrees(400.0)),
            Transform3D::scale(2.0, -0.5, 3.0).unwrap(),
            Transform3D::mirror(1.0, 1.0, 0.0).unwrap(),
            Transform3D::rotate_around(&p(1.0, 2.0, 3.0), degrees(10.0), degrees(20.0), degrees(30.0)),
        ]
    }

    #[test]
    fn test_inverse_roundtrip() {
        let point = p(0.3, -1.7, 2.2);
        for t in samples() {
            let back = t.inverse().transform_point(&t.transform_point(&point));
            assert_relative_eq!(back, point, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotate_then_translate_order() {
        let t = Transform3D::compose([
            Transform3D::rotate_z(degrees(90.0)),
            Transform3D::translate(5.0, 0.0, 0.0),
        ]);
        assert_relative_eq!(t.transform_point(&p(0.0, 0.0, 0.0)), p(0.0, 5.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_translation_ignored_for_directions() {
        let t = Transform3D::translate(10.0, 20.0, 30.0);
        assert_eq!(t.transform_direction(&p(1.0, 0.0, 0.0)), p(1.0, 0.0, 0.0));
        assert_eq!(t.transform_point(&p(1.0, 0.0, 0.0)), p(11.0, 20.0, 30.0));
    }

    #[test]
    fn test_right_handed_rotations() {
        let quarter = degrees(90.0);
        assert_relative_eq!(Transform3D::rotate_x(quarter).transform_point(&p(0.0, 1.0, 0.0)), p(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(Transform3D::rotate_y(quarter).transform_point(&p(0.0, 0.0, 1.0)), p(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(Transform3D::rotate_z(quarter).transform_point(&p(1.0, 0.0, 0.0)), p(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_flattens() {
        let a = Transform3D::translate_x(1.0);
        let b = Transform3D::rotate_y(degrees(45.0));
        let c = Transform3D::scale_uniform(2.0).unwrap();

        let nested = Transform3D::compose([
            Transform3D::compose([a.clone(), Transform3D::identity()]),
            Transform3D::compose([b.clone(), c.clone()]),
        ]);
        assert_eq!(nested.parts(), &[a, b, c][..]);
        assert!(nested.parts().iter().all(|t| !matches!(t.kind(), Transform3DKind::Composed(_))));
    }

    #[test]
    fn test_empty_compose_is_identity() {
        assert!(Transform3D::compose(Vec::<Transform3D>::new()).is_identity());
        assert!(Transform3D::compose([Transform3D::identity(), Transform3D::identity()]).is_identity());
        assert!(Transform3D::identity().inverse().is_identity());
    }

    #[test]
    fn test_mirror_self_inverse() {
        let m = Transform3D::mirror(0.0, 0.0, 2.0).unwrap();
        assert_eq!(m.inverse(), m);
        assert_eq!(m.transform_point(&p(1.0, 2.0, 3.0)), p(1.0, 2.0, -3.0));
    }

    #[test]
    fn test_zero_scale_rejected() {
        assert!(matches!(Transform3D::scale(1.0, 0.0, 1.0), Err(Error::ZeroScale { axis: 'y' })));
        assert!(matches!(Transform3D::mirror(0.0, 0.0, 0.0), Err(Error::ZeroNormal)));
        assert!(Transform3D::scale(-1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_matrix_matches_point_transform() {
        let point = p(1.5, -0.5, 4.0);
        let t = Transform3D::compose(samples());
        let m = t.to_matrix();
        let via_matrix = m.transform_point(&nalgebra::Point3::from(point)).coords;
        assert_relative_eq!(via_matrix, t.transform_point(&point), epsilon = 1e-9);
    }

    #[test]
    fn test_serde_roundtrip_recanonicalizes() {
        let t = Transform3D::compose([
            Transform3D::translate(1.0, 2.0, 3.0),
            Transform3D::rotate_x(degrees(15.0)),
        ]);
        let text = toml::to_string(&Wrapper { t: t.clone() }).unwrap();
        let back: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(back.t, t);
    }

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        t: Transform3D,
    }
}
