// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Point and direction values
//!
//! Vectors are plain nalgebra column vectors, so the usual operators
//! (`+`, `-`, `* f64`, `/ f64`, `dot`, `cross`) apply directly. The free
//! functions here name the operations the modeling API talks about.
//!
//! Normalizing a zero-length vector is not an error: the result has NaN
//! components, following IEEE propagation.

use crate::angle::Angle;
use serde::{Deserialize, Serialize};

/// 2D point or direction
pub type Vector2D = nalgebra::Vector2<f64>;

/// 3D point or direction
pub type Vector3D = nalgebra::Vector3<f64>;

pub fn vector2d(x: f64, y: f64) -> Vector2D {
    Vector2D::new(x, y)
}

pub fn vector3d(x: f64, y: f64, z: f64) -> Vector3D {
    Vector3D::new(x, y, z)
}

/// Operations shared by 2D and 3D vectors
pub trait VectorExt: Sized + Copy {
    /// Squared length, avoiding the square root
    fn sqr_length(&self) -> f64;

    fn length(&self) -> f64 {
        self.sqr_length().sqrt()
    }

    /// Unit vector in the same direction; NaN components for a zero vector
    fn normalized(&self) -> Self;

    /// Distance between two points
    fn dist(&self, other: &Self) -> f64;

    /// Vector pointing from `self` to `to`, exactly `to - self`
    fn from_to(&self, to: &Self) -> Self;
}

impl VectorExt for Vector2D {
    fn sqr_length(&self) -> f64 {
        self.norm_squared()
    }

    fn normalized(&self) -> Self {
        self / self.norm()
    }

    fn dist(&self, other: &Self) -> f64 {
        (other - self).norm()
    }

    fn from_to(&self, to: &Self) -> Self {
        to - self
    }
}

impl VectorExt for Vector3D {
    fn sqr_length(&self) -> f64 {
        self.norm_squared()
    }

    fn normalized(&self) -> Self {
        self / self.norm()
    }

    fn dist(&self, other: &Self) -> f64 {
        (other - self).norm()
    }

    fn from_to(&self, to: &Self) -> Self {
        to - self
    }
}

/// 2D polar coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polar2D {
    pub r: f64,
    pub phi: Angle,
}

impl Polar2D {
    pub fn new(r: f64, phi: Angle) -> Self {
        Self { r, phi }
    }

    pub fn from_vector(v: &Vector2D) -> Self {
        Self {
            r: v.norm(),
            phi: Angle::from_radians(v.y.atan2(v.x)),
        }
    }

    pub fn to_vector(&self) -> Vector2D {
        let (sin, cos) = self.phi.sin_cos();
        Vector2D::new(self.r * cos, self.r * sin)
    }
}

impl From<Polar2D> for Vector2D {
    fn from(polar: Polar2D) -> Self {
        polar.to_vector()
    }
}
