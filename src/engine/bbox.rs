// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Axis-aligned bounding boxes

use crate::vector::{Vector2D, Vector3D};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min: Vector2D,
    pub max: Vector2D,
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    pub min: Vector3D,
    pub max: Vector3D,
}

impl Bounds2 {
    pub fn new(min: Vector2D, max: Vector2D) -> Self {
        Self { min, max }
    }

    /// Box containing nothing; expanding it by a point yields that point
    pub fn empty() -> Self {
        Self {
            min: Vector2D::repeat(f64::INFINITY),
            max: Vector2D::repeat(f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector2D>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.expand_to_include(p);
        }
        bounds
    }

    pub fn expand_to_include(&mut self, p: &Vector2D) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&self, other: &Bounds2) -> Self {
        Self::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Overlap of both boxes; empty when they are disjoint
    pub fn intersection(&self, other: &Bounds2) -> Self {
        Self::new(self.min.sup(&other.min), self.max.inf(&other.max))
    }

    /// Grow every side by `margin`
    pub fn expanded(&self, margin: f64) -> Self {
        Self::new(
            self.min.add_scalar(-margin),
            self.max.add_scalar(margin),
        )
    }

    pub fn center(&self) -> Vector2D {
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> Vector2D {
        self.max - self.min
    }

    pub fn area(&self) -> f64 {
        let size = self.size();
        size.x * size.y
    }

    pub fn corners(&self) -> [Vector2D; 4] {
        [
            Vector2D::new(self.min.x, self.min.y),
            Vector2D::new(self.max.x, self.min.y),
            Vector2D::new(self.max.x, self.max.y),
            Vector2D::new(self.min.x, self.max.y),
        ]
    }

    /// Check if two boxes agree within tolerance
    pub fn approx_eq(&self, other: &Bounds2, tolerance: f64) -> bool {
        (self.min - other.min).amax() < tolerance && (self.max - other.max).amax() < tolerance
    }
}

impl Bounds3 {
    pub fn new(min: Vector3D, max: Vector3D) -> Self {
        Self { min, max }
    }

    /// Box containing nothing; expanding it by a point yields that point
    pub fn empty() -> Self {
        Self {
            min: Vector3D::repeat(f64::INFINITY),
            max: Vector3D::repeat(f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector3D>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.expand_to_include(p);
        }
        bounds
    }

    pub fn expand_to_include(&mut self, p: &Vector3D) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&self, other: &Bounds3) -> Self {
        Self::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Overlap of both boxes; empty when they are disjoint
    pub fn intersection(&self, other: &Bounds3) -> Self {
        Self::new(self.min.sup(&other.min), self.max.inf(&other.max))
    }

    /// Grow every side by `margin`
    pub fn expanded(&self, margin: f64) -> Self {
        Self::new(
            self.min.add_scalar(-margin),
            self.max.add_scalar(margin),
        )
    }

    pub fn center(&self) -> Vector3D {
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> Vector3D {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let size = self.size();
        size.x * size.y * size.z
    }

    pub fn corners(&self) -> [Vector3D; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vector3D::new(lo.x, lo.y, lo.z),
            Vector3D::new(hi.x, lo.y, lo.z),
            Vector3D::new(lo.x, hi.y, lo.z),
            Vector3D::new(hi.x, hi.y, lo.z),
            Vector3D::new(lo.x, lo.y, hi.z),
            Vector3D::new(hi.x, lo.y, hi.z),
            Vector3D::new(lo.x, hi.y, hi.z),
            Vector3D::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Check if two boxes agree within tolerance
    pub fn approx_eq(&self, other: &Bounds3, tolerance: f64) -> bool {
        (self.min - other.min).amax() < tolerance && (self.max - other.max).amax() < tolerance
    }
}
