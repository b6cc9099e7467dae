// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Angle value type
//!
//! An [`Angle`] stores a single fraction of a full turn. The value is never
//! normalized: `Angle::from_degrees(720.0)` and `Angle::from_degrees(0.0)`
//! describe the same rotation but compare unequal, and multi-turn values
//! (e.g. a 900° extrusion twist) survive every conversion unchanged.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Immutable angle measured in rotations (1.0 = 360°)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Angle {
    rotations: f64,
}

impl Angle {
    pub const ZERO: Angle = Angle { rotations: 0.0 };
    pub const FULL: Angle = Angle { rotations: 1.0 };

    pub const fn from_rotations(rotations: f64) -> Self {
        Self { rotations }
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            rotations: degrees / 360.0,
        }
    }

    pub fn from_radians(radians: f64) -> Self {
        Self {
            rotations: radians / TAU,
        }
    }

    pub fn rotations(self) -> f64 {
        self.rotations
    }

    pub fn degrees(self) -> f64 {
        self.rotations * 360.0
    }

    pub fn radians(self) -> f64 {
        self.rotations * TAU
    }

    /// Sine and cosine of the angle
    pub fn sin_cos(self) -> (f64, f64) {
        self.radians().sin_cos()
    }
}

/// Shorthand for [`Angle::from_rotations`]
pub fn rotations(value: f64) -> Angle {
    Angle::from_rotations(value)
}

/// Shorthand for [`Angle::from_degrees`]
pub fn degrees(value: f64) -> Angle {
    Angle::from_degrees(value)
}

/// Shorthand for [`Angle::from_radians`]
pub fn radians(value: f64) -> Angle {
    Angle::from_radians(value)
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        Angle::from_rotations(-self.rotations)
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle::from_rotations(self.rotations + rhs.rotations)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Angle {
        Angle::from_rotations(self.rotations - rhs.rotations)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;

    fn mul(self, rhs: f64) -> Angle {
        Angle::from_rotations(self.rotations * rhs)
    }
}

impl Div<f64> for Angle {
    type Output = Angle;

    fn div(self, rhs: f64) -> Angle {
        Angle::from_rotations(self.rotations / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_unit_conversions() {
        let a = degrees(90.0);
        assert_relative_eq!(a.rotations(), 0.25);
        assert_relative_eq!(a.radians(), PI / 2.0);

        let b = radians(PI);
        assert_relative_eq!(b.degrees(), 180.0, epsilon = 1e-12);
        assert_relative_eq!(rotations(0.5).radians(), PI);
    }

    #[test]
    fn test_no_normalization() {
        let twice = degrees(720.0);
        assert_eq!(twice.rotations(), 2.0);
        assert_ne!(twice, degrees(0.0));

        let (s, c) = twice.sin_cos();
        assert_relative_eq!(s, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c, 1.0, epsilon = 1e-12);

        assert_eq!(rotations(-3.25).rotations(), -3.25);
    }

    #[test]
    fn test_arithmetic() {
        let a = degrees(30.0) + degrees(60.0);
        assert_relative_eq!(a.degrees(), 90.0, epsilon = 1e-12);
        assert_relative_eq!((-a).degrees(), -90.0, epsilon = 1e-12);
        assert_relative_eq!((a * 4.0).rotations(), 1.0, epsilon = 1e-12);
    }
}
