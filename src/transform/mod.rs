// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Affine transform algebra
//!
//! [`Transform2D`] and [`Transform3D`] are immutable values built from
//! translate, rotate, scale and mirror primitives. Composition follows the
//! matrix-multiplication convention: in `compose([t1, t2, t3])` a point is
//! moved by `t3` first and by `t1` last, exactly as `t1 * t2 * t3 * p`.
//!
//! Composed transforms are always flat. Nested compositions are spliced into
//! the parent list, identities are dropped, and an empty list collapses to
//! the identity, so repeated composition never builds wrapper chains.

mod transform2d;
mod transform3d;

pub use transform2d::{Transform2D, Transform2DKind};
pub use transform3d::{Transform3D, Transform3DKind};

use crate::error::{Error, Result};
use crate::vector::{Vector2D, Vector3D};

/// Flatten `items` into a single list, skipping identities and splicing
/// composed children in place
fn flatten<T, I>(
    items: I,
    is_identity: impl Fn(&T) -> bool,
    composed_parts: impl Fn(&T) -> Option<&[T]>,
) -> Vec<T>
where
    T: Clone,
    I: IntoIterator,
    I::Item: std::borrow::Borrow<T>,
{
    use std::borrow::Borrow;

    let mut flat = Vec::new();
    for item in items {
        let item = item.borrow();
        if is_identity(item) {
            continue;
        }
        match composed_parts(item) {
            Some(parts) => flat.extend(parts.iter().cloned()),
            None => flat.push(item.clone()),
        }
    }
    flat
}

fn check_scale(axis: char, factor: f64) -> Result<()> {
    if factor == 0.0 {
        return Err(Error::ZeroScale { axis });
    }
    if !factor.is_finite() {
        return Err(Error::invalid(
            "scale",
            format!("factor on axis {axis} is not finite: {factor}"),
        ));
    }
    Ok(())
}

fn unit_normal_2d(normal: Vector2D) -> Result<Vector2D> {
    let len = normal.norm();
    if len == 0.0 || !len.is_finite() {
        return Err(Error::ZeroNormal);
    }
    Ok(normal / len)
}

fn unit_normal_3d(normal: Vector3D) -> Result<Vector3D> {
    let len = normal.norm();
    if len == 0.0 || !len.is_finite() {
        return Err(Error::ZeroNormal);
    }
    Ok(normal / len)
}
