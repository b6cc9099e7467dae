// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Constructors, combinators and extent queries for geometry nodes

use super::node::{
    BooleanOp, Geometry2D, Geometry2DKind, Geometry3D, Geometry3DKind, LinearExtrude, Offset,
};
use crate::angle::Angle;
use crate::color::Color;
use crate::engine::{Bounds2, Bounds3, GeometryEngine, MeshFormat};
use crate::error::{require_len, require_non_negative, require_resolution, Error, Result};
use crate::transform::{Transform2D, Transform3D};
use crate::vector::{Vector2D, Vector3D};
use std::borrow::Borrow;
use std::ops::{BitAnd, BitOr, Sub};
use std::path::PathBuf;
use tracing::trace;

fn collect_children<G, I>(what: &'static str, children: I) -> Result<Vec<G>>
where
    G: Clone,
    I: IntoIterator,
    I::Item: Borrow<G>,
{
    let children: Vec<G> = children.into_iter().map(|c| c.borrow().clone()).collect();
    require_len(what, 1, children.len())?;
    Ok(children)
}

fn check_indices(what: &'static str, indices: &[usize], len: usize) -> Result<()> {
    require_len(what, 3, indices.len())?;
    match indices.iter().find(|&&index| index >= len) {
        Some(&index) => Err(Error::IndexOutOfRange { what, index, len }),
        None => Ok(()),
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::invalid(name, format!("must be finite, got {value}")));
    }
    Ok(())
}

macro_rules! combinators {
    ($handle:ident, $kind:ident, $bounds:ident, $vector:ident, $bounds_fn:ident) => {
        impl $handle {
            fn combine<I>(op: BooleanOp, children: I) -> Result<Self>
            where
                I: IntoIterator,
                I::Item: Borrow<$handle>,
            {
                let children: Vec<$handle> = collect_children(op.name(), children)?;
                Ok(Self::from_kind($kind::Boolean { op, children }))
            }

            /// Union of one or more shapes
            pub fn union<I>(children: I) -> Result<Self>
            where
                I: IntoIterator,
                I::Item: Borrow<$handle>,
            {
                Self::combine(BooleanOp::Union, children)
            }

            pub fn intersection<I>(children: I) -> Result<Self>
            where
                I: IntoIterator,
                I::Item: Borrow<$handle>,
            {
                Self::combine(BooleanOp::Intersection, children)
            }

            /// Convex hull of one or more shapes
            pub fn hull<I>(children: I) -> Result<Self>
            where
                I: IntoIterator,
                I::Item: Borrow<$handle>,
            {
                Self::combine(BooleanOp::Hull, children)
            }

            /// Minkowski sum of one or more shapes
            pub fn minkowski<I>(children: I) -> Result<Self>
            where
                I: IntoIterator,
                I::Item: Borrow<$handle>,
            {
                Self::combine(BooleanOp::Minkowski, children)
            }

            pub fn union_with(&self, other: &Self) -> Self {
                Self::from_kind($kind::Boolean {
                    op: BooleanOp::Union,
                    children: vec![self.clone(), other.clone()],
                })
            }

            pub fn intersection_with(&self, other: &Self) -> Self {
                Self::from_kind($kind::Boolean {
                    op: BooleanOp::Intersection,
                    children: vec![self.clone(), other.clone()],
                })
            }

            /// `self` minus the union of `cutouts`
            ///
            /// With no cutouts the result is `self`.
            pub fn difference<I>(&self, cutouts: I) -> Self
            where
                I: IntoIterator,
                I::Item: Borrow<$handle>,
            {
                let mut children = vec![self.clone()];
                children.extend(cutouts.into_iter().map(|c| c.borrow().clone()));
                if children.len() == 1 {
                    return self.clone();
                }
                Self::from_kind($kind::Boolean {
                    op: BooleanOp::Difference,
                    children,
                })
            }

            /// Extent of the resolved geometry
            ///
            /// The first successful query asks `engine` and memoizes the
            /// result on the node; later queries on any handle to the node
            /// return the memo.
            pub fn bounds<E>(&self, engine: &E) -> Result<$bounds>
            where
                E: GeometryEngine + ?Sized,
            {
                if let Some(bounds) = self.node.bounds.get() {
                    trace!(node = self.id(), "bounds memo hit");
                    return Ok(*bounds);
                }
                let computed = engine.$bounds_fn(&self.plain())?;
                Ok(*self.node.bounds.get_or_init(|| computed))
            }

            pub fn min<E>(&self, engine: &E) -> Result<$vector>
            where
                E: GeometryEngine + ?Sized,
            {
                Ok(self.bounds(engine)?.min)
            }

            pub fn max<E>(&self, engine: &E) -> Result<$vector>
            where
                E: GeometryEngine + ?Sized,
            {
                Ok(self.bounds(engine)?.max)
            }
        }

        impl BitOr for &$handle {
            type Output = $handle;

            fn bitor(self, rhs: Self) -> $handle {
                self.union_with(rhs)
            }
        }

        impl BitOr for $handle {
            type Output = $handle;

            fn bitor(self, rhs: Self) -> $handle {
                self.union_with(&rhs)
            }
        }

        impl BitAnd for &$handle {
            type Output = $handle;

            fn bitand(self, rhs: Self) -> $handle {
                self.intersection_with(rhs)
            }
        }

        impl BitAnd for $handle {
            type Output = $handle;

            fn bitand(self, rhs: Self) -> $handle {
                self.intersection_with(&rhs)
            }
        }

        impl Sub for &$handle {
            type Output = $handle;

            fn sub(self, rhs: Self) -> $handle {
                self.difference([rhs])
            }
        }

        impl Sub for $handle {
            type Output = $handle;

            fn sub(self, rhs: Self) -> $handle {
                self.difference([rhs])
            }
        }
    };
}

combinators!(Geometry2D, Geometry2DKind, Bounds2, Vector2D, bounds_2d);
combinators!(Geometry3D, Geometry3DKind, Bounds3, Vector3D, bounds_3d);

impl Geometry2D {
    /// Polygon whose points form a single outline in order
    pub fn polygon<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vector2D>,
    {
        let points: Vec<Vector2D> = points.into_iter().collect();
        require_len("polygon", 3, points.len())?;
        for p in &points {
            check_finite("polygon point", p.x)?;
            check_finite("polygon point", p.y)?;
        }
        Ok(Self::from_kind(Geometry2DKind::Polygon {
            points,
            paths: None,
        }))
    }

    /// Polygon with explicit outlines; later outlines cut holes in earlier
    /// ones
    pub fn polygon_with_paths<I, P, Q>(points: I, paths: P) -> Result<Self>
    where
        I: IntoIterator<Item = Vector2D>,
        P: IntoIterator<Item = Q>,
        Q: IntoIterator<Item = usize>,
    {
        let points: Vec<Vector2D> = points.into_iter().collect();
        let paths: Vec<Vec<usize>> = paths
            .into_iter()
            .map(|path| path.into_iter().collect())
            .collect();
        require_len("polygon", 3, points.len())?;
        require_len("polygon paths", 1, paths.len())?;
        for path in &paths {
            check_indices("polygon path", path, points.len())?;
        }
        Ok(Self::from_kind(Geometry2DKind::Polygon {
            points,
            paths: Some(paths),
        }))
    }

    /// Move the outline of the shapes by `delta`
    pub fn offset<I>(delta: f64, chamfer: bool, children: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Borrow<Geometry2D>,
    {
        check_finite("delta", delta)?;
        let children: Vec<Geometry2D> = collect_children("offset", children)?;
        Ok(Self::from_kind(Geometry2DKind::Offset {
            offset: Offset::Delta { delta, chamfer },
            children,
        }))
    }

    /// Move the outline of the shapes by `radius`, rounding corners
    pub fn offset_round<I>(radius: f64, resolution: u32, children: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Borrow<Geometry2D>,
    {
        check_finite("radius", radius)?;
        require_resolution(resolution)?;
        let children: Vec<Geometry2D> = collect_children("offset_round", children)?;
        Ok(Self::from_kind(Geometry2DKind::Offset {
            offset: Offset::Round { radius, resolution },
            children,
        }))
    }

    /// Unscaled glyphs of `text`; see [`crate::shapes::text_2d`] for sized
    /// lettering
    pub fn text(text: &str, resolution: u32) -> Result<Self> {
        require_resolution(resolution)?;
        Ok(Self::from_kind(Geometry2DKind::Text {
            text: text.to_string(),
            resolution,
        }))
    }

    /// Flatten `solid` onto the xy plane
    ///
    /// With `cut` only the section at z = 0 is kept.
    pub fn project(cut: bool, solid: &Geometry3D) -> Self {
        Self::from_kind(Geometry2DKind::Projection {
            cut,
            child: solid.clone(),
        })
    }

    pub fn transform(&self, transform: &Transform2D) -> Self {
        transform.transform(self)
    }

    /// Sweep along +z; see [`Geometry3D::linear_extrude`]
    pub fn extrude(&self, height: f64) -> Result<Geometry3D> {
        Geometry3D::linear_extrude(LinearExtrude::new(height), self)
    }
}

impl Geometry3D {
    /// Polyhedron from vertices and faces of vertex indices
    pub fn polyhedron<I, F, Q>(points: I, faces: F) -> Result<Self>
    where
        I: IntoIterator<Item = Vector3D>,
        F: IntoIterator<Item = Q>,
        Q: IntoIterator<Item = usize>,
    {
        let points: Vec<Vector3D> = points.into_iter().collect();
        let faces: Vec<Vec<usize>> = faces
            .into_iter()
            .map(|face| face.into_iter().collect())
            .collect();
        require_len("polyhedron", 4, points.len())?;
        require_len("polyhedron faces", 4, faces.len())?;
        for p in &points {
            check_finite("polyhedron point", p.x)?;
            check_finite("polyhedron point", p.y)?;
            check_finite("polyhedron point", p.z)?;
        }
        for face in &faces {
            check_indices("polyhedron face", face, points.len())?;
        }
        Ok(Self::from_kind(Geometry3DKind::Polyhedron { points, faces }))
    }

    /// Sweep `profile` along +z, twisting and scaling across the slices
    pub fn linear_extrude(params: LinearExtrude, profile: &Geometry2D) -> Result<Self> {
        require_non_negative("height", params.height)?;
        require_non_negative("scale", params.scale)?;
        check_finite("twist", params.twist.rotations())?;
        if params.slices == 0 {
            return Err(Error::invalid("slices", "must be at least 1"));
        }
        Ok(Self::from_kind(Geometry3DKind::LinearExtrude {
            params,
            child: profile.clone(),
        }))
    }

    /// Sweep `profile` around the z axis through `angle`
    pub fn rotate_extrude(angle: Angle, resolution: u32, profile: &Geometry2D) -> Result<Self> {
        require_resolution(resolution)?;
        check_finite("angle", angle.rotations())?;
        if angle.rotations() == 0.0 {
            return Err(Error::invalid("angle", "sweep angle must not be zero"));
        }
        Ok(Self::from_kind(Geometry3DKind::RotateExtrude {
            angle,
            resolution,
            child: profile.clone(),
        }))
    }

    pub fn color(&self, color: Color) -> Self {
        Self::from_kind(Geometry3DKind::Color {
            color,
            child: self.clone(),
        })
    }

    /// Leaf node referring to a mesh file that the engine loads
    pub fn imported(path: impl Into<PathBuf>, format: MeshFormat) -> Self {
        Self::from_kind(Geometry3DKind::Imported {
            path: path.into(),
            format,
        })
    }

    /// See [`Geometry2D::project`]
    pub fn project(&self, cut: bool) -> Geometry2D {
        Geometry2D::project(cut, self)
    }

    pub fn transform(&self, transform: &Transform3D) -> Self {
        transform.transform(self)
    }
}
