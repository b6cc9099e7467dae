// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Primitive shapes
//!
//! Every shape is assembled from polygons, transforms and combinators, so the
//! result is an ordinary expression tree. Round shapes are approximated with
//! `resolution` segments per full turn. Shapes with a `center_z` flag are
//! centered on z = 0 when it is set and rest on z = 0 otherwise.

use crate::angle::Angle;
use crate::ast::{Geometry2D, Geometry3D, LinearExtrude, BASELINE_RATIO, GLYPH_ADVANCE, GLYPH_HEIGHT};
use crate::error::{require_non_negative, require_resolution, Error, Result};
use crate::transform::{Transform2D, Transform3D};
use crate::vector::{vector2d, Polar2D, Vector2D, Vector3D};

/// Steps used along the arc of a cutout pie
const PIE_STEPS: u32 = 8;

fn unit_circle(resolution: u32) -> Result<Geometry2D> {
    require_resolution(resolution)?;
    let step = 1.0 / f64::from(resolution);
    Geometry2D::polygon(
        (0..resolution).map(|i| Polar2D::new(0.5, Angle::from_rotations(f64::from(i) * step)).to_vector()),
    )
}

fn unit_square() -> Result<Geometry2D> {
    Geometry2D::polygon([
        vector2d(-0.5, -0.5),
        vector2d(0.5, -0.5),
        vector2d(0.5, 0.5),
        vector2d(-0.5, 0.5),
    ])
}

/// Counter-clockwise span from `begin` to `end`, in rotations
///
/// Both angles are taken modulo a full turn, so the span lies in (0, 1].
/// Equal angles span a full turn.
fn span(begin: Angle, end: Angle) -> f64 {
    let turn = (end.rotations() - begin.rotations()).rem_euclid(1.0);
    if turn == 0.0 {
        1.0
    } else {
        turn
    }
}

fn lift(z: f64, center_z: bool, solid: Geometry3D) -> Geometry3D {
    if center_z {
        solid
    } else {
        Transform3D::translate_z(z).transform(&solid)
    }
}

fn extrude_centered(height: f64, profile: &Geometry2D) -> Result<Geometry3D> {
    Geometry3D::linear_extrude(LinearExtrude::new(height).centered(true), profile)
}

pub fn circle(diameter: f64, resolution: u32) -> Result<Geometry2D> {
    require_non_negative("diameter", diameter)?;
    let scale = Transform2D::scale_uniform(diameter)?;
    Ok(scale.transform(&unit_circle(resolution)?))
}

/// Circular sector from `begin` to `end`
pub fn pie(diameter: f64, begin: Angle, end: Angle, resolution: u32) -> Result<Geometry2D> {
    require_non_negative("diameter", diameter)?;
    require_resolution(resolution)?;
    let sweep = span(begin, end);
    let steps = ((f64::from(resolution) * sweep).ceil() as u32).max(2);
    let r = diameter / 2.0;

    let mut points = vec![Vector2D::zeros()];
    points.extend((0..=steps).map(|i| {
        let phi = begin + Angle::from_rotations(sweep * f64::from(i) / f64::from(steps));
        Polar2D::new(r, phi).to_vector()
    }));
    Geometry2D::polygon(points)
}

/// Coarse sector reaching twice `diameter` from the origin, used to cut
/// segments out of round shapes
pub fn cutout_pie(diameter: f64, begin: Angle, end: Angle) -> Result<Geometry2D> {
    require_non_negative("diameter", diameter)?;
    let step = span(begin, end) / f64::from(PIE_STEPS);
    let r = diameter;

    let mut points = vec![Vector2D::zeros()];
    points.extend((0..=PIE_STEPS).map(|i| {
        Polar2D::new(r, begin + Angle::from_rotations(f64::from(i) * step)).to_vector()
    }));
    Geometry2D::polygon(points)
}

pub fn circle_segment(diameter: f64, begin: Angle, end: Angle, resolution: u32) -> Result<Geometry2D> {
    let circle = circle(diameter, resolution)?;
    let pie = cutout_pie(diameter, begin, end)?;
    Ok(circle.intersection_with(&pie))
}

/// Disc with a concentric hole
pub fn ring(inner_diameter: f64, outer_diameter: f64, resolution: u32) -> Result<Geometry2D> {
    require_non_negative("inner_diameter", inner_diameter)?;
    if inner_diameter >= outer_diameter {
        return Err(Error::invalid(
            "inner_diameter",
            format!("must be smaller than the outer diameter {outer_diameter}, got {inner_diameter}"),
        ));
    }
    let outer = circle(outer_diameter, resolution)?;
    if inner_diameter == 0.0 {
        return Ok(outer);
    }
    Ok(outer.difference([circle(inner_diameter, resolution)?]))
}

pub fn ring_segment(
    inner_diameter: f64,
    outer_diameter: f64,
    begin: Angle,
    end: Angle,
    resolution: u32,
) -> Result<Geometry2D> {
    let ring = ring(inner_diameter, outer_diameter, resolution)?;
    let pie = cutout_pie(outer_diameter, begin, end)?;
    Ok(ring.intersection_with(&pie))
}

/// Rectangle centered on the origin
pub fn rectangle(x_size: f64, y_size: f64) -> Result<Geometry2D> {
    require_non_negative("x_size", x_size)?;
    require_non_negative("y_size", y_size)?;
    Ok(Transform2D::scale(x_size, y_size)?.transform(&unit_square()?))
}

/// Rectangle spanning two opposite corners
pub fn rectangle_corners(a: &Vector2D, b: &Vector2D) -> Result<Geometry2D> {
    let size = (b - a).abs();
    let center = a.inf(b) + size / 2.0;
    rectangle_center(&center, size.x, size.y)
}

pub fn rectangle_center(center: &Vector2D, x_size: f64, y_size: f64) -> Result<Geometry2D> {
    Ok(Transform2D::translate_vec(center).transform(&rectangle(x_size, y_size)?))
}

/// Triangle with the right angle at the origin and legs along +x and +y
pub fn right_triangle(x_size: f64, y_size: f64) -> Result<Geometry2D> {
    require_non_negative("x_size", x_size)?;
    require_non_negative("y_size", y_size)?;
    Geometry2D::polygon([vector2d(0.0, 0.0), vector2d(x_size, 0.0), vector2d(0.0, y_size)])
}

/// Sphere swept from a half circle
pub fn sphere(diameter: f64, resolution: u32, center_z: bool) -> Result<Geometry3D> {
    require_non_negative("diameter", diameter)?;
    require_resolution(resolution)?;
    let steps = (resolution / 2).max(2);
    let half = Geometry2D::polygon((0..=steps).map(|i| {
        let phi = Angle::from_rotations(-0.25 + 0.5 * f64::from(i) / f64::from(steps));
        Polar2D::new(0.5, phi).to_vector()
    }))?;
    let unit = Geometry3D::rotate_extrude(Angle::FULL, resolution, &half)?;
    let sphere = Transform3D::scale_uniform(diameter)?.transform(&unit);
    Ok(lift(diameter / 2.0, center_z, sphere))
}

/// Box centered on the origin in x and y
pub fn box3d(x_size: f64, y_size: f64, z_size: f64, center_z: bool) -> Result<Geometry3D> {
    require_non_negative("z_size", z_size)?;
    let solid = extrude_centered(z_size, &rectangle(x_size, y_size)?)?;
    Ok(lift(z_size / 2.0, center_z, solid))
}

pub fn box_center(center: &Vector3D, x_size: f64, y_size: f64, z_size: f64) -> Result<Geometry3D> {
    Ok(Transform3D::translate_vec(center).transform(&box3d(x_size, y_size, z_size, true)?))
}

/// Box spanning two opposite corners
pub fn box_corners(a: &Vector3D, b: &Vector3D) -> Result<Geometry3D> {
    let size = (b - a).abs();
    let center = a.inf(b) + size / 2.0;
    box_center(&center, size.x, size.y, size.z)
}

pub fn cylinder(diameter: f64, height: f64, resolution: u32, center_z: bool) -> Result<Geometry3D> {
    require_non_negative("height", height)?;
    let solid = extrude_centered(height, &circle(diameter, resolution)?)?;
    Ok(lift(height / 2.0, center_z, solid))
}

pub fn cylinder_segment(
    diameter: f64,
    height: f64,
    begin: Angle,
    end: Angle,
    resolution: u32,
    center_z: bool,
) -> Result<Geometry3D> {
    require_non_negative("height", height)?;
    let profile = circle_segment(diameter, begin, end, resolution)?;
    Ok(lift(height / 2.0, center_z, extrude_centered(height, &profile)?))
}

/// Cylinder clipped to `width` along x
pub fn flat_cylinder(
    diameter: f64,
    width: f64,
    height: f64,
    resolution: u32,
    center_z: bool,
) -> Result<Geometry3D> {
    require_non_negative("height", height)?;
    let profile = circle(diameter, resolution)?.intersection_with(&rectangle(width, diameter)?);
    Ok(lift(height / 2.0, center_z, extrude_centered(height, &profile)?))
}

pub fn hollow_cylinder(
    inner_diameter: f64,
    outer_diameter: f64,
    height: f64,
    resolution: u32,
    center_z: bool,
) -> Result<Geometry3D> {
    require_non_negative("height", height)?;
    let profile = ring(inner_diameter, outer_diameter, resolution)?;
    Ok(lift(height / 2.0, center_z, extrude_centered(height, &profile)?))
}

pub fn hollow_cylinder_segment(
    inner_diameter: f64,
    outer_diameter: f64,
    height: f64,
    begin: Angle,
    end: Angle,
    resolution: u32,
    center_z: bool,
) -> Result<Geometry3D> {
    require_non_negative("height", height)?;
    let profile = ring_segment(inner_diameter, outer_diameter, begin, end, resolution)?;
    Ok(lift(height / 2.0, center_z, extrude_centered(height, &profile)?))
}

fn frustum(
    bottom_diameter: f64,
    top_diameter: f64,
    height: f64,
    center_z: bool,
    profile: impl FnOnce(f64) -> Result<Geometry2D>,
) -> Result<Geometry3D> {
    require_non_negative("bottom_diameter", bottom_diameter)?;
    require_non_negative("top_diameter", top_diameter)?;
    require_non_negative("height", height)?;
    if bottom_diameter == 0.0 && top_diameter == 0.0 {
        return Err(Error::invalid(
            "bottom_diameter",
            "bottom and top diameter cannot both be zero",
        ));
    }

    // Extrude from the wider end and flip if that end is the top.
    let flip = bottom_diameter < top_diameter;
    let (wide, narrow) = if flip {
        (top_diameter, bottom_diameter)
    } else {
        (bottom_diameter, top_diameter)
    };
    let params = LinearExtrude::new(height)
        .with_scale(narrow / wide)
        .centered(true);
    let mut cone = Geometry3D::linear_extrude(params, &profile(wide)?)?;
    if flip {
        cone = Transform3D::mirror(0.0, 0.0, 1.0)?.transform(&cone);
    }
    Ok(lift(height / 2.0, center_z, cone))
}

/// Truncated cone; either diameter may be zero, but not both
pub fn cone(
    bottom_diameter: f64,
    top_diameter: f64,
    height: f64,
    resolution: u32,
    center_z: bool,
) -> Result<Geometry3D> {
    frustum(bottom_diameter, top_diameter, height, center_z, |d| {
        circle(d, resolution)
    })
}

pub fn cone_segment(
    bottom_diameter: f64,
    top_diameter: f64,
    height: f64,
    begin: Angle,
    end: Angle,
    resolution: u32,
    center_z: bool,
) -> Result<Geometry3D> {
    frustum(bottom_diameter, top_diameter, height, center_z, |d| {
        circle_segment(d, begin, end, resolution)
    })
}

/// Torus around the z axis
///
/// `large_diameter` is measured through the center of the tube.
pub fn torus(
    small_diameter: f64,
    large_diameter: f64,
    small_resolution: u32,
    large_resolution: u32,
    center_z: bool,
) -> Result<Geometry3D> {
    require_non_negative("small_diameter", small_diameter)?;
    if large_diameter < small_diameter {
        return Err(Error::invalid(
            "large_diameter",
            format!("tube of diameter {small_diameter} would cross the axis, got {large_diameter}"),
        ));
    }
    let tube = Transform2D::translate_x(large_diameter / 2.0)
        .transform(&circle(small_diameter, small_resolution)?);
    let torus = Geometry3D::rotate_extrude(Angle::FULL, large_resolution, &tube)?;
    Ok(lift(small_diameter / 2.0, center_z, torus))
}

pub fn torus_segment(
    small_diameter: f64,
    large_diameter: f64,
    begin: Angle,
    end: Angle,
    small_resolution: u32,
    large_resolution: u32,
    center_z: bool,
) -> Result<Geometry3D> {
    let torus = torus(
        small_diameter,
        large_diameter,
        small_resolution,
        large_resolution,
        true,
    )?;
    let pie = cutout_pie(large_diameter + small_diameter, begin, end)?;
    let cutter = extrude_centered(small_diameter + 2.0, &pie)?;
    Ok(lift(small_diameter / 2.0, center_z, torus.intersection_with(&cutter)))
}

/// Right-triangle prism with the right angle on the z axis
pub fn wedge(x_size: f64, y_size: f64, z_size: f64, center_z: bool) -> Result<Geometry3D> {
    require_non_negative("z_size", z_size)?;
    let solid = extrude_centered(z_size, &right_triangle(x_size, y_size)?)?;
    Ok(lift(z_size / 2.0, center_z, solid))
}

/// Height of a glyph cell `width` wide
pub fn char_height_2d(width: f64) -> f64 {
    width * GLYPH_HEIGHT / GLYPH_ADVANCE
}

/// Depth of the baseline above the bottom of a glyph cell `height` tall
pub fn char_baseline_2d(height: f64) -> f64 {
    BASELINE_RATIO * height
}

/// Glyph of `ch` scaled to a cell `width` wide, with the default height
pub fn char_2d(ch: char, width: f64, resolution: u32) -> Result<Geometry2D> {
    char_2d_sized(ch, width, char_height_2d(width), resolution)
}

/// Glyph of `ch` scaled to a `width` by `height` cell
///
/// The glyph starts at the origin and sits on the x axis. Each glyph is a
/// cached unit, so repeated letters are evaluated once.
pub fn char_2d_sized(ch: char, width: f64, height: f64, resolution: u32) -> Result<Geometry2D> {
    require_non_negative("width", width)?;
    require_non_negative("height", height)?;
    let glyph = Geometry2D::text(ch.encode_utf8(&mut [0; 4]), resolution)?;
    let scale = Transform2D::scale(width / GLYPH_ADVANCE, height / GLYPH_HEIGHT)?;
    Ok(scale.transform(&glyph).cache())
}

/// Monospaced line of text with `letter_width` cells
pub fn text_2d(text: &str, letter_width: f64, resolution: u32) -> Result<Geometry2D> {
    text_2d_sized(text, letter_width, char_height_2d(letter_width), resolution)
}

/// Monospaced line of text with `letter_width` by `letter_height` cells
///
/// Whitespace advances by one cell. Text without any visible character is
/// rejected.
pub fn text_2d_sized(
    text: &str,
    letter_width: f64,
    letter_height: f64,
    resolution: u32,
) -> Result<Geometry2D> {
    let mut glyphs = Vec::new();
    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let glyph = char_2d_sized(ch, letter_width, letter_height, resolution)?;
        let advance = Transform2D::translate(letter_width * i as f64, 0.0);
        glyphs.push(advance.transform(&glyph));
    }
    if glyphs.is_empty() {
        return Err(Error::invalid("text", format!("has no visible characters: {text:?}")));
    }
    Geometry2D::union(&glyphs)
}
