// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lowering of expression trees to OpenSCAD source

use crate::ast::{
    BooleanOp, CacheGraph, CacheStats, Geometry2D, Geometry2DKind, Geometry3D, Geometry3DKind,
    Modifiers, NodeId, NodeRef, Offset, TEXT_SIZE,
};
use crate::transform::{Transform2D, Transform2DKind, Transform3D, Transform3DKind};
use crate::vector::{Vector2D, Vector3D};
use ahash::AHashMap;
use sha2::{Digest, Sha256};
use std::fmt::{self, Write as _};
use std::path::Path;

const HEADER: &str = "// Generated by polyframe-csg\n";

/// Monospaced font whose cells match the glyph cell constants
const TEXT_FONT: &str = "Consolas:style=Regular";

/// Dimension of a cached unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Two,
    Three,
}

/// One `module` definition holding a cached unit
#[derive(Debug, Clone)]
pub struct ScadUnit {
    /// Module name, `unit_` followed by a digest prefix
    pub name: String,
    /// Hex SHA-256 of the unit's body
    pub digest: String,
    pub dimension: Dimension,
    body: String,
}

impl ScadUnit {
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// OpenSCAD program for one root node
///
/// Each cached unit is defined once as a module, in dependency order, and
/// every reference to it is a module call. Units with identical content share
/// one module.
#[derive(Debug, Clone)]
pub struct ScadProgram {
    units: Vec<ScadUnit>,
    root: String,
    stats: CacheStats,
}

impl ScadProgram {
    pub fn from_2d(root: &Geometry2D) -> Self {
        let mut emitter = Emitter::default();
        let mut out = String::new();
        emitter.emit_2d(root, 0, &mut out);
        Self {
            units: emitter.units,
            root: out,
            stats: CacheGraph::from_node(NodeRef::Planar(root)).stats(),
        }
    }

    pub fn from_3d(root: &Geometry3D) -> Self {
        let mut emitter = Emitter::default();
        let mut out = String::new();
        emitter.emit_3d(root, 0, &mut out);
        Self {
            units: emitter.units,
            root: out,
            stats: CacheGraph::from_node(NodeRef::Solid(root)).stats(),
        }
    }

    pub fn units(&self) -> &[ScadUnit] {
        &self.units
    }

    /// Top-level statement of the program
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Standalone program rendering only `units[index]`
    pub fn unit_program(&self, index: usize) -> Option<String> {
        let unit = self.units.get(index)?;
        let mut out = String::from(HEADER);
        for prior in &self.units[..index] {
            write_module(&mut out, prior);
        }
        out.push_str(&unit.body);
        Some(out)
    }

    /// Replace the body of a unit, e.g. with an import of its rendered mesh
    pub(crate) fn replace_body(&mut self, index: usize, body: String) {
        if let Some(unit) = self.units.get_mut(index) {
            unit.body = body;
        }
    }

    pub fn source(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScadProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::from(HEADER);
        for unit in &self.units {
            write_module(&mut out, unit);
        }
        out.push_str(&self.root);
        f.write_str(&out)
    }
}

fn write_module(out: &mut String, unit: &ScadUnit) {
    let _ = writeln!(out, "module {}() {{", unit.name);
    for line in unit.body.lines() {
        let _ = writeln!(out, "  {line}");
    }
    out.push_str("}\n\n");
}

/// Number formatted so that parsing it back yields the same value
pub(crate) fn num(value: f64) -> String {
    if value.is_nan() {
        "(0/0)".to_string()
    } else if value == f64::INFINITY {
        "(1/0)".to_string()
    } else if value == f64::NEG_INFINITY {
        "(-1/0)".to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

fn vec2(v: &Vector2D) -> String {
    format!("[{}, {}]", num(v.x), num(v.y))
}

fn vec3(v: &Vector3D) -> String {
    format!("[{}, {}, {}]", num(v.x), num(v.y), num(v.z))
}

fn index_lists(lists: &[Vec<usize>]) -> String {
    let inner: Vec<String> = lists
        .iter()
        .map(|l| {
            let items: Vec<String> = l.iter().map(usize::to_string).collect();
            format!("[{}]", items.join(", "))
        })
        .collect();
    format!("[{}]", inner.join(", "))
}

pub(crate) fn quote(path: &Path) -> String {
    string_literal(&path.display().to_string())
}

fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn prefix(modifiers: Modifiers) -> &'static str {
    match (modifiers.disabled, modifiers.debug) {
        (true, true) => "*#",
        (true, false) => "*",
        (false, true) => "#",
        (false, false) => "",
    }
}

fn transform_2d_heads(t: &Transform2D, heads: &mut Vec<String>) {
    match t.kind() {
        Transform2DKind::Identity => {}
        Transform2DKind::Translate(v) => heads.push(format!("translate({})", vec2(v))),
        Transform2DKind::Rotate(a) => heads.push(format!("rotate({})", num(a.degrees()))),
        Transform2DKind::Scale(v) => heads.push(format!("scale({})", vec2(v))),
        Transform2DKind::Mirror(n) => heads.push(format!("mirror({})", vec2(n))),
        Transform2DKind::Composed(parts) => {
            for part in parts.iter() {
                transform_2d_heads(part, heads);
            }
        }
    }
}

fn transform_3d_heads(t: &Transform3D, heads: &mut Vec<String>) {
    match t.kind() {
        Transform3DKind::Identity => {}
        Transform3DKind::Translate(v) => heads.push(format!("translate({})", vec3(v))),
        Transform3DKind::RotateX(a) => heads.push(format!("rotate([{}, 0, 0])", num(a.degrees()))),
        Transform3DKind::RotateY(a) => heads.push(format!("rotate([0, {}, 0])", num(a.degrees()))),
        Transform3DKind::RotateZ(a) => heads.push(format!("rotate([0, 0, {}])", num(a.degrees()))),
        Transform3DKind::Scale(v) => heads.push(format!("scale({})", vec3(v))),
        Transform3DKind::Mirror(n) => heads.push(format!("mirror({})", vec3(n))),
        Transform3DKind::Composed(parts) => {
            for part in parts.iter() {
                transform_3d_heads(part, heads);
            }
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// `head;` on its own line
fn statement(out: &mut String, depth: usize, modifiers: Modifiers, head: &str) {
    indent(out, depth);
    let _ = writeln!(out, "{}{};", prefix(modifiers), head);
}

fn open(out: &mut String, depth: usize, modifiers: Modifiers, head: &str) {
    indent(out, depth);
    let _ = writeln!(out, "{}{} {{", prefix(modifiers), head);
}

fn close(out: &mut String, depth: usize) {
    indent(out, depth);
    out.push_str("}\n");
}

#[derive(Default)]
struct Emitter {
    units: Vec<ScadUnit>,
    /// Module name per cached node
    names: AHashMap<NodeId, String>,
    /// Module name per body digest
    by_digest: AHashMap<String, String>,
}

impl Emitter {
    fn define(&mut self, id: NodeId, dimension: Dimension, body: String) -> String {
        let tag = match dimension {
            Dimension::Two => "2d\n",
            Dimension::Three => "3d\n",
        };
        let mut hasher = Sha256::new();
        hasher.update(tag.as_bytes());
        hasher.update(body.as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        let name = match self.by_digest.get(&digest) {
            Some(existing) => existing.clone(),
            None => {
                let name = format!("unit_{}", &digest[..16]);
                self.by_digest.insert(digest.clone(), name.clone());
                self.units.push(ScadUnit {
                    name: name.clone(),
                    digest,
                    dimension,
                    body,
                });
                name
            }
        };
        self.names.insert(id, name.clone());
        name
    }

    fn emit_2d(&mut self, g: &Geometry2D, depth: usize, out: &mut String) {
        let m = g.modifiers();
        match g.kind() {
            Geometry2DKind::Polygon { points, paths } => {
                let pts: Vec<String> = points.iter().map(vec2).collect();
                let head = match paths {
                    Some(paths) => format!(
                        "polygon(points=[{}], paths={})",
                        pts.join(", "),
                        index_lists(paths)
                    ),
                    None => format!("polygon(points=[{}])", pts.join(", ")),
                };
                statement(out, depth, m, &head);
            }
            Geometry2DKind::Transformed { transform, child } => {
                let mut heads = Vec::new();
                transform_2d_heads(transform, &mut heads);
                let head = if heads.is_empty() {
                    "union()".to_string()
                } else {
                    heads.join(" ")
                };
                open(out, depth, m, &head);
                self.emit_2d(child, depth + 1, out);
                close(out, depth);
            }
            Geometry2DKind::Boolean { op, children } => {
                open(out, depth, m, &format!("{}()", op.name()));
                for child in children {
                    self.emit_2d(child, depth + 1, out);
                }
                close(out, depth);
            }
            Geometry2DKind::Offset { offset, children } => {
                let head = match *offset {
                    Offset::Delta { delta, chamfer } => {
                        format!("offset(delta={}, chamfer={})", num(delta), chamfer)
                    }
                    Offset::Round { radius, resolution } => {
                        format!("offset(r={}, $fn={})", num(radius), resolution)
                    }
                };
                open(out, depth, m, &head);
                for child in children {
                    self.emit_2d(child, depth + 1, out);
                }
                close(out, depth);
            }
            Geometry2DKind::Projection { cut, child } => {
                open(out, depth, m, &format!("projection(cut={cut})"));
                self.emit_3d(child, depth + 1, out);
                close(out, depth);
            }
            Geometry2DKind::Text { text, resolution } => {
                let head = format!(
                    "text({}, size={}, font={}, halign=\"left\", valign=\"baseline\", \
                     direction=\"ltr\", language=\"en\", script=\"latin\", $fn={})",
                    string_literal(text),
                    num(TEXT_SIZE),
                    string_literal(TEXT_FONT),
                    resolution
                );
                statement(out, depth, m, &head);
            }
            Geometry2DKind::Cached(body) => {
                let name = match self.names.get(&g.id()) {
                    Some(name) => name.clone(),
                    None => {
                        let mut text = String::new();
                        self.emit_2d(body, 0, &mut text);
                        self.define(g.id(), Dimension::Two, text)
                    }
                };
                statement(out, depth, m, &format!("{name}()"));
            }
        }
    }

    fn emit_3d(&mut self, g: &Geometry3D, depth: usize, out: &mut String) {
        let m = g.modifiers();
        match g.kind() {
            Geometry3DKind::Polyhedron { points, faces } => {
                let pts: Vec<String> = points.iter().map(vec3).collect();
                let head = format!(
                    "polyhedron(points=[{}], faces={})",
                    pts.join(", "),
                    index_lists(faces)
                );
                statement(out, depth, m, &head);
            }
            Geometry3DKind::Transformed { transform, child } => {
                let mut heads = Vec::new();
                transform_3d_heads(transform, &mut heads);
                let head = if heads.is_empty() {
                    "union()".to_string()
                } else {
                    heads.join(" ")
                };
                open(out, depth, m, &head);
                self.emit_3d(child, depth + 1, out);
                close(out, depth);
            }
            Geometry3DKind::Boolean { op, children } => {
                open(out, depth, m, &format!("{}()", op.name()));
                for child in children {
                    self.emit_3d(child, depth + 1, out);
                }
                close(out, depth);
            }
            Geometry3DKind::LinearExtrude { params, child } => {
                let head = format!(
                    "linear_extrude(height={}, center={}, twist={}, scale={}, slices={})",
                    num(params.height),
                    params.center,
                    num(params.twist.degrees()),
                    num(params.scale),
                    params.slices
                );
                open(out, depth, m, &head);
                self.emit_2d(child, depth + 1, out);
                close(out, depth);
            }
            Geometry3DKind::RotateExtrude {
                angle,
                resolution,
                child,
            } => {
                let head = format!(
                    "rotate_extrude(angle={}, $fn={})",
                    num(angle.degrees()),
                    resolution
                );
                open(out, depth, m, &head);
                self.emit_2d(child, depth + 1, out);
                close(out, depth);
            }
            Geometry3DKind::Color { color, child } => {
                let head = format!(
                    "color([{}, {}, {}, {}])",
                    num(color.r),
                    num(color.g),
                    num(color.b),
                    num(color.a)
                );
                open(out, depth, m, &head);
                self.emit_3d(child, depth + 1, out);
                close(out, depth);
            }
            Geometry3DKind::Imported { path, .. } => {
                statement(out, depth, m, &format!("import({})", quote(path)));
            }
            Geometry3DKind::Cached(body) => {
                let name = match self.names.get(&g.id()) {
                    Some(name) => name.clone(),
                    None => {
                        let mut text = String::new();
                        self.emit_3d(body, 0, &mut text);
                        self.define(g.id(), Dimension::Three, text)
                    }
                };
                statement(out, depth, m, &format!("{name}()"));
            }
        }
    }
}
