// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Transform algebra properties

use approx::assert_relative_eq;
use polyframe_csg::transform::{Transform2DKind, Transform3DKind};
use polyframe_csg::{
    degrees, shapes, vector2d, vector3d, GeometryEngine, LocalEngine, ScadProgram, Transform2D,
    Transform3D, Vector3D,
};

fn samples() -> Vec<Transform3D> {
    vec![
        Transform3D::identity(),
        Transform3D::translate(1.0, -2.0, 3.5),
        Transform3D::rotate_x(degrees(30.0)),
        Transform3D::rotate_y(degrees(-75.0)),
        Transform3D::rotate_z(degrees(200.0)),
        Transform3D::rotate(degrees(10.0), degrees(20.0), degrees(30.0)),
        Transform3D::scale(2.0, -0.5, 3.0).unwrap(),
        Transform3D::mirror(1.0, 1.0, 0.0).unwrap(),
        Transform3D::rotate_z_around(&vector3d(4.0, 4.0, 0.0), degrees(90.0)),
    ]
}

fn points() -> Vec<Vector3D> {
    vec![
        vector3d(0.0, 0.0, 0.0),
        vector3d(1.0, 2.0, 3.0),
        vector3d(-7.5, 0.25, 12.0),
    ]
}

fn assert_close(a: &Vector3D, b: &Vector3D) {
    assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
    assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
    assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
}

#[test]
fn test_inverse_undoes_every_transform() {
    let all = samples();
    let chained = Transform3D::compose(&all);
    for t in all.iter().chain(std::iter::once(&chained)) {
        for p in points() {
            let back = t.inverse().transform_point(&t.transform_point(&p));
            assert_close(&back, &p);
        }
    }
}

#[test]
fn test_compose_applies_last_transform_first() {
    let all = samples();
    let composed = Transform3D::compose(&all);
    for p in points() {
        let nested = all.iter().rev().fold(p, |acc, t| t.transform_point(&acc));
        assert_close(&composed.transform_point(&p), &nested);
    }
}

#[test]
fn test_empty_and_identity_compositions_are_identity() {
    let empty: [Transform3D; 0] = [];
    let a = Transform3D::compose(empty);
    let b = Transform3D::compose([Transform3D::identity(), Transform3D::identity()]);

    assert!(a.is_identity());
    assert!(b.is_identity());
    assert!(matches!(b.kind(), Transform3DKind::Identity));
    for p in points() {
        assert_eq!(a.transform_point(&p), p);
        assert_eq!(b.transform_direction(&p), p);
    }
}

#[test]
fn test_mirror_is_its_own_inverse() {
    let m = Transform3D::mirror(0.0, 3.0, 4.0).unwrap();
    assert_eq!(m.inverse().kind(), m.kind());
    for p in points() {
        let twice = m.inverse().transform_point(&m.inverse().transform_point(&p));
        assert_close(&twice, &p);
    }
}

#[test]
fn test_nested_compositions_flatten_to_leaves() {
    let t1 = Transform3D::translate_x(1.0);
    let t2 = Transform3D::rotate_z(degrees(90.0));
    let t3 = Transform3D::scale_uniform(2.0).unwrap();
    let t4 = Transform3D::translate_y(-3.0);

    let inner = Transform3D::compose([&t2, &t3]);
    let outer = Transform3D::compose([
        Transform3D::compose([&t1, &inner]),
        Transform3D::identity(),
        t4.clone(),
    ]);
    let flat = Transform3D::compose([&t1, &t2, &t3, &t4]);

    assert_eq!(outer.parts().len(), 4);
    assert!(outer
        .parts()
        .iter()
        .all(|t| !matches!(t.kind(), Transform3DKind::Composed(_))));
    for p in points() {
        assert_close(&outer.transform_point(&p), &flat.transform_point(&p));
    }
}

#[test]
fn test_repeated_composition_stays_flat() {
    let step = Transform3D::rotate_z(degrees(1.0));
    let mut acc = Transform3D::identity();
    for _ in 0..100 {
        acc = step.then_after(&acc);
    }
    assert_eq!(acc.parts().len(), 100);
    assert_close(
        &acc.transform_point(&vector3d(1.0, 0.0, 0.0)),
        &vector3d(degrees(100.0).radians().cos(), degrees(100.0).radians().sin(), 0.0),
    );
}

#[test]
fn test_rotate_then_translate_order() {
    let t = Transform3D::compose([
        Transform3D::rotate_z(degrees(90.0)),
        Transform3D::translate(5.0, 0.0, 0.0),
    ]);
    assert_close(&t.transform_point(&Vector3D::zeros()), &vector3d(0.0, 5.0, 0.0));
}

#[test]
fn test_square_keeps_corners_under_quarter_turn() {
    let corners = [
        vector2d(0.5, 0.5),
        vector2d(-0.5, 0.5),
        vector2d(-0.5, -0.5),
        vector2d(0.5, -0.5),
    ];
    let r = Transform2D::rotate(degrees(90.0));
    for c in corners {
        let moved = r.transform_point(&c);
        assert!(corners
            .iter()
            .any(|o| (o - moved).norm() < 1e-12));
    }
}

#[test]
fn test_planar_transforms_embed_in_space() {
    let t = Transform2D::compose([
        Transform2D::translate(1.0, 2.0),
        Transform2D::rotate(degrees(30.0)),
        Transform2D::scale(2.0, 3.0).unwrap(),
    ]);
    assert!(matches!(t.kind(), Transform2DKind::Composed(_)));

    let lifted = t.to_3d();
    let p = vector2d(0.75, -1.5);
    let q = t.transform_point(&p);
    let lifted_q = lifted.transform_point(&vector3d(p.x, p.y, 4.0));
    assert_relative_eq!(lifted_q.x, q.x, epsilon = 1e-12);
    assert_relative_eq!(lifted_q.y, q.y, epsilon = 1e-12);
    assert_relative_eq!(lifted_q.z, 4.0, epsilon = 1e-12);
}

#[test]
fn test_zero_scale_is_rejected_at_construction() {
    assert!(Transform3D::scale(1.0, 0.0, 1.0).is_err());
    assert!(Transform2D::scale_uniform(0.0).is_err());
    assert!(Transform3D::mirror(0.0, 0.0, 0.0).is_err());
    assert!(Transform3D::scale(-1.0, 1.0, 1.0).is_ok());
}

#[test]
fn test_identity_compositions_leave_geometry_untouched() {
    let solid = shapes::box3d(2.0, 3.0, 4.0, false).unwrap();
    let before = ScadProgram::from_3d(&solid).source();
    let empty: [Transform3D; 0] = [];

    for t in [
        Transform3D::compose(empty),
        Transform3D::compose([Transform3D::identity(), Transform3D::identity()]),
    ] {
        let moved = t.transform(&solid);
        assert!(moved.same_node(&solid));
        assert_eq!(ScadProgram::from_3d(&moved).source(), before);
    }

    let profile = shapes::rectangle(2.0, 1.0).unwrap();
    let empty: [Transform2D; 0] = [];
    let moved = Transform2D::compose(empty).transform(&profile);
    assert!(moved.same_node(&profile));
    assert_eq!(
        ScadProgram::from_2d(&moved).source(),
        ScadProgram::from_2d(&profile).source()
    );
}

#[test]
fn test_composition_nests_first_transform_outermost() {
    let engine = LocalEngine::new();
    let solid = shapes::box3d(2.0, 3.0, 4.0, false).unwrap();
    let t1 = Transform3D::translate(10.0, 0.0, 0.0);
    let t2 = Transform3D::rotate_z(degrees(90.0));
    let t3 = Transform3D::scale(2.0, 1.0, 1.0).unwrap();

    let composed = Transform3D::compose([&t1, &t2, &t3]).transform(&solid);
    let nested = t1.transform(&t2.transform(&t3.transform(&solid)));

    let source = ScadProgram::from_3d(&composed).source();
    assert_eq!(source, ScadProgram::from_3d(&nested).source());
    let translate = source.find("translate([10, 0, 0])").unwrap();
    let rotate = source.find("rotate([0, 0, 90])").unwrap();
    let scale = source.find("scale([2, 1, 1])").unwrap();
    assert!(translate < rotate && rotate < scale);

    let a = engine.bounds_3d(&composed).unwrap();
    let b = engine.bounds_3d(&nested).unwrap();
    assert_eq!(a, b);
    // Scaled to 4 x 3, turned to 3 x 4, then shifted along x
    assert_relative_eq!(a.min.x, 8.5, epsilon = 1e-9);
    assert_relative_eq!(a.max.x, 11.5, epsilon = 1e-9);
    assert_relative_eq!(a.max.y, 2.0, epsilon = 1e-9);

    let two = Transform3D::compose([&t1, &t2]).transform(&solid);
    assert_eq!(
        ScadProgram::from_3d(&two).source(),
        ScadProgram::from_3d(&t1.transform(&t2.transform(&solid))).source()
    );
}
