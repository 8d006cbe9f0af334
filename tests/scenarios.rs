mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use bevy_metaballs::{
    Polygonizer, Strategy,
    field::{Ball, MetaballField},
    types::{Point, Value},
};
use common::{HalfSpace, SphereField, dot, length};

const STRATEGIES: [Strategy; 2] = [Strategy::Sequential, Strategy::Parallel];

#[test]
fn sphere_mesh_sits_at_the_radius() {
    let radius = 1.5;
    let field = SphereField::new(Point::origin(), radius);

    for strategy in STRATEGIES {
        let mesh = Polygonizer::default()
            .with_strategy(strategy)
            .polygonize(&field)
            .unwrap();
        assert!(mesh.triangle_count() > 0);

        let mean = mesh.vertices.iter().map(length).sum::<Value>() / mesh.vertices.len() as Value;
        assert_abs_diff_eq!(mean, radius, epsilon = 0.01);
        for vertex in &mesh.vertices {
            assert_abs_diff_eq!(length(vertex), radius, epsilon = 0.02);
        }
    }
}

#[test]
fn sphere_normals_point_outward() {
    let field = SphereField::new(Point::origin(), 1.);

    for strategy in STRATEGIES {
        let mesh = Polygonizer::default()
            .with_strategy(strategy)
            .polygonize(&field)
            .unwrap();

        for (vertex, normal) in mesh.vertices.iter().zip(&mesh.normals) {
            assert_relative_eq!(length(normal), 1., epsilon = 1e-4);
            assert!(dot(vertex, normal) > 0.);
        }
    }
}

#[test]
fn sphere_triangles_wind_counter_clockwise_from_outside() {
    let field = SphereField::new(Point::origin(), 1.);
    let mesh = Polygonizer::default().polygonize(&field).unwrap();

    for [a, b, c] in mesh.triangles() {
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let face = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        // Vertices snapped onto a shared lattice corner leave no face to orient.
        if length(&face) < 1e-7 {
            continue;
        }
        assert!(dot(&face, &a) > 0.);
    }
}

#[test]
fn distant_balls_form_two_separate_surfaces() {
    let field = MetaballField::new(1.).with_balls([
        Ball::stationary(Point::new(-4., 0., 0.)),
        Ball::stationary(Point::new(4., 0., 0.)),
    ]);

    for strategy in STRATEGIES {
        let mesh = Polygonizer::default()
            .with_strategy(strategy)
            .polygonize(&field)
            .unwrap();

        let (mut left, mut right) = (0, 0);
        for triangle in mesh.triangles() {
            if triangle.iter().all(|v| v[0] < -1.) {
                left += 1;
            } else if triangle.iter().all(|v| v[0] > 1.) {
                right += 1;
            } else {
                panic!("triangle bridges the gap: {triangle:?}");
            }
        }
        assert!(left > 0 && right > 0);
    }
}

#[test]
fn single_cell_outside_the_surface_is_empty() {
    let field = SphereField::new(Point::origin(), 1.);

    for strategy in STRATEGIES {
        let mesh = Polygonizer::default()
            .with_resolution(1)
            .with_strategy(strategy)
            .polygonize(&field)
            .unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.validate().is_ok());
    }
}

#[test]
fn single_cell_straddling_a_plane() {
    // Bounds are [-1.5, 1.5]; the x = min face is inside, the x = max face outside.
    let field = HalfSpace::new(0.5);

    for strategy in STRATEGIES {
        let mesh = Polygonizer::default()
            .with_resolution(1)
            .with_strategy(strategy)
            .polygonize(&field)
            .unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        for (vertex, normal) in mesh.vertices.iter().zip(&mesh.normals) {
            assert_abs_diff_eq!(vertex[0], 0., epsilon = 1e-6);
            assert_abs_diff_eq!(normal[0], 1., epsilon = 1e-6);
        }
    }
}

#[test]
fn mesh_buffers_satisfy_the_sink_contract() {
    let field = MetaballField::new(1.).with_balls([
        Ball::stationary(Point::new(-0.6, 0., 0.)),
        Ball::stationary(Point::new(0.6, 0.2, 0.)),
    ]);

    for strategy in STRATEGIES {
        let mesh = Polygonizer::default()
            .with_resolution(24)
            .with_strategy(strategy)
            .polygonize(&field)
            .unwrap();

        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
        assert_eq!(mesh.indices.len(), mesh.vertices.len());
    }
}
