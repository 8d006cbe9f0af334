#![allow(dead_code)]

use bevy_metaballs::{
    field::{Ball, ScalarField},
    mesh::GeneratedMesh,
    types::{Point, Position, Value},
};

/// `F(p) = r² - |p - c|²`, positive inside a sphere of radius `r`.
pub struct SphereField {
    balls: Vec<Ball>,
    radius: Value,
}

impl SphereField {
    pub fn new(center: Point, radius: Value) -> Self {
        Self {
            balls: vec![Ball::stationary(center)],
            radius,
        }
    }
}

impl ScalarField for SphereField {
    fn balls(&self) -> &[Ball] {
        &self.balls
    }

    fn ball_radius(&self) -> Value {
        self.radius
    }

    fn evaluate(&self, point: &Point) -> Value {
        self.radius * self.radius - (point - self.balls[0].position).norm_squared()
    }
}

/// `F(p) = -p.x`: inside for negative x.
pub struct HalfSpace {
    balls: Vec<Ball>,
    radius: Value,
}

impl HalfSpace {
    pub fn new(radius: Value) -> Self {
        Self {
            balls: vec![Ball::stationary(Point::origin())],
            radius,
        }
    }
}

impl ScalarField for HalfSpace {
    fn balls(&self) -> &[Ball] {
        &self.balls
    }

    fn ball_radius(&self) -> Value {
        self.radius
    }

    fn evaluate(&self, point: &Point) -> Value {
        -point.x
    }
}

type TriangleKey = [[u32; 3]; 6];

fn key(vertices: [Position; 3], normals: [Position; 3]) -> TriangleKey {
    let mut k = [[0; 3]; 6];
    for (slot, p) in k.iter_mut().zip(vertices.iter().chain(normals.iter())) {
        *slot = p.map(f32::to_bits);
    }
    k
}

/// Every triangle of `mesh` (positions and normals), sorted so meshes can be
/// compared regardless of enumeration order.
pub fn sorted_triangles(mesh: &GeneratedMesh) -> Vec<TriangleKey> {
    let mut triangles: Vec<TriangleKey> = mesh
        .indices
        .chunks_exact(3)
        .map(|tri| {
            let v = tri.iter().map(|&i| mesh.vertices[i as usize]);
            let n = tri.iter().map(|&i| mesh.normals[i as usize]);
            let vertices: Vec<Position> = v.collect();
            let normals: Vec<Position> = n.collect();
            key(
                [vertices[0], vertices[1], vertices[2]],
                [normals[0], normals[1], normals[2]],
            )
        })
        .collect();
    triangles.sort_unstable();
    triangles
}

pub fn length(p: &Position) -> Value {
    (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt()
}

pub fn dot(a: &Position, b: &Position) -> Value {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
