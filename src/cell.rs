//! Per-cell classification and triangulation.
//!
//! [`triangulate_cell`] is the single piece of marching cubes logic in the crate.
//! Both the sequential pass and the parallel dispatch kernel call it, so the two
//! strategies cannot drift apart. It touches no shared mutable state.
//!
//! ```text
//! Per cell:
//! 1. F(corner) (×8)          →  8 scalar values
//! 2. sign_mask               →  256-entry lookup key
//! 3. EDGE_TABLE[mask]        →  bitmask of crossed edges
//! 4. edge_vertex (×crossed)  →  interpolated vertex + gradient normal per edge
//! 5. TRI_TABLE[mask]         →  triangles, in table winding order
//! ```

use crate::{
    field::ScalarField,
    interp::{crossing_fraction, interpolate_points},
    tables::{CORNER_POINT_INDICES, EDGE_TABLE, MAX_TRIANGLES_PER_CELL, TRIANGLE_COUNT, TRI_TABLE},
    types::{Point, Value, Vector},
};

/// Default central-difference step used to estimate normals.
pub const NORMAL_EPSILON: Value = 0.01;

// Gradients shorter than this are considered flat.
const MIN_GRADIENT: Value = 1e-12;

/// Normal used where the field gradient vanishes.
pub fn fallback_normal() -> Vector {
    Vector::y()
}

/// One output triangle. Every corner has its own vertex; nothing is shared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point; 3],
    pub normals: [Vector; 3],
}

impl Triangle {
    fn empty() -> Self {
        Self {
            vertices: [Point::origin(); 3],
            normals: [Vector::zeros(); 3],
        }
    }
}

/// The triangles of a single cell, stored without allocating.
#[derive(Debug, Clone, Copy)]
pub struct CellTriangles {
    triangles: [Triangle; MAX_TRIANGLES_PER_CELL],
    len: usize,
}

impl CellTriangles {
    fn empty() -> Self {
        Self {
            triangles: [Triangle::empty(); MAX_TRIANGLES_PER_CELL],
            len: 0,
        }
    }

    pub fn as_slice(&self) -> &[Triangle] {
        &self.triangles[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Builds the marching cubes mask of a cell.
///
/// Bit `i` is set when corner `i` is inside the field (`F > 0`):
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// mask bits:    [_][_][_][_][_][_][_][_]
///                                     ^-- corner 0 inside?
/// ```
#[inline]
pub fn sign_mask(corner_values: &[Value; 8]) -> u8 {
    corner_values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0.)
        .fold(0u8, |mask, (i, _)| mask | (1 << i))
}

/// Estimates the outward surface normal at `point`.
///
/// Uses a central difference of `F` along each axis, negated (`F` grows towards
/// the inside) and normalised. Falls back to [`fallback_normal`] when the
/// gradient vanishes.
#[inline]
pub fn estimate_normal<F: ScalarField + ?Sized>(field: &F, point: &Point, epsilon: Value) -> Vector {
    let diff = |axis: Vector| {
        let step = axis * epsilon;
        field.evaluate(&(point + step)) - field.evaluate(&(point - step))
    };
    let gradient = Vector::new(diff(Vector::x()), diff(Vector::y()), diff(Vector::z()));

    (-gradient)
        .try_normalize(MIN_GRADIENT)
        .filter(|n| n.iter().all(|c| c.is_finite()))
        .unwrap_or_else(fallback_normal)
}

/// Computes the crossing vertex of the edge `first -> second` and its normal.
#[inline]
pub fn edge_vertex<F: ScalarField + ?Sized>(
    field: &F,
    first: &Point,
    second: &Point,
    first_value: Value,
    second_value: Value,
    epsilon: Value,
) -> (Point, Vector) {
    let t = crossing_fraction(first_value, second_value);
    let vertex = interpolate_points(first, second, t);
    (vertex, estimate_normal(field, &vertex, epsilon))
}

/// Classifies one cell and returns its triangles.
///
/// `corners` must be in the [`tables`](crate::tables) corner order; the
/// triangles keep the winding of [`TRI_TABLE`].
pub fn triangulate_cell<F: ScalarField + ?Sized>(
    field: &F,
    corners: &[Point; 8],
    epsilon: Value,
) -> CellTriangles {
    let mut out = CellTriangles::empty();

    let values = corners.map(|corner| field.evaluate(&corner));
    let mask = sign_mask(&values) as usize;

    let edges_mask = EDGE_TABLE[mask];
    if edges_mask == 0 {
        return out;
    }

    let mut edge_points: [Option<(Point, Vector)>; 12] = [None; 12];
    for (edge, slot) in edge_points.iter_mut().enumerate() {
        if edges_mask & (1 << edge) == 0 {
            continue;
        }
        let [a, b] = CORNER_POINT_INDICES[edge].map(usize::from);
        *slot = Some(edge_vertex(
            field,
            &corners[a],
            &corners[b],
            values[a],
            values[b],
            epsilon,
        ));
    }

    let count = TRIANGLE_COUNT[mask] as usize;
    for (tri, edges) in TRI_TABLE[mask][..count * 3].chunks_exact(3).enumerate() {
        let triangle = &mut out.triangles[tri];
        for (corner, &edge) in edges.iter().enumerate() {
            // Table edges always cross the surface, so their point exists.
            let Some((vertex, normal)) = edge_points[edge as usize] else {
                debug_assert!(false, "mask {mask}: edge {edge} has no crossing");
                continue;
            };
            triangle.vertices[corner] = vertex;
            triangle.normals[corner] = normal;
        }
    }
    out.len = count;

    out
}
