use nalgebra::{Point3, Vector3};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// Flat `[x, y, z]` layout used by the output mesh buffers.
pub type Position = [Value; 3];

#[inline]
pub fn point_to_array(p: &Point) -> Position {
    [p.x, p.y, p.z]
}

#[inline]
pub fn vector_to_array(v: &Vector) -> Position {
    [v.x, v.y, v.z]
}
