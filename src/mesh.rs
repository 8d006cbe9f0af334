use bevy::{mesh::Indices, prelude::Mesh};

use crate::{
    cell::Triangle,
    error::{MetaballError, Result},
    types::{Position, point_to_array, vector_to_array},
};

/// Receives the finished geometry of a frame.
///
/// [`GeneratedMesh::publish`] calls the methods in declaration order, once per frame,
/// after checking the buffers against the contract:
/// vertex count equals normal count, the index count is a multiple of three and
/// every index refers to an existing vertex.
pub trait MeshSink {
    fn set_vertices(&mut self, vertices: Vec<Position>);

    /// Replaces the triangle list of submesh `submesh`.
    fn set_triangles(&mut self, indices: Vec<u32>, submesh: usize);

    fn set_normals(&mut self, normals: Vec<Position>);

    /// Finalises the mesh for display.
    fn upload(&mut self);
}

/// Output of one polygonize pass.
///
/// Vertices are not shared: every triangle corner owns one vertex, so
/// `indices` is `0, 1, 2, 3, ...` when produced by a single pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedMesh {
    pub vertices: Vec<Position>,
    /// Unit normals, index-aligned with `vertices`.
    pub normals: Vec<Position>,
    /// Flat triangle list: every three indices form one triangle.
    pub indices: Vec<u32>,
}

impl GeneratedMesh {
    /// Creates an empty mesh with no vertices, triangles, or normals.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Creates an empty mesh with room for `triangles` triangles.
    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 3),
            normals: Vec::with_capacity(triangles * 3),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Appends three fresh vertices and the triangle joining them, keeping the winding.
    pub fn push_triangle(&mut self, triangle: &Triangle) {
        for (vertex, normal) in triangle.vertices.iter().zip(&triangle.normals) {
            self.push_vertex(point_to_array(vertex), vector_to_array(normal));
        }
    }

    /// Appends one vertex and its index.
    #[inline]
    pub fn push_vertex(&mut self, vertex: Position, normal: Position) {
        self.indices.push(self.vertices.len() as u32);
        self.vertices.push(vertex);
        self.normals.push(normal);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates the vertex positions of every triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [Position; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Empties all three buffers, keeping their allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.indices.clear();
    }

    /// Checks the buffers against the [`MeshSink`] contract.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() != self.normals.len() {
            return Err(MetaballError::InvalidMesh(format!(
                "{} vertices but {} normals",
                self.vertices.len(),
                self.normals.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(MetaballError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(index) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.vertices.len())
        {
            return Err(MetaballError::InvalidMesh(format!(
                "index {index} out of range for {} vertices",
                self.vertices.len()
            )));
        }
        Ok(())
    }

    /// Validates the buffers and hands them to `sink`.
    pub fn publish<S: MeshSink + ?Sized>(self, sink: &mut S) -> Result<()> {
        self.validate()?;
        sink.set_vertices(self.vertices);
        sink.set_triangles(self.indices, 0);
        sink.set_normals(self.normals);
        sink.upload();
        Ok(())
    }
}

/// The three buffers are **moved** into the Bevy mesh with no copies.
impl MeshSink for Mesh {
    fn set_vertices(&mut self, vertices: Vec<Position>) {
        self.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    }

    fn set_triangles(&mut self, indices: Vec<u32>, _submesh: usize) {
        // Bevy meshes carry a single index buffer.
        self.insert_indices(Indices::U32(indices));
    }

    fn set_normals(&mut self, normals: Vec<Position>) {
        self.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    }

    // Bevy's render world extracts the asset itself once it is added.
    fn upload(&mut self) {}
}
