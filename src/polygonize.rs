use tracing::{debug, debug_span};

use crate::{
    bounds::BoundingCube,
    cell::{NORMAL_EPSILON, triangulate_cell},
    dispatch::polygonize_parallel,
    error::Result,
    field::ScalarField,
    lattice::{DEFAULT_RESOLUTION, Lattice},
    mesh::{GeneratedMesh, MeshSink},
    types::Value,
};

/// How the cells of a lattice are processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One cell after another on the calling thread, in lattice order.
    Sequential,
    /// One dispatch invocation per cell on the rayon pool, compacted afterwards.
    #[default]
    Parallel,
}

/// Turns a [`ScalarField`] into a [`GeneratedMesh`].
///
/// Resolution and normal step are fixed when the polygonizer is built:
///
/// ```rust,ignore
/// let polygonizer = Polygonizer::default()
///     .with_resolution(40)
///     .with_strategy(Strategy::Sequential);
/// let mesh = polygonizer.polygonize(&field)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygonizer {
    /// Cells per axis of the lattice.
    pub resolution: usize,
    /// Central-difference step for normals.
    pub epsilon: Value,
    pub strategy: Strategy,
}

impl Default for Polygonizer {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            epsilon: NORMAL_EPSILON,
            strategy: Strategy::default(),
        }
    }
}

impl Polygonizer {
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_epsilon(mut self, epsilon: Value) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builds the lattice enclosing the current state of `field`.
    pub fn lattice<F: ScalarField + ?Sized>(&self, field: &F) -> Result<Lattice> {
        let bounds = BoundingCube::enclosing(field.balls(), field.ball_radius())?;
        Lattice::new(bounds, self.resolution)
    }

    /// Polygonizes the current state of `field`.
    ///
    /// ```text
    /// BoundingCube::enclosing  →  Lattice::new  →  Sequential | Parallel  →  GeneratedMesh
    /// ```
    pub fn polygonize<F: ScalarField + ?Sized>(&self, field: &F) -> Result<GeneratedMesh> {
        let _span = debug_span!("polygonize", strategy = ?self.strategy).entered();

        let lattice = self.lattice(field)?;
        debug!(
            min = lattice.min,
            cell_size = lattice.cell_size,
            cells = lattice.cell_count(),
            "lattice built"
        );

        match self.strategy {
            Strategy::Sequential => Ok(polygonize_sequential(field, &lattice, self.epsilon)),
            Strategy::Parallel => polygonize_parallel(field, &lattice, self.epsilon),
        }
    }
}

/// Polygonizes `field` over `lattice` one cell at a time, in lattice order.
///
/// Deterministic: the same field and lattice always give the same buffers.
pub fn polygonize_sequential<F: ScalarField + ?Sized>(
    field: &F,
    lattice: &Lattice,
    epsilon: Value,
) -> GeneratedMesh {
    let mut mesh = GeneratedMesh::new_empty();
    for cell in lattice.cells() {
        let corners = lattice.cell_corners(cell);
        for triangle in triangulate_cell(field, &corners, epsilon).as_slice() {
            mesh.push_triangle(triangle);
        }
    }
    debug!(triangles = mesh.triangle_count(), "sequential pass complete");
    mesh
}

/// Runs one frame: advances the field, polygonizes it and publishes the result.
///
/// The update always completes before sampling starts. Returns the number of
/// triangles published.
pub fn rebuild_frame<F, S>(field: &mut F, polygonizer: &Polygonizer, sink: &mut S) -> Result<usize>
where
    F: ScalarField + ?Sized,
    S: MeshSink + ?Sized,
{
    field.update();
    let mesh = polygonizer.polygonize(&*field)?;
    let triangles = mesh.triangle_count();
    mesh.publish(sink)?;
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::MetaballError,
        field::{Ball, MetaballField},
        types::{Point, Position},
    };

    #[derive(Default)]
    struct CountingSink {
        vertices: usize,
        uploads: usize,
    }

    impl MeshSink for CountingSink {
        fn set_vertices(&mut self, vertices: Vec<Position>) {
            self.vertices = vertices.len();
        }

        fn set_triangles(&mut self, _indices: Vec<u32>, _submesh: usize) {}

        fn set_normals(&mut self, _normals: Vec<Position>) {}

        fn upload(&mut self) {
            self.uploads += 1;
        }
    }

    fn blob() -> MetaballField {
        MetaballField::new(1.).with_ball(Ball::stationary(Point::new(0.2, -0.1, 0.3)))
    }

    #[test]
    fn defaults_match_constants() {
        let polygonizer = Polygonizer::default();
        assert_eq!(polygonizer.resolution, DEFAULT_RESOLUTION);
        assert_eq!(polygonizer.epsilon, NORMAL_EPSILON);
        assert_eq!(polygonizer.strategy, Strategy::Parallel);
    }

    #[test]
    fn empty_field_fails_fast() {
        let field = MetaballField::new(1.);
        for strategy in [Strategy::Sequential, Strategy::Parallel] {
            let polygonizer = Polygonizer::default().with_strategy(strategy);
            assert_eq!(polygonizer.polygonize(&field), Err(MetaballError::EmptyField));
        }
    }

    #[test]
    fn zero_resolution_is_a_configuration_error() {
        let polygonizer = Polygonizer::default().with_resolution(0);
        assert_eq!(polygonizer.polygonize(&blob()), Err(MetaballError::ZeroResolution));
    }

    #[test]
    fn sequential_output_is_sequentially_indexed() {
        let mesh = Polygonizer::default()
            .with_resolution(12)
            .with_strategy(Strategy::Sequential)
            .polygonize(&blob())
            .unwrap();

        assert!(mesh.triangle_count() > 0);
        assert!(mesh.indices.iter().enumerate().all(|(n, &i)| n as u32 == i));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn rebuild_frame_updates_then_publishes() {
        let mut field = MetaballField::new(1.)
            .with_ball(Ball::oscillating(
                Point::origin(),
                crate::types::Vector::new(1., 0., 0.),
                2.,
                0.,
            ))
            .with_time_step(0.25);
        let polygonizer = Polygonizer::default().with_resolution(10);
        let mut sink = CountingSink::default();

        let triangles = rebuild_frame(&mut field, &polygonizer, &mut sink).unwrap();

        assert_eq!(field.time(), 0.25);
        assert!(triangles > 0);
        assert_eq!(sink.vertices, triangles * 3);
        assert_eq!(sink.uploads, 1);
    }

    #[test]
    fn rebuild_frame_reports_empty_field() {
        let mut field = MetaballField::new(1.);
        let mut sink = CountingSink::default();
        let result = rebuild_frame(&mut field, &Polygonizer::default(), &mut sink);
        assert_eq!(result, Err(MetaballError::EmptyField));
        assert_eq!(sink.uploads, 0);
    }
}
