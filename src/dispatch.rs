//! Parallel polygonization, laid out like a compute-shader dispatch.
//!
//! ```text
//! DispatchGrid::for_resolution(N)   ceil(N / 8)³ work groups of 8×8×8 invocations
//!   → generate kernel               one invocation per lattice cell, out-of-range ids return
//!   → AppendBuffer::append          atomic counter reserves a disjoint slot range
//! [barrier: every work group joined]
//!   → AppendBuffer::read_back       all slots, unused ones read as OutputRecord::EMPTY
//!   → compact                       keep flagged records, linearize into GeneratedMesh
//! ```
//!
//! Work groups run on the rayon thread pool. The kernel reads the field and the
//! lattice through shared references only; the append buffer is the sole shared
//! write target.

use std::sync::{
    OnceLock,
    atomic::{AtomicUsize, Ordering},
};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, trace};

use crate::{
    cell::{Triangle, triangulate_cell},
    error::{MetaballError, Result},
    field::ScalarField,
    lattice::{CellIndex, Lattice},
    mesh::GeneratedMesh,
    tables::MAX_TRIANGLES_PER_CELL,
    types::{Position, Value, point_to_array, vector_to_array},
};

/// Invocations per work group along each axis.
pub const WORKGROUP_SIZE: usize = 8;

/// One potential output triangle, as written by the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputRecord {
    pub vertices: [Position; 3],
    pub normals: [Position; 3],
    /// `false` for slots no invocation wrote to.
    pub has_value: bool,
}

impl OutputRecord {
    pub const EMPTY: Self = Self {
        vertices: [[0.; 3]; 3],
        normals: [[0.; 3]; 3],
        has_value: false,
    };

    pub fn from_triangle(triangle: &Triangle) -> Self {
        Self {
            vertices: triangle.vertices.map(|v| point_to_array(&v)),
            normals: triangle.normals.map(|n| vector_to_array(&n)),
            has_value: true,
        }
    }
}

/// Fixed-capacity, append-only output collection shared by every invocation.
///
/// An atomic counter hands out disjoint slot ranges; each slot is written at most once.
pub struct AppendBuffer {
    slots: Vec<OnceLock<OutputRecord>>,
    counter: AtomicUsize,
}

impl AppendBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            counter: AtomicUsize::new(0),
        }
    }

    /// Sized for the worst case of `lattice`: five triangles in every cell.
    pub fn for_lattice(lattice: &Lattice) -> Self {
        Self::with_capacity(lattice.cell_count() * MAX_TRIANGLES_PER_CELL)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots handed out so far, capped at the capacity.
    pub fn len(&self) -> usize {
        self.counter.load(Ordering::Acquire).min(self.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserves a slot range for `records` and writes them into it.
    ///
    /// Returns [`MetaballError::BufferOverflow`] if the range would run past the
    /// capacity; nothing is written in that case.
    pub fn append(&self, records: &[OutputRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let start = self.counter.fetch_add(records.len(), Ordering::AcqRel);
        let end = start + records.len();
        if end > self.capacity() {
            return Err(MetaballError::BufferOverflow {
                capacity: self.capacity(),
                requested: end,
            });
        }

        for (slot, record) in self.slots[start..end].iter().zip(records) {
            let written = slot.set(*record).is_ok();
            debug_assert!(written, "append buffer slot written twice");
        }
        Ok(())
    }

    /// Reads every slot back, in slot order.
    pub fn read_back(self) -> Vec<OutputRecord> {
        self.slots
            .into_iter()
            .map(|slot| slot.into_inner().unwrap_or(OutputRecord::EMPTY))
            .collect()
    }
}

/// A 3D grid of work groups covering a `resolution³` lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGrid {
    /// Number of work groups along each axis.
    pub groups: usize,
    /// Lattice cells along each axis; invocations past this do nothing.
    pub resolution: usize,
}

impl DispatchGrid {
    /// Sizes the grid so every cell of a `resolution³` lattice gets an invocation.
    pub fn for_resolution(resolution: usize) -> Self {
        Self {
            groups: resolution.div_ceil(WORKGROUP_SIZE),
            resolution,
        }
    }

    /// Total number of work groups.
    pub fn group_count(&self) -> usize {
        self.groups * self.groups * self.groups
    }

    /// Total number of invocations, including those outside the lattice.
    pub fn invocation_count(&self) -> usize {
        self.group_count() * WORKGROUP_SIZE.pow(3)
    }

    /// Runs `kernel` once for every cell of the lattice and waits for all of them.
    ///
    /// Work groups are scheduled in parallel; invocations inside a group run in order.
    /// The first error returned by any invocation is returned.
    pub fn dispatch<K>(&self, kernel: K) -> Result<()>
    where
        K: Fn(CellIndex) -> Result<()> + Sync,
    {
        let groups = self.groups;
        trace!(
            groups,
            resolution = self.resolution,
            invocations = self.invocation_count(),
            "dispatching"
        );

        (0..self.group_count()).into_par_iter().try_for_each(|group| {
            let group_id = [group / (groups * groups), (group / groups) % groups, group % groups];

            for lx in 0..WORKGROUP_SIZE {
                for ly in 0..WORKGROUP_SIZE {
                    for lz in 0..WORKGROUP_SIZE {
                        let cell = [
                            group_id[0] * WORKGROUP_SIZE + lx,
                            group_id[1] * WORKGROUP_SIZE + ly,
                            group_id[2] * WORKGROUP_SIZE + lz,
                        ];
                        if cell.iter().any(|&c| c >= self.resolution) {
                            continue;
                        }
                        kernel(cell)?;
                    }
                }
            }
            Ok(())
        })
    }
}

/// Read-only inputs bound to the generate kernel.
pub struct KernelParams<'a, F: ScalarField + ?Sized> {
    pub field: &'a F,
    pub lattice: &'a Lattice,
    pub epsilon: Value,
}

/// The per-invocation kernel: triangulates one cell and appends its triangles.
pub fn generate<F: ScalarField + ?Sized>(
    params: &KernelParams<'_, F>,
    cell: CellIndex,
    output: &AppendBuffer,
) -> Result<()> {
    let corners = params.lattice.cell_corners(cell);
    let triangles = triangulate_cell(params.field, &corners, params.epsilon);
    if triangles.is_empty() {
        return Ok(());
    }

    let mut records = [OutputRecord::EMPTY; MAX_TRIANGLES_PER_CELL];
    for (record, triangle) in records.iter_mut().zip(triangles.as_slice()) {
        *record = OutputRecord::from_triangle(triangle);
    }
    output.append(&records[..triangles.len()])
}

/// Linearizes the populated records into mesh buffers, skipping empty slots.
pub fn compact(records: &[OutputRecord]) -> GeneratedMesh {
    let populated = records.iter().filter(|r| r.has_value).count();
    let mut mesh = GeneratedMesh::with_capacity(populated);

    for record in records.iter().filter(|r| r.has_value) {
        for (vertex, normal) in record.vertices.iter().zip(&record.normals) {
            mesh.push_vertex(*vertex, *normal);
        }
    }
    mesh
}

/// Polygonizes `field` over `lattice` with one parallel invocation per cell.
///
/// Produces the same triangles as
/// [`polygonize_sequential`](crate::polygonize::polygonize_sequential), in an
/// unspecified order.
pub fn polygonize_parallel<F: ScalarField + ?Sized>(
    field: &F,
    lattice: &Lattice,
    epsilon: Value,
) -> Result<GeneratedMesh> {
    let grid = DispatchGrid::for_resolution(lattice.resolution);
    let output = AppendBuffer::for_lattice(lattice);
    let params = KernelParams {
        field,
        lattice,
        epsilon,
    };

    grid.dispatch(|cell| generate(&params, cell, &output))?;

    let populated = output.len();
    let mesh = compact(&output.read_back());
    debug!(
        populated,
        triangles = mesh.triangle_count(),
        "parallel dispatch complete"
    );
    Ok(mesh)
}
