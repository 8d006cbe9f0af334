use crate::{
    bounds::BoundingCube,
    error::{MetaballError, Result},
    tables::CORNER_OFFSETS,
    types::{Point, Value},
};

/// Default number of cells along each axis.
pub const DEFAULT_RESOLUTION: usize = 32;

/// Integer coordinate `[i, j, k]` of a lattice cell, each in `0..resolution`.
pub type CellIndex = [usize; 3];

/// A uniform cubic lattice covering a [`BoundingCube`].
///
/// The lattice has `resolution³` cells of side [`cell_size`](Lattice::cell_size).
/// Cell positions are computed from integer indices (`min + index * cell_size`)
/// rather than by accumulating steps, so the cell count never depends on rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    /// Lower corner of the lattice on every axis.
    pub min: Value,
    /// World-space size of each cell edge.
    pub cell_size: Value,
    /// Number of cells along each axis.
    pub resolution: usize,
}

impl Lattice {
    /// Partitions `bounds` into `resolution` cells per axis.
    ///
    /// Returns [`MetaballError::ZeroResolution`] if `resolution` is `0`.
    pub fn new(bounds: BoundingCube, resolution: usize) -> Result<Self> {
        if resolution == 0 {
            return Err(MetaballError::ZeroResolution);
        }
        Ok(Self {
            min: bounds.min,
            cell_size: bounds.extent() / resolution as Value,
            resolution,
        })
    }

    /// Total number of cells, `resolution³`.
    pub fn cell_count(&self) -> usize {
        self.resolution * self.resolution * self.resolution
    }

    /// Returns `true` if `cell` lies inside the lattice.
    #[inline]
    pub fn contains(&self, [i, j, k]: CellIndex) -> bool {
        i < self.resolution && j < self.resolution && k < self.resolution
    }

    /// World-space position of the lowest corner of `cell`.
    #[inline]
    pub fn cell_origin(&self, [i, j, k]: CellIndex) -> Point {
        Point::new(
            self.min + i as Value * self.cell_size,
            self.min + j as Value * self.cell_size,
            self.min + k as Value * self.cell_size,
        )
    }

    /// Returns the 8 world-space corners of `cell`.
    ///
    /// Corners follow the ordering of [`tables`](crate::tables):
    ///
    /// ```text
    ///  0 = (x,   y,   z  )    4 = (x,   y,   z+s)
    ///  1 = (x,   y+s, z  )    5 = (x,   y+s, z+s)
    ///  2 = (x+s, y+s, z  )    6 = (x+s, y+s, z+s)
    ///  3 = (x+s, y,   z  )    7 = (x+s, y,   z+s)
    /// ```
    #[inline]
    pub fn cell_corners(&self, cell: CellIndex) -> [Point; 8] {
        let origin = self.cell_origin(cell);
        let s = self.cell_size;
        CORNER_OFFSETS.map(|[dx, dy, dz]| {
            Point::new(
                origin.x + dx as Value * s,
                origin.y + dy as Value * s,
                origin.z + dz as Value * s,
            )
        })
    }

    /// Iterates every cell index in lattice order (`i` outermost, `k` innermost).
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> + use<> {
        let n = self.resolution;
        (0..n).flat_map(move |i| (0..n).flat_map(move |j| (0..n).map(move |k| [i, j, k])))
    }

    /// Converts a cell index into its position in [`cells`](Lattice::cells) order.
    #[inline]
    pub fn linear_index(&self, [i, j, k]: CellIndex) -> usize {
        (i * self.resolution + j) * self.resolution + k
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn lattice(min: Value, max: Value, resolution: usize) -> Lattice {
        Lattice::new(BoundingCube { min, max }, resolution).unwrap()
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let bounds = BoundingCube { min: -1., max: 1. };
        assert_eq!(Lattice::new(bounds, 0), Err(MetaballError::ZeroResolution));
    }

    #[test]
    fn cell_count_is_exact_for_awkward_extents() {
        // 0.1 is not representable, so float stepping would drift.
        for resolution in [1, 3, 7, 10, 32, 40] {
            let lattice = lattice(-0.3, 0.7, resolution);
            assert_eq!(lattice.cells().count(), resolution.pow(3));
            assert_eq!(lattice.cell_count(), resolution.pow(3));
        }
    }

    #[test]
    fn cells_are_visited_in_lattice_order() {
        let lattice = lattice(0., 2., 2);
        let cells: Vec<CellIndex> = lattice.cells().collect();
        assert_eq!(cells[0], [0, 0, 0]);
        assert_eq!(cells[1], [0, 0, 1]);
        assert_eq!(cells[2], [0, 1, 0]);
        assert_eq!(cells[7], [1, 1, 1]);
        for (n, cell) in cells.iter().enumerate() {
            assert_eq!(lattice.linear_index(*cell), n);
        }
    }

    #[test]
    fn corners_follow_table_ordering() {
        let lattice = lattice(-1., 1., 4);
        let corners = lattice.cell_corners([1, 2, 3]);
        let (x, y, z, s) = (-0.5, 0., 0.5, 0.5);

        let expected = [
            Point::new(x, y, z),
            Point::new(x, y + s, z),
            Point::new(x + s, y + s, z),
            Point::new(x + s, y, z),
            Point::new(x, y, z + s),
            Point::new(x, y + s, z + s),
            Point::new(x + s, y + s, z + s),
            Point::new(x + s, y, z + s),
        ];
        for (corner, expected) in corners.iter().zip(expected.iter()) {
            assert_relative_eq!(*corner, *expected);
        }
    }

    #[test]
    fn last_cell_reaches_the_upper_bound() {
        let lattice = lattice(-2.5, 4.5, 7);
        let corners = lattice.cell_corners([6, 6, 6]);
        assert_relative_eq!(corners[6], Point::new(4.5, 4.5, 4.5), epsilon = 1e-5);
    }

    #[test]
    fn contains_checks_every_axis() {
        let lattice = lattice(0., 1., 3);
        assert!(lattice.contains([2, 2, 2]));
        assert!(!lattice.contains([3, 0, 0]));
        assert!(!lattice.contains([0, 3, 0]));
        assert!(!lattice.contains([0, 0, 3]));
    }
}
