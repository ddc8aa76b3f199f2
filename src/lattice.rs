use std::collections::HashMap;

use serde::Deserialize;

/// Cells closer than this multiple of the radius are neighbours. Hex centres
/// sit `sqrt(3) * r` apart, so exactly the six touching cells qualify.
pub const NEIGHBOR_DISTANCE_FACTOR: f32 = 1.75;

const SQRT_3: f32 = 1.732_050_8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryLayout {
    /// One cell thick ring around `columns x rows` interior cells.
    #[default]
    Ring,
    /// `i < 0 || i >= cols + 1 || j < 0.5 || j >= rows`: the last column
    /// stays interior and the first row is frozen. Column `-1` is shifted
    /// half a row up, by truncating remainder.
    Reference,
}

impl BoundaryLayout {
    fn is_boundary(self, col: i64, row: i64, columns: i64, rows: i64) -> bool {
        match self {
            Self::Ring => col < 0 || col >= columns || row < 0 || row >= rows,
            // Integer rows make `row < 0.5` the same as `row < 1`.
            Self::Reference => col < 0 || col >= columns + 1 || row < 1 || row >= rows,
        }
    }

    fn column_shift(self, col: i64) -> f32 {
        match self {
            Self::Ring => col.rem_euclid(2) as f32,
            Self::Reference => (col % 2) as f32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeGeometry {
    pub columns: usize,
    pub rows: usize,
    pub radius: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub boundary: BoundaryLayout,
}

impl LatticeGeometry {
    pub fn fit_canvas(canvas_width: f32, canvas_height: f32, radius: f32) -> Self {
        Self {
            columns: (canvas_width / (radius * 1.5)).floor().max(0.0) as usize,
            rows: (canvas_height / (radius * SQRT_3)).floor().max(0.0) as usize,
            radius,
            canvas_width,
            canvas_height,
            boundary: BoundaryLayout::Ring,
        }
    }
}

/// Adjacency in compressed form: neighbours of cell `i` are
/// `targets[offsets[i]..offsets[i + 1]]`, sorted ascending.
#[derive(Clone, Debug)]
pub struct NeighborIndex {
    offsets: Vec<usize>,
    targets: Vec<usize>,
}

impl NeighborIndex {
    pub fn build(positions: &[[f32; 2]], threshold: f32) -> Self {
        let bucket_of = |[x, y]: [f32; 2]| -> (i64, i64) {
            ((x / threshold).floor() as i64, (y / threshold).floor() as i64)
        };

        let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (idx, &pos) in positions.iter().enumerate() {
            buckets.entry(bucket_of(pos)).or_default().push(idx);
        }

        let threshold_sq = threshold * threshold;
        let mut offsets = Vec::with_capacity(positions.len() + 1);
        let mut targets = Vec::with_capacity(positions.len() * 6);
        offsets.push(0);

        for (idx, &[x, y]) in positions.iter().enumerate() {
            let (bx, by) = bucket_of([x, y]);
            let start = targets.len();
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let Some(candidates) = buckets.get(&(bx + dx, by + dy)) else {
                        continue;
                    };
                    for &other in candidates {
                        if other == idx {
                            continue;
                        }
                        let [ox, oy] = positions[other];
                        let dist_sq = (ox - x) * (ox - x) + (oy - y) * (oy - y);
                        if dist_sq < threshold_sq {
                            targets.push(other);
                        }
                    }
                }
            }
            targets[start..].sort_unstable();
            offsets.push(targets.len());
        }

        Self { offsets, targets }
    }

    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }
}

#[derive(Clone, Debug)]
pub struct Topology {
    radius: f32,
    positions: Vec<[f32; 2]>,
    boundary: Vec<bool>,
    neighbors: NeighborIndex,
}

impl Topology {
    /// Offset-column hexagonal layout centred on the canvas, with boundary
    /// cells one index beyond the interior on every side.
    pub fn hexagonal(geometry: &LatticeGeometry) -> Self {
        let radius = geometry.radius;
        let columns = geometry.columns as i64;
        let rows = geometry.rows as i64;
        let row_height = radius * SQRT_3;

        let grid_width = columns as f32 * radius * 1.5;
        let grid_height = rows as f32 * row_height;
        let x_offset = (geometry.canvas_width - grid_width) / 2.0;
        let y_offset = (geometry.canvas_height - grid_height) / 2.0;

        let cells = (-1..=columns).flat_map(|col| {
            (-1..=rows).map(move |row| {
                let x = col as f32 * radius * 1.5 + x_offset;
                let y = row as f32 * row_height
                    + geometry.boundary.column_shift(col) * row_height / 2.0
                    + y_offset;
                let is_boundary = geometry.boundary.is_boundary(col, row, columns, rows);
                ([x, y], is_boundary)
            })
        });

        Self::from_cells(cells, radius)
    }

    pub fn from_cells(cells: impl IntoIterator<Item = ([f32; 2], bool)>, radius: f32) -> Self {
        let (positions, boundary): (Vec<_>, Vec<_>) = cells.into_iter().unzip();
        let neighbors = NeighborIndex::build(&positions, radius * NEIGHBOR_DISTANCE_FACTOR);
        Self {
            radius,
            positions,
            boundary,
            neighbors,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn position(&self, idx: usize) -> [f32; 2] {
        self.positions[idx]
    }

    pub fn is_boundary(&self, idx: usize) -> bool {
        self.boundary[idx]
    }

    pub fn neighbors(&self, idx: usize) -> &[usize] {
        self.neighbors.neighbors(idx)
    }

    pub fn interior_count(&self) -> usize {
        self.boundary.iter().filter(|&&b| !b).count()
    }
}

pub fn hexagon_vertices([cx, cy]: [f32; 2], radius: f32) -> [[f32; 2]; 6] {
    std::array::from_fn(|k| {
        let angle = std::f32::consts::FRAC_PI_3 * k as f32;
        [cx + radius * angle.cos(), cy + radius * angle.sin()]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(columns: usize, rows: usize, boundary: BoundaryLayout) -> LatticeGeometry {
        LatticeGeometry {
            columns,
            rows,
            radius: 25.0,
            canvas_width: 800.0,
            canvas_height: 600.0,
            boundary,
        }
    }

    #[test]
    fn ring_layout_fences_exact_interior() {
        let topology = Topology::hexagonal(&geometry(4, 4, BoundaryLayout::Ring));
        assert_eq!(topology.len(), 6 * 6);
        assert_eq!(topology.interior_count(), 16);
    }

    #[test]
    fn reference_layout_uses_legacy_index_test() {
        let topology = Topology::hexagonal(&geometry(4, 4, BoundaryLayout::Reference));
        assert_eq!(topology.len(), 36);
        // Columns 0..=4 are interior, rows 1..=3 are interior.
        assert_eq!(topology.interior_count(), 5 * 3);
    }

    #[test]
    fn left_boundary_column_shift_depends_on_layout() {
        let row_height = 25.0 * SQRT_3;
        let ring = Topology::hexagonal(&geometry(4, 4, BoundaryLayout::Ring));
        let reference = Topology::hexagonal(&geometry(4, 4, BoundaryLayout::Reference));

        // Index 0 is (-1, -1); index 6 is (0, -1) with no shift in either layout.
        let ring_shift = ring.position(0)[1] - ring.position(6)[1];
        let reference_shift = reference.position(0)[1] - reference.position(6)[1];
        assert!((ring_shift - row_height / 2.0).abs() < 1e-3);
        assert!((reference_shift + row_height / 2.0).abs() < 1e-3);
        assert_eq!(reference.position(6), ring.position(6));
    }

    #[test]
    fn reference_layout_keeps_hex_adjacency() {
        let topology = Topology::hexagonal(&geometry(5, 4, BoundaryLayout::Reference));
        for idx in 0..topology.len() {
            for &other in topology.neighbors(idx) {
                assert!(topology.neighbors(other).contains(&idx));
            }
            let inner = !topology.is_boundary(idx)
                && topology.neighbors(idx).iter().all(|&n| !topology.is_boundary(n));
            if inner {
                assert_eq!(topology.neighbors(idx).len(), 6);
            }
        }
    }

    #[test]
    fn deep_interior_cells_have_six_neighbours() {
        let topology = Topology::hexagonal(&geometry(8, 8, BoundaryLayout::Ring));
        let mut checked = 0;
        for idx in 0..topology.len() {
            let all_interior = !topology.is_boundary(idx)
                && topology
                    .neighbors(idx)
                    .iter()
                    .all(|&n| !topology.is_boundary(n));
            if all_interior {
                assert_eq!(topology.neighbors(idx).len(), 6);
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn every_interior_cell_of_a_ring_has_six_neighbours() {
        let topology = Topology::hexagonal(&geometry(5, 3, BoundaryLayout::Ring));
        for idx in (0..topology.len()).filter(|&i| !topology.is_boundary(i)) {
            assert_eq!(topology.neighbors(idx).len(), 6, "cell {idx}");
        }
    }

    #[test]
    fn adjacency_is_symmetric_and_excludes_self() {
        let topology = Topology::hexagonal(&geometry(6, 5, BoundaryLayout::Ring));
        for idx in 0..topology.len() {
            for &other in topology.neighbors(idx) {
                assert_ne!(other, idx);
                assert!(topology.neighbors(other).contains(&idx));
            }
        }
    }

    #[test]
    fn adjacency_matches_brute_force_distance_scan() {
        let topology = Topology::hexagonal(&geometry(5, 4, BoundaryLayout::Ring));
        let threshold = topology.radius() * NEIGHBOR_DISTANCE_FACTOR;
        for idx in 0..topology.len() {
            let [x, y] = topology.position(idx);
            let expected: Vec<usize> = (0..topology.len())
                .filter(|&other| {
                    let [ox, oy] = topology.position(other);
                    other != idx && (ox - x).hypot(oy - y) < threshold
                })
                .collect();
            assert_eq!(topology.neighbors(idx), expected.as_slice());
        }
    }

    #[test]
    fn lattice_is_centred_on_canvas() {
        let geometry = geometry(4, 4, BoundaryLayout::Ring);
        let topology = Topology::hexagonal(&geometry);
        let first = topology.position(0);
        // Cell (-1, -1) sits one column left of the grid's x offset.
        let x_offset = (geometry.canvas_width - 4.0 * 25.0 * 1.5) / 2.0;
        assert!((first[0] - (x_offset - 37.5)).abs() < 1e-4);
    }

    #[test]
    fn fit_canvas_uses_hex_pitch() {
        let geometry = LatticeGeometry::fit_canvas(800.0, 600.0, 25.0);
        assert_eq!(geometry.columns, 21);
        assert_eq!(geometry.rows, 13);
    }

    #[test]
    fn hexagon_starts_on_x_axis() {
        let corners = hexagon_vertices([10.0, 20.0], 5.0);
        assert!((corners[0][0] - 15.0).abs() < 1e-5);
        assert!((corners[0][1] - 20.0).abs() < 1e-5);
        assert!((corners[3][0] - 5.0).abs() < 1e-4);
    }
}
