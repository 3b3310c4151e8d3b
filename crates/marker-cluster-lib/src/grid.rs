//! Screen-space grid bucketing
//!
//! Markers are projected with the current viewport projection and grouped by the fixed-size
//! pixel cell they land in. Cells are anchored to the current projection, so they are rebuilt
//! on every pass and never cached across viewport changes.

use crate::host::Projection;
use crate::marker::LeafMarker;
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Grid cell coordinates: `(floor(x / grid_size), floor(y / grid_size))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellKey {
    pub col: i64,
    pub row: i64,
}

impl CellKey {
    pub fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }

    /// Cell containing a screen offset, `None` for non-finite offsets.
    ///
    /// Offsets exactly on a boundary belong to the cell to their right/below.
    pub fn for_offset(offset: Coord<f64>, grid_size: f64) -> Option<Self> {
        if !offset.x.is_finite() || !offset.y.is_finite() {
            return None;
        }

        Some(Self {
            col: (offset.x / grid_size).floor() as i64,
            row: (offset.y / grid_size).floor() as i64,
        })
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.col, self.row)
    }
}

/// One occupied grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    key: CellKey,
    /// Indices into the marker slice, in marker order
    members: SmallVec<[usize; 8]>,
}

impl GridCell {
    pub fn key(&self) -> CellKey {
        self.key
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of one bucketing pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridBuckets {
    /// Occupied cells in order of first appearance
    cells: Vec<GridCell>,
    /// Markers whose projection was not finite
    unplaced: Vec<usize>,
}

impl GridBuckets {
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Look up a cell by key
    pub fn cell(&self, key: CellKey) -> Option<&GridCell> {
        self.cells.iter().find(|cell| cell.key == key)
    }

    /// Markers that could not be assigned to any cell
    pub fn unplaced(&self) -> &[usize] {
        &self.unplaced
    }

    /// Number of markers across all cells plus the unplaced ones
    pub fn marker_count(&self) -> usize {
        self.cells.iter().map(GridCell::len).sum::<usize>() + self.unplaced.len()
    }
}

/// Group markers by the screen-space grid cell they project into
pub fn bucket_markers<L, P>(markers: &[L], projection: &P, grid_size: f64) -> GridBuckets
where
    L: LeafMarker,
    P: Projection + ?Sized,
{
    profiling::scope!("grid::bucket_markers");

    let mut buckets = GridBuckets::default();
    let mut index_of: HashMap<CellKey, usize> = HashMap::with_capacity(markers.len());

    for (marker_index, marker) in markers.iter().enumerate() {
        let offset = projection.to_screen(marker.position());

        let Some(key) = CellKey::for_offset(offset, grid_size) else {
            tracing::trace!(marker_index, "Marker projected off-screen to a non-finite offset");
            buckets.unplaced.push(marker_index);
            continue;
        };

        let cell_index = *index_of.entry(key).or_insert_with(|| {
            buckets.cells.push(GridCell {
                key,
                members: SmallVec::new(),
            });
            buckets.cells.len() - 1
        });
        buckets.cells[cell_index].members.push(marker_index);
    }

    buckets
}
