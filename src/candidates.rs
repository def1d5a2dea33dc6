use crate::error::{Error, Result};
use std::collections::HashSet;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// An interior pixel position.
///
/// `x` is the column and `y` the row, counted from the top left corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub x: usize,
    pub y: usize,
}

impl Coordinate {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for Coordinate {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

/// Output of a single filter, before aggregation.
pub type CandidateSet = HashSet<Coordinate>;

/// Coordinates every filter agreed on.
pub type KeypointSet = HashSet<Coordinate>;

/// Fail unless the image has at least one interior pixel.
pub(crate) fn ensure_interior(width: usize, height: usize) -> Result<()> {
    if width < 3 || height < 3 {
        Err(Error::ImageTooSmall { width, height })
    } else {
        Ok(())
    }
}

/// Collect every interior pixel for which `keep(x, y)` holds.
///
/// Each row is scanned on its own into a private list and the lists are
/// merged into the set afterwards, so workers never share a collection.
pub(crate) fn collect_interior<F>(width: usize, height: usize, keep: F) -> CandidateSet
where
    F: Fn(usize, usize) -> bool + Sync,
{
    let keep = &keep;
    let scan_row = move |y: usize| {
        (1..width.saturating_sub(1))
            .filter(move |&x| keep(x, y))
            .map(move |x| Coordinate::new(x, y))
            .collect::<Vec<_>>()
    };
    let rows = 1..height.saturating_sub(1);
    #[cfg(not(feature = "rayon"))]
    let candidates = rows.flat_map(scan_row).collect();
    #[cfg(feature = "rayon")]
    let candidates = rows.into_par_iter().flat_map_iter(scan_row).collect();
    candidates
}
