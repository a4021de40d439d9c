use foundation::geo::{GeoPoint, GeoRect};
use foundation::shape::Shape;

use crate::calculator::{CoverageError, cover};

/// One covered cell: its code, rectangle and centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct CellBounds {
    pub code: String,
    pub rect: GeoRect,
    pub center: GeoPoint,
}

impl CellBounds {
    /// Closed rectangle path, counter-clockwise from the south-west corner.
    pub fn path(&self) -> [GeoPoint; 4] {
        self.rect.corners()
    }
}

/// Complete coverage of one shape at one precision. Cells are sorted
/// ascending by code and the whole value is recomputed on any geometry or
/// precision change, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageResult {
    pub precision: u8,
    pub cells: Vec<CellBounds>,
}

impl CoverageResult {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn codes(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.code.clone()).collect()
    }
}

/// Expands geohash codes into their drawable cell bounds. Pure; callers own
/// any caching.
pub fn expand<I, S>(codes: I, precision: u8) -> Result<CoverageResult, CoverageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cells = Vec::new();
    for code in codes {
        let code = code.as_ref();
        let rect = geohash::decode_bounds(code)?;
        cells.push(CellBounds {
            code: code.to_string(),
            rect,
            center: rect.center(),
        });
    }
    Ok(CoverageResult { precision, cells })
}

/// Coverage in one step: cover the shape, then expand the codes.
pub fn cover_cells(shape: &Shape, precision: u8) -> Result<CoverageResult, CoverageError> {
    let codes = cover(shape, precision)?;
    expand(codes.iter(), precision)
}

/// Only the rectangle paths of the covering cells, for callers that draw
/// the grid without labels.
pub fn cover_paths(shape: &Shape, precision: u8) -> Result<Vec<[GeoPoint; 4]>, CoverageError> {
    Ok(cover_cells(shape, precision)?
        .cells
        .iter()
        .map(CellBounds::path)
        .collect())
}
