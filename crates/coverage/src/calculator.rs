use std::collections::{BTreeSet, VecDeque};

use foundation::geo::GeoPoint;
use foundation::shape::{Shape, ShapeError};
use geohash::GeohashError;

use crate::geometry::{rect_intersects_circle, rect_intersects_polygon};

#[derive(Debug, Clone, PartialEq)]
pub enum CoverageError {
    DegenerateShape(ShapeError),
    InvalidPrecision(u8),
    InvalidCode(String),
}

impl std::fmt::Display for CoverageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageError::DegenerateShape(err) => write!(f, "degenerate shape: {err}"),
            CoverageError::InvalidPrecision(p) => {
                write!(f, "precision must be in 1..={}, got {p}", geohash::MAX_PRECISION)
            }
            CoverageError::InvalidCode(code) => write!(f, "invalid geohash code: {code:?}"),
        }
    }
}

impl std::error::Error for CoverageError {}

impl From<ShapeError> for CoverageError {
    fn from(err: ShapeError) -> Self {
        CoverageError::DegenerateShape(err)
    }
}

impl From<GeohashError> for CoverageError {
    fn from(err: GeohashError) -> Self {
        match err {
            GeohashError::InvalidPrecision(p) => CoverageError::InvalidPrecision(p),
            GeohashError::InvalidCode(code) => CoverageError::InvalidCode(code),
        }
    }
}

/// Computes the set of geohash cells at `precision` whose rectangles
/// intersect `shape`. The `BTreeSet` gives the canonical ascending order.
///
/// The fill is seeded from the bounding box corners plus centroid and
/// expands only through intersecting cells, so the seed count stays O(1)
/// regardless of shape size. Non-convex polygons whose qualifying cells
/// form disconnected regions may be under-covered; circles and convex
/// polygons are covered exactly.
pub fn cover(shape: &Shape, precision: u8) -> Result<BTreeSet<String>, CoverageError> {
    if precision == 0 || precision > geohash::MAX_PRECISION {
        return Err(CoverageError::InvalidPrecision(precision));
    }
    shape.validate()?;

    let bbox = shape.bounding_rect();
    if bbox.is_empty() {
        return Err(CoverageError::DegenerateShape(ShapeError::EmptyBounds));
    }

    let mut seeds: Vec<GeoPoint> = bbox.corners().to_vec();
    seeds.push(bbox.center());

    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut frontier: VecDeque<String> = VecDeque::new();
    for seed in seeds {
        let code = geohash::encode(clamp_to_globe(seed), precision)?;
        if visited.insert(code.clone()) {
            frontier.push_back(code);
        }
    }

    let mut result: BTreeSet<String> = BTreeSet::new();
    while let Some(code) = frontier.pop_front() {
        let rect = geohash::decode_bounds(&code)?;
        let hit = match shape {
            Shape::Polygon(points) => rect_intersects_polygon(&rect, points),
            Shape::Circle { center, radius_m } => {
                rect_intersects_circle(&rect, *center, *radius_m)
            }
        };
        if !hit {
            continue;
        }
        for neighbor in geohash::neighbors(&code)? {
            if visited.insert(neighbor.clone()) {
                frontier.push_back(neighbor);
            }
        }
        result.insert(code);
    }

    Ok(result)
}

fn clamp_to_globe(p: GeoPoint) -> GeoPoint {
    GeoPoint::new(p.lon.clamp(-180.0, 180.0), p.lat.clamp(-90.0, 90.0))
}
