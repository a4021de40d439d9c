//! Geohash coverage of geographic shapes.
//!
//! `cover` computes the set of geohash cells at a given precision whose
//! rectangles intersect a shape; `expand` turns those codes into drawable
//! cell bounds (rectangle path + centroid).

pub mod calculator;
pub mod geometry;
pub mod result;

pub use calculator::*;
pub use result::*;
