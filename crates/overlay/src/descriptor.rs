use std::collections::BTreeSet;

use foundation::geo::GeoPoint;
use foundation::shape::Shape;
use serde::{Deserialize, Serialize};

use crate::surface::OverlayKind;

/// `[longitude, latitude]` pair, the wire shape callers supply paths in.
pub type LonLat = [f64; 2];

/// Declarative geometry of a shape instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeGeometry {
    Polygon { path: Vec<LonLat> },
    Circle { center: LonLat, radius_m: f64 },
}

impl ShapeGeometry {
    pub fn kind(&self) -> OverlayKind {
        match self {
            ShapeGeometry::Polygon { .. } => OverlayKind::Polygon,
            ShapeGeometry::Circle { .. } => OverlayKind::Circle,
        }
    }

    pub fn to_shape(&self) -> Shape {
        match self {
            ShapeGeometry::Polygon { path } => {
                Shape::polygon(path.iter().map(|p| GeoPoint::new(p[0], p[1])).collect())
            }
            ShapeGeometry::Circle { center, radius_m } => {
                Shape::circle(GeoPoint::new(center[0], center[1]), *radius_m)
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrokeStyle {
    Solid,
    Dashed,
}

/// Style of a drawn polygon or circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub stroke_color: String,
    pub stroke_opacity: f64,
    pub stroke_weight: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_style: StrokeStyle,
    pub stroke_dasharray: [u32; 3],
}

impl OverlayStyle {
    /// Default style of the primary shape overlay.
    pub fn primary() -> Self {
        Self {
            stroke_color: "#006600".to_string(),
            stroke_opacity: 0.9,
            stroke_weight: 1.0,
            fill_color: "#FFAA00".to_string(),
            fill_opacity: 0.5,
            stroke_style: StrokeStyle::Solid,
            stroke_dasharray: [0, 0, 0],
        }
    }

    /// Default style of the cover-cell grid.
    pub fn cover_cells() -> Self {
        Self {
            stroke_color: "#000000".to_string(),
            stroke_opacity: 0.9,
            stroke_weight: 1.0,
            fill_color: "red".to_string(),
            fill_opacity: 0.1,
            stroke_style: StrokeStyle::Solid,
            stroke_dasharray: [0, 0, 0],
        }
    }
}

/// Style of the geohash text labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub font_size_px: f32,
    pub color: [f32; 4],
    pub halo_color: [f32; 4],
    pub halo_width_px: f32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size_px: 14.0,
            color: [1.0, 1.0, 1.0, 1.0],
            halo_color: [0.0, 0.0, 0.0, 0.85],
            halo_width_px: 2.0,
        }
    }
}

/// Set of event names a group's overlays should forward.
pub type EventSet = BTreeSet<String>;

/// The declarative props of one mounted shape instance. Owned by the
/// caller; the engine diffs consecutive descriptors structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub geometry: ShapeGeometry,
    pub style: OverlayStyle,
    pub draggable: bool,
    pub precision: u8,
    pub show_cover_cells: bool,
    pub show_labels: bool,
    pub cover_style: OverlayStyle,
    pub label_style: LabelStyle,
    pub events: EventSet,
    pub cover_events: EventSet,
    pub label_events: EventSet,
}

impl ShapeDescriptor {
    pub const DEFAULT_PRECISION: u8 = 5;

    /// Full validation of the descriptor, run before the engine mutates
    /// anything so every mount/update stays all-or-nothing.
    pub fn validate(&self) -> Result<(), crate::error::OverlayError> {
        if self.precision == 0 || self.precision > geohash::MAX_PRECISION {
            return Err(crate::error::OverlayError::InvalidPrecision(self.precision));
        }
        self.geometry.to_shape().validate()?;
        Ok(())
    }

    pub fn polygon(path: Vec<LonLat>) -> Self {
        Self::new(ShapeGeometry::Polygon { path })
    }

    pub fn circle(center: LonLat, radius_m: f64) -> Self {
        Self::new(ShapeGeometry::Circle { center, radius_m })
    }

    fn new(geometry: ShapeGeometry) -> Self {
        Self {
            geometry,
            style: OverlayStyle::primary(),
            draggable: false,
            precision: Self::DEFAULT_PRECISION,
            show_cover_cells: false,
            show_labels: false,
            cover_style: OverlayStyle::cover_cells(),
            label_style: LabelStyle::default(),
            events: EventSet::new(),
            cover_events: EventSet::new(),
            label_events: EventSet::new(),
        }
    }
}
