use crate::geo::{GeoPoint, GeoRect};
use crate::math::METERS_PER_DEGREE;

/// A geographic shape: a simple polygon (implicitly closed) or a circle
/// with a radius in meters.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon(Vec<GeoPoint>),
    Circle { center: GeoPoint, radius_m: f64 },
}

/// Reasons a shape cannot be processed.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeError {
    TooFewPoints(usize),
    InvalidCoordinate(GeoPoint),
    NonPositiveRadius(f64),
    /// The shape's longitude span crosses the ±180° meridian, which the
    /// axis-aligned bounding box cannot represent.
    AntimeridianSpan,
    EmptyBounds,
}

impl std::fmt::Display for ShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeError::TooFewPoints(n) => {
                write!(f, "polygon needs at least 3 points, got {n}")
            }
            ShapeError::InvalidCoordinate(p) => {
                write!(f, "coordinate out of range: ({}, {})", p.lon, p.lat)
            }
            ShapeError::NonPositiveRadius(r) => write!(f, "circle radius must be > 0, got {r}"),
            ShapeError::AntimeridianSpan => {
                write!(f, "shape spans the ±180° meridian")
            }
            ShapeError::EmptyBounds => write!(f, "shape has a zero-area bounding box"),
        }
    }
}

impl std::error::Error for ShapeError {}

impl Shape {
    pub fn polygon(points: Vec<GeoPoint>) -> Self {
        Shape::Polygon(points)
    }

    pub fn circle(center: GeoPoint, radius_m: f64) -> Self {
        Shape::Circle { center, radius_m }
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        match self {
            Shape::Polygon(points) => {
                if points.len() < 3 {
                    return Err(ShapeError::TooFewPoints(points.len()));
                }
                for p in points {
                    if !p.is_valid() {
                        return Err(ShapeError::InvalidCoordinate(*p));
                    }
                }
                if self.bounding_rect().is_empty() {
                    return Err(ShapeError::EmptyBounds);
                }
                Ok(())
            }
            Shape::Circle { center, radius_m } => {
                if !center.is_valid() {
                    return Err(ShapeError::InvalidCoordinate(*center));
                }
                if !radius_m.is_finite() || *radius_m <= 0.0 {
                    return Err(ShapeError::NonPositiveRadius(*radius_m));
                }
                let half_lon = circle_half_lon_degrees(*center, *radius_m);
                if center.lon - half_lon < -180.0 || center.lon + half_lon > 180.0 {
                    return Err(ShapeError::AntimeridianSpan);
                }
                Ok(())
            }
        }
    }

    /// Axis-aligned bounding box. Polygon boxes are the naive min/max of
    /// the vertices; circle boxes are clamped to ±90° latitude.
    pub fn bounding_rect(&self) -> GeoRect {
        match self {
            Shape::Polygon(points) => {
                let mut rect = GeoRect::new(
                    f64::INFINITY,
                    f64::NEG_INFINITY,
                    f64::INFINITY,
                    f64::NEG_INFINITY,
                );
                for p in points {
                    rect.lon_min = rect.lon_min.min(p.lon);
                    rect.lon_max = rect.lon_max.max(p.lon);
                    rect.lat_min = rect.lat_min.min(p.lat);
                    rect.lat_max = rect.lat_max.max(p.lat);
                }
                rect
            }
            Shape::Circle { center, radius_m } => {
                let half_lat = radius_m / METERS_PER_DEGREE;
                let half_lon = circle_half_lon_degrees(*center, *radius_m);
                GeoRect::new(
                    center.lon - half_lon,
                    center.lon + half_lon,
                    (center.lat - half_lat).max(-90.0),
                    (center.lat + half_lat).min(90.0),
                )
            }
        }
    }
}

fn circle_half_lon_degrees(center: GeoPoint, radius_m: f64) -> f64 {
    let scale = center.lat.to_radians().cos();
    if scale <= 0.0 {
        // Pole-centered circles span all longitudes.
        return 360.0;
    }
    radius_m / (METERS_PER_DEGREE * scale)
}

#[cfg(test)]
mod tests {
    use super::{Shape, ShapeError};
    use crate::geo::GeoPoint;

    fn unit_square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ]
    }

    #[test]
    fn valid_polygon_passes() {
        assert_eq!(Shape::polygon(unit_square()).validate(), Ok(()));
    }

    #[test]
    fn short_polygon_is_rejected() {
        let shape = Shape::polygon(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)]);
        assert_eq!(shape.validate(), Err(ShapeError::TooFewPoints(2)));
    }

    #[test]
    fn out_of_range_vertex_is_rejected() {
        let mut points = unit_square();
        points[2] = GeoPoint::new(181.0, 0.5);
        assert!(matches!(
            Shape::polygon(points).validate(),
            Err(ShapeError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn collinear_polygon_has_empty_bounds() {
        let shape = Shape::polygon(vec![
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(0.0, 3.0),
        ]);
        assert_eq!(shape.validate(), Err(ShapeError::EmptyBounds));
    }

    #[test]
    fn zero_radius_circle_is_rejected() {
        let shape = Shape::circle(GeoPoint::new(0.0, 0.0), 0.0);
        assert_eq!(shape.validate(), Err(ShapeError::NonPositiveRadius(0.0)));
    }

    #[test]
    fn circle_near_the_antimeridian_is_rejected() {
        let shape = Shape::circle(GeoPoint::new(179.99, 0.0), 50_000.0);
        assert_eq!(shape.validate(), Err(ShapeError::AntimeridianSpan));
    }

    #[test]
    fn polygon_bounding_rect_is_vertex_hull() {
        let rect = Shape::polygon(unit_square()).bounding_rect();
        assert_eq!(rect.lon_min, 0.0);
        assert_eq!(rect.lon_max, 1.0);
        assert_eq!(rect.lat_min, 0.0);
        assert_eq!(rect.lat_max, 1.0);
    }

    #[test]
    fn circle_bounding_rect_clamps_latitude() {
        let rect = Shape::circle(GeoPoint::new(0.0, 89.9), 50_000.0).bounding_rect();
        assert_eq!(rect.lat_max, 90.0);
        assert!(rect.lat_min < 89.9);
    }

    #[test]
    fn circle_bounding_rect_is_symmetric_at_the_equator() {
        let rect = Shape::circle(GeoPoint::new(10.0, 0.0), 10_000.0).bounding_rect();
        let eps = 1e-9;
        assert!((rect.center().lon - 10.0).abs() < eps);
        assert!(rect.center().lat.abs() < eps);
        assert!((rect.width() - rect.height()).abs() < eps);
    }
}
