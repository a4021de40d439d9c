//! Planar predicates used by the coverage flood fill.
//!
//! All tests are boundary-inclusive: a cell that merely touches a shape's
//! edge counts as intersecting it.

use foundation::geo::{GeoPoint, GeoRect};
use foundation::math::equirect_distance_m;

/// Ray-casting point-in-polygon test. The polygon is implicitly closed.
///
/// Points exactly on an edge may land on either side; callers that need
/// edge touches combine this with vertex/edge checks.
pub fn point_in_polygon(p: GeoPoint, polygon: &[GeoPoint]) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let t = (p.lat - a.lat) / (b.lat - a.lat);
            let crossing = a.lon + t * (b.lon - a.lon);
            if p.lon < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether segments a1-a2 and b1-b2 intersect (touching included).
pub fn segments_intersect(a1: GeoPoint, a2: GeoPoint, b1: GeoPoint, b2: GeoPoint) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

fn orientation(a: GeoPoint, b: GeoPoint, c: GeoPoint) -> f64 {
    (b.lon - a.lon) * (c.lat - a.lat) - (b.lat - a.lat) * (c.lon - a.lon)
}

fn on_segment(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> bool {
    p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

/// Whether a rectangle intersects a circle of `radius_m` meters around
/// `center`, comparing the closest point on the rectangle under a local
/// equirectangular projection at the center.
pub fn rect_intersects_circle(rect: &GeoRect, center: GeoPoint, radius_m: f64) -> bool {
    let closest = GeoPoint::new(
        center.lon.clamp(rect.lon_min, rect.lon_max),
        center.lat.clamp(rect.lat_min, rect.lat_max),
    );
    equirect_distance_m(center, closest) <= radius_m
}

/// Standard rectangle/polygon overlap test: bounding boxes must overlap,
/// then either a rectangle corner lies inside the polygon, a polygon vertex
/// lies inside the rectangle, or some pair of edges crosses.
pub fn rect_intersects_polygon(rect: &GeoRect, polygon: &[GeoPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut poly_bbox = GeoRect::new(
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
    );
    for p in polygon {
        poly_bbox.lon_min = poly_bbox.lon_min.min(p.lon);
        poly_bbox.lon_max = poly_bbox.lon_max.max(p.lon);
        poly_bbox.lat_min = poly_bbox.lat_min.min(p.lat);
        poly_bbox.lat_max = poly_bbox.lat_max.max(p.lat);
    }
    if !rect.intersects(&poly_bbox) {
        return false;
    }

    // Rectangle fully inside the polygon, or overlapping its interior.
    if rect.corners().iter().any(|c| point_in_polygon(*c, polygon)) {
        return true;
    }

    // Polygon fully inside the rectangle.
    if polygon.iter().any(|p| rect.contains(*p)) {
        return true;
    }

    // Crossing edges, including the implicit closing edge.
    let corners = rect.corners();
    for i in 0..4 {
        let r1 = corners[i];
        let r2 = corners[(i + 1) % 4];
        let mut j = polygon.len() - 1;
        for k in 0..polygon.len() {
            if segments_intersect(r1, r2, polygon[j], polygon[k]) {
                return true;
            }
            j = k;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::{point_in_polygon, rect_intersects_circle, rect_intersects_polygon, segments_intersect};
    use foundation::geo::{GeoPoint, GeoRect};

    fn triangle() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(4.0, 0.0),
            GeoPoint::new(2.0, 4.0),
        ]
    }

    #[test]
    fn point_in_polygon_basics() {
        let tri = triangle();
        assert!(point_in_polygon(GeoPoint::new(2.0, 1.0), &tri));
        assert!(!point_in_polygon(GeoPoint::new(-1.0, 1.0), &tri));
        assert!(!point_in_polygon(GeoPoint::new(2.0, 5.0), &tri));
    }

    #[test]
    fn segment_crossing_and_touching() {
        let o = GeoPoint::new(0.0, 0.0);
        assert!(segments_intersect(
            o,
            GeoPoint::new(2.0, 2.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(2.0, 0.0),
        ));
        // Touching at an endpoint counts.
        assert!(segments_intersect(
            o,
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 5.0),
        ));
        assert!(!segments_intersect(
            o,
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
        ));
    }

    #[test]
    fn circle_overlap_uses_closest_point() {
        let rect = GeoRect::new(0.0, 1.0, 0.0, 1.0);
        // ~111 km per degree at the equator.
        assert!(rect_intersects_circle(&rect, GeoPoint::new(2.0, 0.5), 120_000.0));
        assert!(!rect_intersects_circle(&rect, GeoPoint::new(2.0, 0.5), 100_000.0));
        // Center inside the rectangle always intersects.
        assert!(rect_intersects_circle(&rect, GeoPoint::new(0.5, 0.5), 1.0));
    }

    #[test]
    fn polygon_overlap_cases() {
        let tri = triangle();

        // Rectangle around the whole polygon.
        assert!(rect_intersects_polygon(
            &GeoRect::new(-1.0, 5.0, -1.0, 5.0),
            &tri
        ));
        // Rectangle fully inside the polygon.
        assert!(rect_intersects_polygon(
            &GeoRect::new(1.8, 2.2, 0.5, 1.0),
            &tri
        ));
        // Rectangle crossing an edge without containing a vertex.
        assert!(rect_intersects_polygon(
            &GeoRect::new(-1.0, 1.0, 0.5, 1.0),
            &tri
        ));
        // Rectangle in the bbox but outside the slanted edge.
        assert!(!rect_intersects_polygon(
            &GeoRect::new(3.6, 3.9, 3.0, 3.5),
            &tri
        ));
        // Disjoint bounding boxes.
        assert!(!rect_intersects_polygon(
            &GeoRect::new(10.0, 11.0, 10.0, 11.0),
            &tri
        ));
        // Sharing only an edge still counts.
        assert!(rect_intersects_polygon(
            &GeoRect::new(-2.0, 0.0, 0.0, 2.0),
            &tri
        ));
    }
}
