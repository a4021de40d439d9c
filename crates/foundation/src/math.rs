use crate::geo::GeoPoint;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;

/// Meters per degree of latitude on the WGS84 sphere approximation.
pub const METERS_PER_DEGREE: f64 = WGS84_A * std::f64::consts::PI / 180.0;

/// Distance in meters between two nearby points under a local
/// equirectangular projection centered on `origin`.
///
/// Accurate for the small spans coverage cells deal in; not a substitute
/// for geodesic distance over long arcs.
pub fn equirect_distance_m(origin: GeoPoint, p: GeoPoint) -> f64 {
    let dx = (p.lon - origin.lon) * METERS_PER_DEGREE * origin.lat.to_radians().cos();
    let dy = (p.lat - origin.lat) * METERS_PER_DEGREE;
    (dx * dx + dy * dy).sqrt()
}
