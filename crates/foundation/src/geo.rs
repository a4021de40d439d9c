/// Geographic coordinate in degrees, longitude first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Finite and within [-180, 180] x [-90, 90].
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Axis-aligned longitude/latitude rectangle (degrees).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoRect {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl GeoRect {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.lon_min + self.lon_max) * 0.5,
            (self.lat_min + self.lat_max) * 0.5,
        )
    }

    /// Corners counter-clockwise from the south-west: SW, SE, NE, NW.
    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            GeoPoint::new(self.lon_min, self.lat_min),
            GeoPoint::new(self.lon_max, self.lat_min),
            GeoPoint::new(self.lon_max, self.lat_max),
            GeoPoint::new(self.lon_min, self.lat_max),
        ]
    }

    /// Boundary-inclusive containment.
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lon >= self.lon_min
            && p.lon <= self.lon_max
            && p.lat >= self.lat_min
            && p.lat <= self.lat_max
    }

    /// Boundary-inclusive overlap with another rectangle.
    pub fn intersects(&self, other: &GeoRect) -> bool {
        self.lon_min <= other.lon_max
            && self.lon_max >= other.lon_min
            && self.lat_min <= other.lat_max
            && self.lat_max >= other.lat_min
    }
}
