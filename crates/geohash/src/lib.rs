//! Base-32 geohash codec.
//!
//! A geohash identifies a rectangular lon/lat cell by interleaved binary
//! bisection of the longitude and latitude ranges, longitude bit first,
//! five bits per output character.

use foundation::geo::{GeoPoint, GeoRect};

/// The standard geohash alphabet ('a', 'i', 'l' and 'o' are excluded).
pub const BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest supported code length.
pub const MAX_PRECISION: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeohashError {
    InvalidPrecision(u8),
    InvalidCode(String),
}

impl std::fmt::Display for GeohashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeohashError::InvalidPrecision(p) => {
                write!(f, "precision must be in 1..={MAX_PRECISION}, got {p}")
            }
            GeohashError::InvalidCode(code) => write!(f, "invalid geohash code: {code:?}"),
        }
    }
}

impl std::error::Error for GeohashError {}

/// Encodes a point to a geohash of the given precision.
///
/// Bisection keeps the upper half on ties, so points on a cell boundary
/// encode into the cell on the greater side.
pub fn encode(point: GeoPoint, precision: u8) -> Result<String, GeohashError> {
    if precision == 0 || precision > MAX_PRECISION {
        return Err(GeohashError::InvalidPrecision(precision));
    }

    let mut lon = (-180.0_f64, 180.0_f64);
    let mut lat = (-90.0_f64, 90.0_f64);
    let mut code = String::with_capacity(precision as usize);
    let mut bits = 0usize;
    let mut bit = 0u8;
    let mut even = true; // longitude bit first

    while code.len() < precision as usize {
        if even {
            let mid = (lon.0 + lon.1) * 0.5;
            if point.lon >= mid {
                bits |= 1 << (4 - bit);
                lon.0 = mid;
            } else {
                lon.1 = mid;
            }
        } else {
            let mid = (lat.0 + lat.1) * 0.5;
            if point.lat >= mid {
                bits |= 1 << (4 - bit);
                lat.0 = mid;
            } else {
                lat.1 = mid;
            }
        }
        even = !even;

        if bit < 4 {
            bit += 1;
        } else {
            code.push(BASE32[bits] as char);
            bits = 0;
            bit = 0;
        }
    }

    Ok(code)
}

/// Decodes a geohash back to the rectangle it identifies.
pub fn decode_bounds(code: &str) -> Result<GeoRect, GeohashError> {
    if code.is_empty() || code.len() > MAX_PRECISION as usize {
        return Err(GeohashError::InvalidCode(code.to_string()));
    }

    let mut lon = (-180.0_f64, 180.0_f64);
    let mut lat = (-90.0_f64, 90.0_f64);
    let mut even = true;

    for c in code.chars() {
        let idx = BASE32
            .iter()
            .position(|&b| b as char == c)
            .ok_or_else(|| GeohashError::InvalidCode(code.to_string()))?;

        for shift in (0..5).rev() {
            let high = (idx >> shift) & 1 == 1;
            if even {
                let mid = (lon.0 + lon.1) * 0.5;
                if high {
                    lon.0 = mid;
                } else {
                    lon.1 = mid;
                }
            } else {
                let mid = (lat.0 + lat.1) * 0.5;
                if high {
                    lat.0 = mid;
                } else {
                    lat.1 = mid;
                }
            }
            even = !even;
        }
    }

    Ok(GeoRect::new(lon.0, lon.1, lat.0, lat.1))
}

/// Cell extent in degrees at the given precision: (lon span, lat span).
pub fn cell_size(precision: u8) -> Result<(f64, f64), GeohashError> {
    if precision == 0 || precision > MAX_PRECISION {
        return Err(GeohashError::InvalidPrecision(precision));
    }
    let total_bits = precision as u32 * 5;
    let lon_bits = total_bits.div_ceil(2);
    let lat_bits = total_bits / 2;
    Ok((
        360.0 / (1u64 << lon_bits) as f64,
        180.0 / (1u64 << lat_bits) as f64,
    ))
}

/// Codes of the up-to-8 cells adjacent to `code`, at the same precision.
///
/// Derived by shifting the cell center one cell width/height in each
/// compass direction. Longitude wraps at ±180°; shifts past the poles are
/// dropped, so polar cells report fewer than 8 neighbors.
pub fn neighbors(code: &str) -> Result<Vec<String>, GeohashError> {
    let rect = decode_bounds(code)?;
    let center = rect.center();
    let (dlon, dlat) = (rect.width(), rect.height());
    let precision = code.len() as u8;

    let mut out = Vec::with_capacity(8);
    for dy in [-1i8, 0, 1] {
        for dx in [-1i8, 0, 1] {
            if dx == 0 && dy == 0 {
                continue;
            }
            let lat = center.lat + dlat * f64::from(dy);
            if !(-90.0..=90.0).contains(&lat) {
                continue;
            }
            let mut lon = center.lon + dlon * f64::from(dx);
            if lon > 180.0 {
                lon -= 360.0;
            } else if lon < -180.0 {
                lon += 360.0;
            }
            out.push(encode(GeoPoint::new(lon, lat), precision)?);
        }
    }

    Ok(out)
}
