use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a coordinate from nullable parts, as they come out of the listing data.
    /// Both parts must be present and finite.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(Self { lat, lng }),
            _ => None,
        }
    }

    /// Canonical text form with both parts rounded to `precision` decimals.
    pub fn rounded(&self, precision: usize) -> String {
        // -0.0 would otherwise print as "-0.00000" and split equal keys
        let lat = normalize_zero(self.lat);
        let lng = normalize_zero(self.lng);
        format!("{lat:.precision$},{lng:.precision$}")
    }
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

pub fn haversine_distance(p1: Coordinate, p2: Coordinate) -> f64 {
    const R: f64 = 6372.8; // Radius of the earth in km

    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lon = (p2.lng - p1.lng).to_radians();
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::asin(f64::sqrt(a));

    R * c
}
