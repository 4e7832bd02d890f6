use listing_map_lib::{coordinate::Coordinate, route::TravelMode};
use serde::{Deserialize, Serialize};

/// Colors for comparison views, assigned by listing position.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "rgb(230, 57, 70)",
    "rgb(0, 96, 255)",
    "rgb(41, 138, 67)",
    "rgb(255, 159, 28)",
    "rgb(142, 68, 173)",
    "rgb(0, 160, 255)",
    "rgb(214, 51, 132)",
    "rgb(96, 108, 56)",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub fallback_center: Coordinate,
    pub fallback_zoom: f64,
    pub palette: Vec<String>,
    /// Listing color outside comparison views
    pub single_color: String,
    pub poi_color: String,
    pub route_style: PolylineStyle,
    /// Decimals kept when rounding coordinates into route cache keys
    pub route_key_precision: usize,
    pub travel_mode: TravelMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            fallback_center: Coordinate::new(55.6761, 12.5683),
            fallback_zoom: 13.,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            single_color: "rgb(0, 96, 255)".into(),
            poi_color: "rgb(255, 159, 28)".into(),
            route_style: PolylineStyle::default(),
            route_key_precision: 5,
            travel_mode: TravelMode::Walking,
        }
    }
}

impl Default for PolylineStyle {
    fn default() -> Self {
        Self {
            color: "rgb(41, 138, 67)".into(),
            weight: 5.,
            opacity: 0.7,
        }
    }
}

impl MapConfig {
    /// Reads a config where every missing field keeps its default.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn palette_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return &self.single_color;
        }
        &self.palette[index % self.palette.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        let config = MapConfig::default();
        assert_eq!(config.palette.len(), 8);
        assert_eq!(config.palette_color(8), config.palette_color(0));
        assert_eq!(config.palette_color(9), config.palette_color(1));
        assert_ne!(config.palette_color(7), config.palette_color(0));
    }

    #[test]
    fn empty_palette_uses_single_color() {
        let config = MapConfig { palette: Vec::new(), ..MapConfig::default() };
        assert_eq!(config.palette_color(3), config.single_color);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MapConfig::from_json(r#"{"fallback_zoom": 11, "travel_mode": "driving"}"#).unwrap();
        assert_eq!(config.fallback_zoom, 11.);
        assert_eq!(config.travel_mode, TravelMode::Driving);
        assert_eq!(config.route_key_precision, 5);
        assert_eq!(config.fallback_center, Coordinate::new(55.6761, 12.5683));
    }
}
