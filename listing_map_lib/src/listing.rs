use std::fmt;

use indexmap::IndexMap;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub i64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rental listing as resolved by the data layer. Coordinates are nullable there,
/// so they stay optional here and are checked at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub label: String,
    /// Nearby points of interest keyed by category name ("gym", "grocery", ...), in source order
    #[serde(default)]
    pub pois: IndexMap<String, PoiReference>,
}

impl Listing {
    pub fn new(id: i64, latitude: Option<f64>, longitude: Option<f64>, label: impl Into<String>) -> Self {
        Self {
            id: ListingId(id),
            latitude,
            longitude,
            label: label.into(),
            pois: IndexMap::new(),
        }
    }

    pub fn with_poi(mut self, category: impl Into<String>, poi: PoiReference) -> Self {
        self.pois.insert(category.into(), poi);
        self
    }

    pub fn position(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiReference {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Human readable distance from the listing, e.g. "350 m"
    #[serde(default)]
    pub distance: String,
    #[serde(default)]
    pub rating: Option<f32>,
}

impl PoiReference {
    pub fn new(name: impl Into<String>, latitude: Option<f64>, longitude: Option<f64>, distance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            distance: distance.into(),
            rating: None,
        }
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn position(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }
}
