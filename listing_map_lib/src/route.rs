use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Driving,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Driving => "driving",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A route as returned by the directions service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub legs: Vec<RouteLeg>,
    /// Simplified path for drawing the whole route
    pub overview_path: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_m: f64,
    pub duration_s: f64,
    /// Localized duration text when the service supplies one
    pub duration_text: Option<String>,
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub distance_m: f64,
    pub end: Coordinate,
}

impl Route {
    pub fn total_distance(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_m).sum()
    }

    pub fn total_duration(&self) -> f64 {
        self.legs.iter().map(|leg| leg.duration_s).sum()
    }

    pub fn steps(&self) -> impl Iterator<Item = &RouteStep> {
        self.legs.iter().flat_map(|leg| leg.steps.iter())
    }

    /// Duration as shown on the map. Uses the service text for single leg routes.
    pub fn duration_text(&self) -> String {
        if let [leg] = self.legs.as_slice() {
            if let Some(text) = &leg.duration_text {
                return text.clone();
            }
        }

        format_duration(self.total_duration())
    }
}

pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds.max(0.) / 60.).round() as u64;
    let hrs = minutes / 60;
    let mins = minutes % 60;

    if hrs > 0 {
        format!("{} h {} min", hrs, mins)
    } else {
        format!("{} min", mins.max(1))
    }
}
