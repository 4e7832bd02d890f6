//! Request building and response parsing for an OSRM compatible routing server.
//! The HTTP call itself is made by whoever implements [`DirectionsService`](crate::service::DirectionsService).

use listing_map_lib::{
    coordinate::Coordinate,
    route::{format_duration, Route, RouteLeg, RouteStep, TravelMode},
};
use serde::Deserialize;

use crate::{error::RouteError, service::RouteRequest};

pub fn profile(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Walking => "foot",
        TravelMode::Driving => "driving",
    }
}

/// OSRM wants longitude first.
pub fn route_url(base: &str, request: &RouteRequest) -> String {
    format!(
        "{}/route/v1/{}/{},{};{},{}?overview=simplified&geometries=geojson&steps=true",
        base.trim_end_matches('/'),
        profile(request.mode),
        request.origin.lng,
        request.origin.lat,
        request.destination.lng,
        request.destination.lat,
    )
}

#[derive(Deserialize)]
struct Response {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: Option<Geometry>,
    legs: Vec<OsrmLeg>,
}

#[derive(Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Deserialize)]
struct OsrmStep {
    distance: f64,
    geometry: Option<Geometry>,
    maneuver: Maneuver,
}

#[derive(Deserialize)]
struct Maneuver {
    location: [f64; 2],
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

fn to_coordinate([lng, lat]: [f64; 2]) -> Coordinate {
    Coordinate::new(lat, lng)
}

/// Turns the body of a `/route/v1` response into the first route it contains.
pub fn parse_route_response(body: &str) -> Result<Route, RouteError> {
    let response: Response = serde_json::from_str(body)?;

    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => return Err(RouteError::NotFound),
        code => {
            return Err(RouteError::Failed(match response.message {
                Some(message) => format!("{code}: {message}"),
                None => code.to_string(),
            }))
        }
    }

    let route = response.routes.into_iter().next().ok_or(RouteError::NotFound)?;

    let legs = route.legs.into_iter()
        .map(|leg| RouteLeg {
            distance_m: leg.distance,
            duration_s: leg.duration,
            duration_text: Some(format_duration(leg.duration)),
            steps: leg.steps.into_iter()
                .map(|step| {
                    // A step's maneuver sits where it starts; its geometry runs to where it ends
                    let end = step.geometry
                        .and_then(|g| g.coordinates.last().copied())
                        .unwrap_or(step.maneuver.location);
                    RouteStep { distance_m: step.distance, end: to_coordinate(end) }
                })
                .collect(),
        })
        .collect();

    let overview_path = route.geometry
        .map(|g| g.coordinates.into_iter().map(to_coordinate).collect())
        .unwrap_or_default();

    Ok(Route { legs, overview_path })
}
