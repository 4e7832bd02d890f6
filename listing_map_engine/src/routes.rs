use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use listing_map_lib::{
    coordinate::Coordinate,
    route::{Route, RouteStep, TravelMode},
};

/// Cache key built from rounded endpoints, so points a few centimeters apart share a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey(String);

impl RouteKey {
    pub fn new(origin: Coordinate, destination: Coordinate, mode: TravelMode, precision: usize) -> Self {
        Self(format!("{}:{}|{}", mode, origin.rounded(precision), destination.rounded(precision)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computed routes, plus the bookkeeping needed to never ask for the same route twice at once.
#[derive(Debug, Default)]
pub struct RouteCache {
    routes: HashMap<RouteKey, Route>,
    in_flight: HashSet<RouteKey>,
    /// Keys the current interaction is waiting on. Completions for other keys are cached but not drawn.
    wanted: HashSet<RouteKey>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RouteKey) -> Option<&Route> {
        self.routes.get(key)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Marks `key` as in flight. Returns false when a request for it is already out.
    pub fn begin(&mut self, key: RouteKey) -> bool {
        self.in_flight.insert(key)
    }

    pub fn finish(&mut self, key: &RouteKey) {
        self.in_flight.remove(key);
    }

    pub fn is_in_flight(&self, key: &RouteKey) -> bool {
        self.in_flight.contains(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Stores a computed route. An existing entry is kept.
    pub fn store(&mut self, key: RouteKey, route: Route) -> &Route {
        self.routes.entry(key).or_insert(route)
    }

    pub fn want(&mut self, key: RouteKey) {
        self.wanted.insert(key);
    }

    /// Returns whether `key` was wanted, and stops wanting it.
    pub fn take_wanted(&mut self, key: &RouteKey) -> bool {
        self.wanted.remove(key)
    }

    pub fn forget_wanted(&mut self) {
        self.wanted.clear();
    }
}

/// The step where the label goes: the first one whose cumulative distance reaches half of
/// the route's total distance. When the step distances never get there (the service
/// reported a larger total than its steps add up to), the middle step by index is used.
pub fn midpoint_step(route: &Route) -> Option<&RouteStep> {
    let steps: Vec<&RouteStep> = route.steps().collect();
    if steps.is_empty() {
        return None;
    }

    let half = route.total_distance() / 2.;
    let mut travelled = 0.;
    for &step in &steps {
        travelled += step.distance_m;
        if travelled >= half {
            return Some(step);
        }
    }

    Some(steps[steps.len() / 2])
}

/// Points for the route line. Falls back to the step end points when the
/// service sent no overview.
pub fn route_path(route: &Route) -> Vec<Coordinate> {
    if !route.overview_path.is_empty() {
        return route.overview_path.clone();
    }
    route.steps().map(|step| step.end).collect()
}
