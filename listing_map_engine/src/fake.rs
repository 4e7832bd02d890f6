//! In-memory stand-in for the mapping service. Records every call, keeps
//! directions requests pending until a test completes them, and panics when
//! anything is drawn on a destroyed surface.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use listing_map_lib::{
    coordinate::Coordinate,
    route::{Route, RouteLeg, RouteStep},
};

use crate::{
    config::PolylineStyle,
    engine::{EventSink, MapEvent},
    error::RouteError,
    service::{
        DirectionsService, InfoWindowSpec, MapOverlay, MapPlatform, MapSurface, MapView, MarkerSpec, PlatformLoader,
        RouteCallback, RouteRequest,
    },
};

/// Sink that queues events for the test to feed back into the engine.
pub fn event_queue() -> (EventSink, Rc<RefCell<VecDeque<MapEvent>>>) {
    let queue = Rc::new(RefCell::new(VecDeque::new()));
    let events = Rc::clone(&queue);
    let sink: EventSink = Rc::new(move |event| events.borrow_mut().push_back(event));
    (sink, queue)
}

/// A four step route whose label lands on the second step.
pub fn straight_route(origin: Coordinate, destination: Coordinate, minutes: u32) -> Route {
    let steps: Vec<RouteStep> = (1..=4)
        .map(|i| {
            let t = i as f64 / 4.;
            RouteStep {
                distance_m: 100.,
                end: Coordinate::new(
                    origin.lat + (destination.lat - origin.lat) * t,
                    origin.lng + (destination.lng - origin.lng) * t,
                ),
            }
        })
        .collect();

    Route {
        legs: vec![RouteLeg {
            distance_m: 400.,
            duration_s: minutes as f64 * 60.,
            duration_text: Some(format!("{minutes} mins")),
            steps,
        }],
        overview_path: vec![origin, destination],
    }
}

struct FakeMarker {
    spec: MarkerSpec,
    on_click: Rc<dyn Fn()>,
    removed: bool,
}

struct FakeWindow {
    spec: InfoWindowSpec,
    removed: bool,
}

struct FakeLine {
    removed: bool,
}

#[derive(Default)]
struct FakeState {
    markers: Vec<FakeMarker>,
    windows: Vec<FakeWindow>,
    lines: Vec<FakeLine>,
    map_click: Option<Rc<dyn Fn()>>,
    route_requests: Vec<RouteRequest>,
    pending_routes: VecDeque<(RouteRequest, RouteCallback)>,
    surface_error: Option<String>,
    surfaces_created: usize,
    surfaces_destroyed: usize,
    destroyed: bool,
}

#[derive(Clone, Copy)]
enum OverlayKind {
    Marker,
    Window,
    Line,
}

struct FakeOverlay {
    kind: OverlayKind,
    index: usize,
    state: Rc<RefCell<FakeState>>,
}

impl MapOverlay for FakeOverlay {
    fn remove(&mut self) {
        let mut state = self.state.borrow_mut();
        match self.kind {
            OverlayKind::Marker => state.markers[self.index].removed = true,
            OverlayKind::Window => state.windows[self.index].removed = true,
            OverlayKind::Line => state.lines[self.index].removed = true,
        }
    }
}

/// Handle the test keeps to inspect and drive the fake service.
#[derive(Clone, Default)]
pub struct FakeMap {
    state: Rc<RefCell<FakeState>>,
}

impl FakeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that is not tied to a loaded platform.
    pub fn surface(&self) -> Box<dyn MapSurface> {
        Box::new(FakeSurface { state: Rc::clone(&self.state) })
    }

    pub fn fail_surface_creation(&self, message: &str) {
        self.state.borrow_mut().surface_error = Some(message.to_string());
    }

    pub fn surfaces_created(&self) -> usize {
        self.state.borrow().surfaces_created
    }

    pub fn surfaces_destroyed(&self) -> usize {
        self.state.borrow().surfaces_destroyed
    }

    pub fn placed_markers(&self) -> usize {
        self.state.borrow().markers.len()
    }

    pub fn live_markers(&self) -> usize {
        self.state.borrow().markers.iter().filter(|m| !m.removed).count()
    }

    /// Colors of every marker ever placed, in placement order.
    pub fn marker_colors(&self) -> Vec<String> {
        self.state.borrow().markers.iter().map(|m| m.spec.color.clone()).collect()
    }

    pub fn live_marker_titles(&self) -> Vec<String> {
        self.state.borrow().markers.iter().filter(|m| !m.removed).map(|m| m.spec.title.clone()).collect()
    }

    /// Clicks the newest live marker with this title. Returns false if there is none.
    /// Like leaflet paths, the click then bubbles to the map unless the marker captures it.
    pub fn click_marker_titled(&self, title: &str) -> bool {
        let target = self.state.borrow().markers.iter().rev()
            .find(|m| !m.removed && m.spec.title == title)
            .map(|m| (Rc::clone(&m.on_click), m.spec.capture_clicks));

        let Some((on_click, captured)) = target else {
            return false;
        };

        on_click();
        if !captured {
            self.click_map();
        }
        true
    }

    pub fn click_map(&self) {
        let on_click = self.state.borrow().map_click.clone();
        if let Some(on_click) = on_click {
            on_click();
        }
    }

    /// Contents of the info windows that are still open.
    pub fn open_info_windows(&self) -> Vec<String> {
        self.state.borrow().windows.iter().filter(|w| !w.removed).map(|w| w.spec.content.clone()).collect()
    }

    pub fn open_info_window_anchors(&self) -> Vec<Coordinate> {
        self.state.borrow().windows.iter().filter(|w| !w.removed).map(|w| w.spec.anchor).collect()
    }

    pub fn polylines_drawn(&self) -> usize {
        self.state.borrow().lines.len()
    }

    pub fn live_polylines(&self) -> usize {
        self.state.borrow().lines.iter().filter(|l| !l.removed).count()
    }

    /// Number of directions requests ever issued.
    pub fn route_requests(&self) -> usize {
        self.state.borrow().route_requests.len()
    }

    pub fn pending_routes(&self) -> usize {
        self.state.borrow().pending_routes.len()
    }

    pub fn pending_route_requests(&self) -> Vec<RouteRequest> {
        self.state.borrow().pending_routes.iter().map(|(request, _)| *request).collect()
    }

    /// Completes the oldest pending request with whatever `respond` makes of it.
    pub fn complete_next_route(&self, respond: impl FnOnce(&RouteRequest) -> Result<Route, RouteError>) -> bool {
        let pending = self.state.borrow_mut().pending_routes.pop_front();
        match pending {
            Some((request, on_complete)) => {
                on_complete(respond(&request));
                true
            }
            None => false,
        }
    }

    /// Completes every pending request with a straight route of `minutes`.
    pub fn complete_all_routes(&self, minutes: u32) -> usize {
        let mut completed = 0;
        while self.complete_next_route(|r| Ok(straight_route(r.origin, r.destination, minutes))) {
            completed += 1;
        }
        completed
    }
}

struct FakeSurface {
    state: Rc<RefCell<FakeState>>,
}

impl FakeSurface {
    fn overlay(&self, kind: OverlayKind, index: usize) -> Box<dyn MapOverlay> {
        Box::new(FakeOverlay { kind, index, state: Rc::clone(&self.state) })
    }

    fn assert_alive(&self) {
        assert!(!self.state.borrow().destroyed, "drawing on a destroyed surface");
    }
}

impl MapSurface for FakeSurface {
    fn place_marker(&mut self, marker: &MarkerSpec, on_click: Box<dyn Fn()>) -> Box<dyn MapOverlay> {
        self.assert_alive();
        let index = {
            let mut state = self.state.borrow_mut();
            state.markers.push(FakeMarker { spec: marker.clone(), on_click: Rc::from(on_click), removed: false });
            state.markers.len() - 1
        };
        self.overlay(OverlayKind::Marker, index)
    }

    fn open_info_window(&mut self, window: &InfoWindowSpec) -> Box<dyn MapOverlay> {
        self.assert_alive();
        let index = {
            let mut state = self.state.borrow_mut();
            state.windows.push(FakeWindow { spec: window.clone(), removed: false });
            state.windows.len() - 1
        };
        self.overlay(OverlayKind::Window, index)
    }

    fn draw_polyline(&mut self, _path: &[Coordinate], _style: &PolylineStyle) -> Box<dyn MapOverlay> {
        self.assert_alive();
        let index = {
            let mut state = self.state.borrow_mut();
            state.lines.push(FakeLine { removed: false });
            state.lines.len() - 1
        };
        self.overlay(OverlayKind::Line, index)
    }

    fn on_map_click(&mut self, on_click: Box<dyn Fn()>) {
        self.state.borrow_mut().map_click = Some(Rc::from(on_click));
    }

    fn destroy(&mut self) {
        let mut state = self.state.borrow_mut();
        state.destroyed = true;
        state.map_click = None;
        state.surfaces_destroyed += 1;
    }
}

struct FakeDirections {
    state: Rc<RefCell<FakeState>>,
}

impl DirectionsService for FakeDirections {
    fn request_route(&self, request: RouteRequest, on_complete: RouteCallback) {
        let mut state = self.state.borrow_mut();
        state.route_requests.push(request);
        state.pending_routes.push_back((request, on_complete));
    }
}

struct FakePlatform {
    state: Rc<RefCell<FakeState>>,
}

impl MapPlatform for FakePlatform {
    fn create_surface(&self, _container: &str, _view: MapView) -> Result<Box<dyn MapSurface>, String> {
        let mut state = self.state.borrow_mut();
        if let Some(e) = &state.surface_error {
            return Err(e.clone());
        }
        state.surfaces_created += 1;
        state.destroyed = false;
        Ok(Box::new(FakeSurface { state: Rc::clone(&self.state) }))
    }

    fn directions(&self) -> Rc<dyn DirectionsService> {
        Rc::new(FakeDirections { state: Rc::clone(&self.state) })
    }
}

/// Loader for the fake platform, counting how often it is asked to fetch and load.
pub struct FakeLoader {
    state: Rc<RefCell<FakeState>>,
    key: Result<String, String>,
    load_error: Option<String>,
    key_fetches: Cell<usize>,
    loads: Cell<usize>,
}

impl FakeLoader {
    pub fn new(map: &FakeMap) -> Self {
        Self {
            state: Rc::clone(&map.state),
            key: Ok("test-key".into()),
            load_error: None,
            key_fetches: Cell::new(0),
            loads: Cell::new(0),
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Ok(key.to_string());
        self
    }

    pub fn failing_key(mut self, message: &str) -> Self {
        self.key = Err(message.to_string());
        self
    }

    pub fn failing_load(mut self, message: &str) -> Self {
        self.load_error = Some(message.to_string());
        self
    }

    pub fn key_fetches(&self) -> usize {
        self.key_fetches.get()
    }

    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl PlatformLoader for FakeLoader {
    async fn fetch_access_key(&self) -> Result<String, String> {
        self.key_fetches.set(self.key_fetches.get() + 1);
        self.key.clone()
    }

    async fn load(&self, _access_key: String) -> Result<Rc<dyn MapPlatform>, String> {
        self.loads.set(self.loads.get() + 1);
        if let Some(e) = &self.load_error {
            return Err(e.clone());
        }
        Ok(Rc::new(FakePlatform { state: Rc::clone(&self.state) }))
    }
}
