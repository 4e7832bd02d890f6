use std::{collections::HashSet, rc::Rc};

use listing_map_lib::{
    coordinate::{haversine_distance, Coordinate},
    listing::{Listing, ListingId, PoiReference},
    route::Route,
};

use crate::{
    config::MapConfig,
    display_mode::DisplayMode,
    error::{MapError, RouteError},
    markers::{MarkerRegistry, MarkerView},
    overlays::{OverlayCategory, OverlayCoordinator},
    routes::{midpoint_step, route_path, RouteCache, RouteKey},
    service::{InfoWindowSpec, MapService, PlatformLoader, RouteRequest},
    session::{MapSession, SessionId},
};

/// Everything the external service reports back. The host loop passes these to [`MapEngine::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    MapClicked { session: SessionId },
    ListingClicked { session: SessionId, listing: ListingId },
    PoiClicked { session: SessionId, listing: ListingId, category: String },
    RouteResolved { key: RouteKey, result: Result<Route, RouteError> },
}

/// Where service callbacks deliver their events.
pub type EventSink = Rc<dyn Fn(MapEvent)>;

pub struct MapEngine {
    config: MapConfig,
    sink: EventSink,
    session: Option<MapSession>,
    markers: MarkerRegistry,
    overlays: OverlayCoordinator,
    routes: RouteCache,
    mode: DisplayMode,
    view: MarkerView,
    listings: Vec<Listing>,
}

impl MapEngine {
    pub fn new(config: MapConfig, sink: EventSink) -> Self {
        Self {
            config,
            sink,
            session: None,
            markers: MarkerRegistry::new(),
            overlays: OverlayCoordinator::new(),
            routes: RouteCache::new(),
            mode: DisplayMode::default(),
            view: MarkerView::default(),
            listings: Vec::new(),
        }
    }

    /// Creates a fresh map session, replacing any previous one, and places the current listings on it.
    pub async fn mount<L: PlatformLoader + 'static>(
        &mut self,
        service: &MapService<L>,
        container: &str,
        center: Option<Coordinate>,
        zoom: Option<f64>,
    ) -> Result<SessionId, MapError> {
        self.teardown();

        let session = MapSession::initialize(service, container, center, zoom, &self.config, Rc::clone(&self.sink)).await?;
        Ok(self.attach(session))
    }

    /// Takes over a session created with [`MapSession::initialize`] and this engine's
    /// [`sink`](Self::sink). For hosts that cannot hold the engine across an await.
    pub fn attach(&mut self, session: MapSession) -> SessionId {
        self.teardown();

        let id = session.id();
        self.session = Some(session);
        self.place_listing_markers();
        id
    }

    pub fn sink(&self) -> EventSink {
        Rc::clone(&self.sink)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Replaces the listing set. Everything from the previous set is removed first.
    pub fn show_listings(&mut self, listings: Vec<Listing>, view: MarkerView) {
        self.overlays.close_all();
        self.clear_routes();
        self.listings = listings;
        self.view = view;
        self.place_listing_markers();
    }

    pub fn handle(&mut self, event: MapEvent) {
        match event {
            MapEvent::MapClicked { session } => {
                if self.is_current(session) {
                    self.overlays.close_all();
                }
            }
            MapEvent::ListingClicked { session, listing } => {
                if self.is_current(session) {
                    self.select_listing(listing);
                }
            }
            MapEvent::PoiClicked { session, listing, category } => {
                if self.is_current(session) {
                    self.select_poi(listing, &category);
                }
            }
            MapEvent::RouteResolved { key, result } => self.complete_route(key, result),
        }
    }

    /// Flips the display mode and rebuilds all markers for `listings` under the new mode.
    pub fn toggle_display_mode(&mut self, listings: &[Listing]) -> DisplayMode {
        self.mode = self.mode.toggled();
        self.markers.clear_secondary();
        self.clear_routes();
        self.listings = listings.to_vec();
        self.place_listing_markers();

        tracing::info!("Display mode is now {:?}", self.mode);
        self.mode
    }

    /// Draws the route between two points, from the cache when possible. The result
    /// shows up on the map; nothing is returned.
    pub fn draw_route(&mut self, origin: Coordinate, destination: Coordinate) {
        let mode = self.config.travel_mode;
        let key = RouteKey::new(origin, destination, mode, self.config.route_key_precision);

        if let Some(route) = self.routes.get(&key).cloned() {
            tracing::debug!("Route {} served from cache", key);
            self.render_route(&route);
            return;
        }

        let Some(session) = self.session.as_ref().filter(|s| s.is_live()) else {
            tracing::debug!("No live map session, not requesting route {}", key);
            return;
        };

        self.routes.want(key.clone());
        if !self.routes.begin(key.clone()) {
            tracing::debug!("Route {} already requested", key);
            return;
        }

        tracing::debug!("Requesting route {}", key);
        let sink = Rc::clone(&self.sink);
        let request = RouteRequest { origin, destination, mode };
        session.directions().request_route(request, Box::new(move |result| {
            sink(MapEvent::RouteResolved { key, result })
        }));
    }

    /// Releases every marker, overlay and route line, then destroys the surface.
    /// Requests still in flight are left to complete and are then ignored.
    pub fn teardown(&mut self) {
        self.markers.clear_all();
        self.overlays.close_all();
        self.routes.forget_wanted();

        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    pub fn overlays(&self) -> &OverlayCoordinator {
        &self.overlays
    }

    pub fn routes(&self) -> &RouteCache {
        &self.routes
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(MapSession::id)
    }

    pub fn is_live(&self) -> bool {
        self.session.as_ref().is_some_and(MapSession::is_live)
    }

    fn is_current(&self, session: SessionId) -> bool {
        let current = self.session_id() == Some(session);
        if !current {
            tracing::debug!("Ignoring event from stale session {}", session);
        }
        current
    }

    fn place_listing_markers(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let id = session.id();
        self.markers.place_listing_markers(session.surface_mut(), &self.listings, self.mode, self.view, &self.config, &self.sink, id);
    }

    /// Route lines, their labels, and whatever the last interaction was still waiting for.
    fn clear_routes(&mut self) {
        self.markers.clear_routes();
        self.overlays.close_category(OverlayCategory::RouteLabel);
        self.routes.forget_wanted();
    }

    fn select_listing(&mut self, id: ListingId) {
        let Some(listing) = self.listings.iter().find(|l| l.id == id).cloned() else {
            tracing::debug!("Clicked listing {} is no longer shown", id);
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.overlays.close_category(OverlayCategory::General);
        if let Some(position) = listing.position() {
            let window = session.surface_mut().open_info_window(&InfoWindowSpec {
                anchor: position,
                content: listing_info_html(&listing),
            });
            self.overlays.open(OverlayCategory::General, window);
        }

        match self.mode {
            DisplayMode::OnInteraction => {
                self.markers.clear_secondary();
                let session_id = session.id();
                self.markers.place_poi_markers(session.surface_mut(), &listing, &self.config, &self.sink, session_id);

                self.clear_routes();
                let Some(origin) = listing.position() else {
                    return;
                };
                // POIs at the same spot share one route
                let mut batch = HashSet::new();
                for poi in listing.pois.values() {
                    let Some(destination) = poi.position() else {
                        continue;
                    };
                    let key = RouteKey::new(origin, destination, self.config.travel_mode, self.config.route_key_precision);
                    if batch.insert(key) {
                        self.draw_route(origin, destination);
                    }
                }
            }
            DisplayMode::ShowAll => {
                // No new routes get drawn, so their labels stay until the map is clicked
                self.markers.clear_routes();
                self.routes.forget_wanted();
            }
        }
    }

    fn select_poi(&mut self, listing_id: ListingId, category: &str) {
        let Some(listing) = self.listings.iter().find(|l| l.id == listing_id) else {
            return;
        };
        let Some(poi) = listing.pois.get(category) else {
            return;
        };
        let Some(position) = poi.position() else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let content = poi_info_html(category, poi, listing.position());
        self.overlays.close_category(OverlayCategory::General);
        let window = session.surface_mut().open_info_window(&InfoWindowSpec { anchor: position, content });
        self.overlays.open(OverlayCategory::General, window);
    }

    fn complete_route(&mut self, key: RouteKey, result: Result<Route, RouteError>) {
        self.routes.finish(&key);

        let route = match result {
            Ok(route) => self.routes.store(key.clone(), route).clone(),
            Err(e) => {
                tracing::warn!("Route {} failed: {}", key, e);
                self.routes.take_wanted(&key);
                return;
            }
        };

        if self.routes.take_wanted(&key) {
            self.render_route(&route);
        } else {
            tracing::debug!("Route {} arrived after it stopped being needed", key);
        }
    }

    fn render_route(&mut self, route: &Route) {
        let Some(session) = self.session.as_mut().filter(|s| s.is_live()) else {
            tracing::debug!("Map session is gone, not drawing route");
            return;
        };

        let line = session.surface_mut().draw_polyline(&route_path(route), &self.config.route_style);
        self.markers.track_route_line(line);

        if let Some(step) = midpoint_step(route) {
            let label = session.surface_mut().open_info_window(&InfoWindowSpec {
                anchor: step.end,
                content: route.duration_text(),
            });
            self.overlays.open(OverlayCategory::RouteLabel, label);
        }
    }
}

fn listing_info_html(listing: &Listing) -> String {
    let mut html = format!("<b>{}</b>", escape_html(&listing.label));
    for (category, poi) in &listing.pois {
        html.push_str(&format!("<br>{}: {} ({})", escape_html(category), escape_html(&poi.name), escape_html(&poi.distance)));
    }
    html
}

fn poi_info_html(category: &str, poi: &PoiReference, from: Option<Coordinate>) -> String {
    let distance = if !poi.distance.is_empty() {
        escape_html(&poi.distance)
    } else if let (Some(from), Some(to)) = (from, poi.position()) {
        let km = haversine_distance(from, to);
        if km > 1. { format!("{:.1} km", km) } else { format!("{:.0} m", km * 1000.) }
    } else {
        String::new()
    };

    let mut html = format!("<b>{}</b><br>{}<br>{}", escape_html(&poi.name), escape_html(category), distance);
    if let Some(rating) = poi.rating {
        html.push_str(&format!("<br>Rating: {:.1}", rating));
    }
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
