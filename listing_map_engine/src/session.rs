use std::{
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use listing_map_lib::coordinate::Coordinate;

use crate::{
    config::MapConfig,
    engine::{EventSink, MapEvent},
    error::MapError,
    service::{DirectionsService, MapService, MapSurface, MapView, PlatformLoader},
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one mount of a map view. Events from an older mount are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One live map surface together with the directions service it routes through.
pub struct MapSession {
    id: SessionId,
    view: MapView,
    surface: Box<dyn MapSurface>,
    directions: Rc<dyn DirectionsService>,
    live: bool,
}

impl MapSession {
    /// Loads the service if needed and creates the surface. Nothing is returned
    /// unless the surface is fully set up.
    pub async fn initialize<L: PlatformLoader + 'static>(
        service: &MapService<L>,
        container: &str,
        center: Option<Coordinate>,
        zoom: Option<f64>,
        config: &MapConfig,
        sink: EventSink,
    ) -> Result<Self, MapError> {
        if container.trim().is_empty() {
            return Err(MapError::SurfaceInit("no container to render into".into()));
        }

        let platform = service.platform().await?;

        let view = MapView {
            center: center.unwrap_or(config.fallback_center),
            zoom: zoom.unwrap_or(config.fallback_zoom),
        };

        let mut surface = platform.create_surface(container, view).map_err(|e| {
            tracing::error!("Failed to create map surface in '{container}': {e}");
            MapError::SurfaceInit(e)
        })?;

        let id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        surface.on_map_click(Box::new(move || sink(MapEvent::MapClicked { session: id })));

        tracing::info!("Map session {} ready in '{}' at {:?}", id, container, view);

        Ok(Self {
            id,
            view,
            surface,
            directions: platform.directions(),
            live: true,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn surface_mut(&mut self) -> &mut dyn MapSurface {
        self.surface.as_mut()
    }

    pub fn directions(&self) -> Rc<dyn DirectionsService> {
        Rc::clone(&self.directions)
    }

    /// Destroys the surface. Markers and overlays must be released before this.
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        self.surface.destroy();
        tracing::info!("Map session {} torn down", self.id);
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::fake::{event_queue, FakeLoader, FakeMap};

    #[test]
    fn defaults_center_and_zoom() {
        let fake = FakeMap::new();
        let service = MapService::new(FakeLoader::new(&fake));
        let config = MapConfig::default();
        let (sink, _) = event_queue();

        let session = block_on(MapSession::initialize(&service, "map", None, None, &config, sink)).unwrap();

        assert_eq!(session.view(), MapView { center: config.fallback_center, zoom: config.fallback_zoom });
        assert_eq!(fake.surfaces_created(), 1);
    }

    #[test]
    fn map_click_emits_event_for_this_session() {
        let fake = FakeMap::new();
        let service = MapService::new(FakeLoader::new(&fake));
        let (sink, events) = event_queue();

        let session = block_on(MapSession::initialize(&service, "map", Some(Coordinate::new(1., 2.)), Some(9.), &MapConfig::default(), sink)).unwrap();
        fake.click_map();

        assert_eq!(events.borrow_mut().pop_front(), Some(MapEvent::MapClicked { session: session.id() }));
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let fake = FakeMap::new();
        let service = MapService::new(FakeLoader::new(&fake));
        let (sink, _) = event_queue();
        let config = MapConfig::default();

        let a = block_on(MapSession::initialize(&service, "map", None, None, &config, Rc::clone(&sink))).unwrap();
        let b = block_on(MapSession::initialize(&service, "map", None, None, &config, sink)).unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(service.loader().loads(), 1);
    }

    #[test]
    fn surface_failure_yields_no_session() {
        let fake = FakeMap::new();
        fake.fail_surface_creation("container has no size");
        let service = MapService::new(FakeLoader::new(&fake));
        let (sink, _) = event_queue();

        let result = block_on(MapSession::initialize(&service, "map", None, None, &MapConfig::default(), sink));

        assert_eq!(result.err(), Some(MapError::SurfaceInit("container has no size".into())));
    }

    #[test]
    fn empty_container_is_rejected_before_loading() {
        let fake = FakeMap::new();
        let service = MapService::new(FakeLoader::new(&fake));
        let (sink, _) = event_queue();

        let result = block_on(MapSession::initialize(&service, "", None, None, &MapConfig::default(), sink));

        assert!(matches!(result, Err(MapError::SurfaceInit(_))));
        assert_eq!(service.loader().key_fetches(), 0);
    }

    #[test]
    fn dropping_a_live_session_destroys_its_surface() {
        let fake = FakeMap::new();
        let service = MapService::new(FakeLoader::new(&fake));
        let (sink, events) = event_queue();
        let session = block_on(MapSession::initialize(&service, "map", None, None, &MapConfig::default(), sink)).unwrap();

        drop(session);

        assert_eq!(fake.surfaces_destroyed(), 1);
        // The map click listener goes with the surface
        fake.click_map();
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn teardown_is_idempotent() {
        let fake = FakeMap::new();
        let service = MapService::new(FakeLoader::new(&fake));
        let (sink, _) = event_queue();
        let mut session = block_on(MapSession::initialize(&service, "map", None, None, &MapConfig::default(), sink)).unwrap();

        session.teardown();
        session.teardown();

        assert!(!session.is_live());
        assert_eq!(fake.surfaces_destroyed(), 1);
    }
}
