//! Boundary to the external mapping, places and directions service.
//!
//! The engine never talks to a concrete map library. It gets a [`MapPlatform`]
//! from an injected [`MapService`], which loads the platform at most once.

use std::{cell::RefCell, future::Future, rc::Rc};

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use listing_map_lib::{
    coordinate::Coordinate,
    route::{Route, TravelMode},
};

use crate::{config::PolylineStyle, error::{MapError, RouteError}, markers::MarkerCategory};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: Coordinate,
    pub title: String,
    pub color: String,
    pub category: MarkerCategory,
    /// Clicks on the marker are not also reported as clicks on the map
    pub capture_clicks: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoWindowSpec {
    pub anchor: Coordinate,
    /// HTML content
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
}

/// Completion of a directions request. Being `FnOnce`, it resolves at most once.
pub type RouteCallback = Box<dyn FnOnce(Result<Route, RouteError>)>;

/// Anything the service keeps rendered until told otherwise.
pub trait MapOverlay {
    fn remove(&mut self);
}

pub trait MapSurface {
    fn place_marker(&mut self, marker: &MarkerSpec, on_click: Box<dyn Fn()>) -> Box<dyn MapOverlay>;

    fn open_info_window(&mut self, window: &InfoWindowSpec) -> Box<dyn MapOverlay>;

    fn draw_polyline(&mut self, path: &[Coordinate], style: &PolylineStyle) -> Box<dyn MapOverlay>;

    /// Clicks on the map itself, not on a marker or overlay
    fn on_map_click(&mut self, on_click: Box<dyn Fn()>);

    fn destroy(&mut self);
}

pub trait DirectionsService {
    /// Starts a request. The service owns the request until it calls `on_complete`;
    /// there is no way to abort it.
    fn request_route(&self, request: RouteRequest, on_complete: RouteCallback);
}

/// A loaded mapping service.
pub trait MapPlatform {
    fn create_surface(&self, container: &str, view: MapView) -> Result<Box<dyn MapSurface>, String>;

    fn directions(&self) -> Rc<dyn DirectionsService>;
}

pub trait PlatformLoader {
    /// Fetches the service access key from the configuration endpoint.
    fn fetch_access_key(&self) -> impl Future<Output = Result<String, String>>;

    fn load(&self, access_key: String) -> impl Future<Output = Result<Rc<dyn MapPlatform>, String>>;
}

type LoadFuture = Shared<LocalBoxFuture<'static, Result<Rc<dyn MapPlatform>, MapError>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Ready,
    Failed(MapError),
}

/// Process scoped handle to the mapping service. Create one and pass it to every
/// map view; the first caller triggers the load and everyone else shares it.
pub struct MapService<L> {
    loader: Rc<L>,
    load: RefCell<Option<LoadFuture>>,
}

impl<L: PlatformLoader + 'static> MapService<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader: Rc::new(loader),
            load: RefCell::new(None),
        }
    }

    pub async fn platform(&self) -> Result<Rc<dyn MapPlatform>, MapError> {
        let load = self
            .load
            .borrow_mut()
            .get_or_insert_with(|| {
                let loader = Rc::clone(&self.loader);
                async move { load_platform(loader.as_ref()).await }
                    .boxed_local()
                    .shared()
            })
            .clone();

        load.await
    }

    pub fn state(&self) -> LoadState {
        match self.load.borrow().as_ref() {
            None => LoadState::NotLoaded,
            Some(load) => match load.peek() {
                None => LoadState::Loading,
                Some(Ok(_)) => LoadState::Ready,
                Some(Err(e)) => LoadState::Failed(e.clone()),
            },
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

async fn load_platform<L: PlatformLoader>(loader: &L) -> Result<Rc<dyn MapPlatform>, MapError> {
    tracing::info!("Loading map service");

    let access_key = loader.fetch_access_key().await.map_err(|e| {
        tracing::error!("Failed to fetch map access key: {e}");
        MapError::Credentials(e)
    })?;

    if access_key.trim().is_empty() {
        tracing::error!("Configuration endpoint returned an empty access key");
        return Err(MapError::Credentials("empty access key".into()));
    }

    let platform = loader.load(access_key).await.map_err(|e| {
        tracing::error!("Failed to load map service: {e}");
        MapError::ServiceLoad(e)
    })?;

    tracing::info!("Map service loaded");
    Ok(platform)
}
