//! Leaflet backed implementation of the engine's map service traits.

use std::rc::Rc;

use gloo_console::{error, info};
use gloo_utils::document;
use leaflet::{CircleMarker, CircleOptions, LatLng, Map, MapOptions, Polyline, PolylineOptions, Popup, PopupOptions, TileLayer, TileLayerOptions, Tooltip, TooltipOptions};
use listing_map_engine::{
    config::PolylineStyle,
    markers::MarkerCategory,
    service::{DirectionsService, InfoWindowSpec, MapOverlay, MapPlatform, MapSurface, MapView, MarkerSpec, PlatformLoader, RouteCallback, RouteRequest},
};
use listing_map_lib::coordinate::Coordinate;
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{js_sys::{self, Array}, HtmlElement};

use crate::api;

const OSRM_BASE: &str = "https://router.project-osrm.org";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(thread_local_v2)]
    static TOLERANT_RENDERER: JsValue;

    /// Any leaflet object that can be removed and listened to: layers, popups and the map itself.
    type Evented;

    #[wasm_bindgen(method)]
    fn on(this: &Evented, kind: &str, handler: &JsValue);

    #[wasm_bindgen(method)]
    fn remove(this: &Evented);
}

/// Fetches the tile key from the server and checks that the leaflet script is present.
pub struct LeafletLoader;

impl PlatformLoader for LeafletLoader {
    async fn fetch_access_key(&self) -> Result<String, String> {
        api::get_maps_key().await
    }

    async fn load(&self, access_key: String) -> Result<Rc<dyn MapPlatform>, String> {
        let has_leaflet = js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("L")).unwrap_or(false);
        if !has_leaflet {
            return Err("leaflet script is not loaded".into());
        }

        info!("Leaflet is available");
        Ok(Rc::new(LeafletPlatform {
            tile_key: access_key,
            directions: Rc::new(OsrmDirections { base: OSRM_BASE.into() }),
        }))
    }
}

struct LeafletPlatform {
    tile_key: String,
    directions: Rc<OsrmDirections>,
}

impl MapPlatform for LeafletPlatform {
    fn create_surface(&self, container: &str, view: MapView) -> Result<Box<dyn MapSurface>, String> {
        let element = document()
            .get_element_by_id(container)
            .ok_or_else(|| format!("no element with id '{container}'"))?;
        let element: HtmlElement = element
            .dyn_into()
            .map_err(|_| format!("'{container}' is not an html element"))?;

        let map = Map::new_with_element(&element, &MapOptions::default());
        map.set_max_zoom(19.);
        map.set_view(&lat_lng(view.center), view.zoom);
        add_tile_layer(&map, &self.tile_key);

        Ok(Box::new(LeafletSurface {
            map,
            map_click: None,
            destroyed: false,
        }))
    }

    fn directions(&self) -> Rc<dyn DirectionsService> {
        self.directions.clone()
    }
}

struct LeafletSurface {
    map: Map,
    map_click: Option<Closure<dyn Fn()>>,
    destroyed: bool,
}

/// A layer on the map. Holds on to its click handler so the closure lives as long as the layer.
struct LeafletOverlay {
    layer: Evented,
    _on_click: Option<Closure<dyn Fn()>>,
    removed: bool,
}

impl LeafletOverlay {
    fn new(layer: JsValue, on_click: Option<Closure<dyn Fn()>>) -> Self {
        Self {
            layer: layer.unchecked_into(),
            _on_click: on_click,
            removed: false,
        }
    }
}

impl MapOverlay for LeafletOverlay {
    fn remove(&mut self) {
        if !self.removed {
            self.layer.remove();
            self.removed = true;
        }
    }
}

impl MapSurface for LeafletSurface {
    fn place_marker(&mut self, marker: &MarkerSpec, on_click: Box<dyn Fn()>) -> Box<dyn MapOverlay> {
        let opts = CircleOptions::new();
        opts.set_radius(if marker.category == MarkerCategory::Listing { 9. } else { 6. });
        opts.set_color(marker.color.clone());
        opts.set_fill_color(marker.color.clone());
        opts.set_fill_opacity(0.8);
        // Vector markers pass their clicks on to the map unless told not to
        let _ = js_sys::Reflect::set(&opts, &JsValue::from_str("bubblingMouseEvents"), &JsValue::from_bool(!marker.capture_clicks));

        let circle = CircleMarker::new_with_options(&lat_lng(marker.position), &opts);

        let tooltip_opts = TooltipOptions::default();
        tooltip_opts.set_direction("top".into());
        let tooltip = Tooltip::new(&tooltip_opts, None);
        tooltip.set_content(&marker.title.clone().into());
        circle.bind_tooltip(&tooltip);

        let handler = Closure::wrap(on_click);
        circle.unchecked_ref::<Evented>().on("click", handler.as_ref());
        circle.add_to(&self.map);

        Box::new(LeafletOverlay::new(circle.into(), Some(handler)))
    }

    fn open_info_window(&mut self, window: &InfoWindowSpec) -> Box<dyn MapOverlay> {
        // The engine decides what closes; leaflet must not close popups on its own.
        let opts = PopupOptions::default();
        opts.set_auto_close(false);
        opts.set_close_on_click(false);

        let popup = Popup::new(&opts, None);
        popup.set_lat_lng(&lat_lng(window.anchor));
        popup.set_content(&window.content.clone().into());
        popup.open_on(&self.map);

        Box::new(LeafletOverlay::new(popup.into(), None))
    }

    fn draw_polyline(&mut self, path: &[Coordinate], style: &PolylineStyle) -> Box<dyn MapOverlay> {
        let opts = PolylineOptions::new();
        opts.set_color(style.color.clone());
        opts.set_weight(style.weight);
        opts.set_opacity(style.opacity);
        opts.set_smooth_factor(1.5);
        opts.set_renderer(TOLERANT_RENDERER.with(JsValue::clone));

        let points = path.iter().map(|c| lat_lng(*c));
        let polyline = Polyline::new_with_options(&Array::from_iter(points), &opts);
        polyline.add_to(&self.map);

        Box::new(LeafletOverlay::new(polyline.into(), None))
    }

    fn on_map_click(&mut self, on_click: Box<dyn Fn()>) {
        let handler = Closure::wrap(on_click);
        self.map.unchecked_ref::<Evented>().on("click", handler.as_ref());
        self.map_click = Some(handler);
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.map.unchecked_ref::<Evented>().remove();
            self.map_click = None;
            self.destroyed = true;
        }
    }
}

struct OsrmDirections {
    base: String,
}

impl DirectionsService for OsrmDirections {
    fn request_route(&self, request: RouteRequest, on_complete: RouteCallback) {
        let base = self.base.clone();
        spawn_local(async move {
            let result = api::get_route(&base, &request).await;
            if let Err(e) = &result {
                error!(format!("Route request failed: {e}"));
            }
            on_complete(result);
        });
    }
}

fn lat_lng(coordinate: Coordinate) -> LatLng {
    LatLng::new(coordinate.lat, coordinate.lng)
}

fn add_tile_layer(map: &Map, key: &str) {
    let url = format!("https://api.maptiler.com/maps/basic-v2/256/{{z}}/{{x}}/{{y}}.png?key={}", key.trim());
    let opts = TileLayerOptions::new();
    opts.set_update_when_idle(true);
    TileLayer::new_options(&url, &opts).add_to(map);
}
