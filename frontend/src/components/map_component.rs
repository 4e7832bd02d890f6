use std::rc::Rc;

use gloo_console::{error, info};
use listing_map_engine::{markers::MarkerView, DisplayMode, EventSink, LoadState, MapConfig, MapEngine, MapError, MapEvent, MapService, MapSession};
use listing_map_lib::listing::Listing;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::leaflet_platform::LeafletLoader;

const CONTAINER_ID: &str = "listing-map";

/// The one map service of the app, shared by every map view.
#[derive(Clone)]
pub struct SharedService(pub Rc<MapService<LeafletLoader>>);

impl PartialEq for SharedService {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

pub enum MapMsg {
    SessionReady(Result<MapSession, MapError>),
    Map(MapEvent),
    ToggleMode,
}

pub struct MapComponent {
    engine: MapEngine,
    error: Option<MapError>,
}

#[derive(PartialEq, Properties, Clone)]
pub struct Props {
    pub service: SharedService,
    pub listings: Rc<Vec<Listing>>,
    pub view: MarkerView,
}

impl MapComponent {
    fn status(&self, ctx: &Context<Self>) -> Html {
        if let Some(e) = &self.error {
            return html! { <div class="map-status map-error">{format!("The map is unavailable: {e}")}</div> };
        }

        match ctx.props().service.0.state() {
            LoadState::NotLoaded | LoadState::Loading => html! { <div class="map-status">{"Loading map..."}</div> },
            LoadState::Ready | LoadState::Failed(_) => html! {},
        }
    }
}

impl Component for MapComponent {
    type Message = MapMsg;
    type Properties = Props;

    fn create(ctx: &Context<Self>) -> Self {
        let cb = ctx.link().callback(MapMsg::Map);
        let sink: EventSink = Rc::new(move |event| cb.emit(event));

        let mut engine = MapEngine::new(MapConfig::default(), sink);
        let props = ctx.props();
        engine.show_listings(props.listings.as_ref().clone(), props.view);

        Self { engine, error: None }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            let service = ctx.props().service.0.clone();
            let config = self.engine.config().clone();
            let sink = self.engine.sink();
            let cb = ctx.link().callback(MapMsg::SessionReady);

            spawn_local(async move {
                let session = MapSession::initialize(&service, CONTAINER_ID, None, None, &config, sink).await;
                cb.emit(session);
            });
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            MapMsg::SessionReady(Ok(session)) => {
                let id = self.engine.attach(session);
                info!(format!("Map session {} attached", id));
                true
            }
            MapMsg::SessionReady(Err(e)) => {
                error!(format!("Map failed to load: {e}"));
                self.error = Some(e);
                true
            }
            MapMsg::Map(event) => {
                self.engine.handle(event);
                false
            }
            MapMsg::ToggleMode => {
                let listings = ctx.props().listings.clone();
                let mode = self.engine.toggle_display_mode(&listings);
                info!(format!("Display mode: {:?}", mode));
                true
            }
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        let props = ctx.props();
        if props.listings != old_props.listings || props.view != old_props.view {
            self.engine.show_listings(props.listings.as_ref().clone(), props.view);
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let label = match self.engine.display_mode() {
            DisplayMode::OnInteraction => "Show all nearby places",
            DisplayMode::ShowAll => "Show places on click",
        };

        html! {
            <div class="map">
                <div id={CONTAINER_ID} class="map-surface"></div>
                {self.status(ctx)}
                <button class="mode-btn" onclick={ctx.link().callback(|_| MapMsg::ToggleMode)}>
                    {label}
                </button>
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.engine.teardown();
    }
}
