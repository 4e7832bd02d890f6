use std::rc::Rc;

use components::map_component::{MapComponent, SharedService};
use gloo_console::{error, info};
use leaflet_platform::LeafletLoader;
use listing_map_engine::{markers::MarkerView, MapService};
use listing_map_lib::listing::Listing;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

mod api;
mod components;
mod leaflet_platform;

enum MainMsg {
    Listings(Vec<Listing>),
    ToggleComparison,
}

struct Model {
    service: SharedService,
    listings: Rc<Vec<Listing>>,
    view: MarkerView,
}

impl Component for Model {
    type Message = MainMsg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let cb = ctx.link().callback(MainMsg::Listings);
        spawn_local(async move {
            match api::get_listings().await {
                Ok(listings) => cb.emit(listings),
                Err(()) => error!("Failed to fetch listings"),
            }
        });

        Self {
            service: SharedService(Rc::new(MapService::new(LeafletLoader))),
            listings: Rc::new(Vec::new()),
            view: MarkerView::Browse,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            MainMsg::Listings(listings) => {
                info!(format!("Fetched {} listings", listings.len()));
                self.listings = Rc::new(listings);
            }
            MainMsg::ToggleComparison => {
                self.view = match self.view {
                    MarkerView::Browse => MarkerView::Comparison,
                    MarkerView::Comparison => MarkerView::Browse,
                };
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_compare = ctx.link().callback(|_| MainMsg::ToggleComparison);
        let compare_label = match self.view {
            MarkerView::Browse => "Compare listings",
            MarkerView::Comparison => "Stop comparing",
        };

        html! { <>
            <button onclick={on_compare} class="compare-btn">{compare_label}</button>
            <MapComponent service={self.service.clone()} listings={self.listings.clone()} view={self.view} />
        </> }
    }
}

fn main() {
    yew::Renderer::<Model>::new().render();
}
