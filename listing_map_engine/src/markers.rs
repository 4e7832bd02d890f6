use std::{collections::HashMap, rc::Rc};

use listing_map_lib::listing::{Listing, ListingId};

use crate::{
    config::MapConfig,
    display_mode::DisplayMode,
    engine::{EventSink, MapEvent},
    service::{MapOverlay, MapSurface, MarkerSpec},
    session::SessionId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerCategory {
    Listing,
    Poi,
    Gym,
    Grocery,
}

impl MarkerCategory {
    pub fn for_poi(category: &str) -> Self {
        match category.to_ascii_lowercase().as_str() {
            "gym" => MarkerCategory::Gym,
            "grocery" => MarkerCategory::Grocery,
            _ => MarkerCategory::Poi,
        }
    }

    pub fn is_secondary(&self) -> bool {
        !matches!(self, MarkerCategory::Listing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    Listing(ListingId),
    Poi { listing: ListingId, category: String },
}

/// Listing colors depend on whether listings are being compared side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerView {
    Comparison,
    #[default]
    Browse,
}

struct MarkerEntry {
    category: MarkerCategory,
    handle: Box<dyn MapOverlay>,
}

/// Owns every marker and route line the engine put on the surface.
#[derive(Default)]
pub struct MarkerRegistry {
    markers: HashMap<MarkerKey, MarkerEntry>,
    route_lines: Vec<Box<dyn MapOverlay>>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every marker with pins for `listings`. Listings without a position are skipped.
    /// In [`DisplayMode::ShowAll`] the POI markers of every listing are placed as well.
    #[allow(clippy::too_many_arguments)]
    pub fn place_listing_markers(
        &mut self,
        surface: &mut dyn MapSurface,
        listings: &[Listing],
        mode: DisplayMode,
        view: MarkerView,
        config: &MapConfig,
        sink: &EventSink,
        session: SessionId,
    ) {
        self.clear_markers();

        // Colors follow the input position, so a skipped listing still uses up its color
        for (index, listing) in listings.iter().enumerate() {
            let Some(position) = listing.position() else {
                tracing::debug!("Skipping listing {} without coordinates", listing.id);
                continue;
            };

            let color = match view {
                MarkerView::Comparison => config.palette_color(index).to_string(),
                MarkerView::Browse => config.single_color.clone(),
            };

            let spec = MarkerSpec {
                position,
                title: listing.label.clone(),
                color,
                category: MarkerCategory::Listing,
                capture_clicks: true,
            };

            let on_click = Rc::clone(sink);
            let listing_id = listing.id;
            let handle = surface.place_marker(&spec, Box::new(move || {
                on_click(MapEvent::ListingClicked { session, listing: listing_id })
            }));
            self.insert(MarkerKey::Listing(listing.id), MarkerCategory::Listing, handle);

            if mode == DisplayMode::ShowAll {
                self.place_poi_markers(surface, listing, config, sink, session);
            }
        }

        tracing::debug!("Placed {} listing markers", self.count(MarkerCategory::Listing));
    }

    pub fn place_poi_markers(
        &mut self,
        surface: &mut dyn MapSurface,
        listing: &Listing,
        config: &MapConfig,
        sink: &EventSink,
        session: SessionId,
    ) {
        for (category, poi) in &listing.pois {
            let Some(position) = poi.position() else {
                tracing::debug!("Skipping {} '{}' of listing {} without coordinates", category, poi.name, listing.id);
                continue;
            };

            let spec = MarkerSpec {
                position,
                title: poi.name.clone(),
                color: config.poi_color.clone(),
                category: MarkerCategory::for_poi(category),
                capture_clicks: true,
            };

            let on_click = Rc::clone(sink);
            let listing_id = listing.id;
            let poi_category = category.clone();
            let handle = surface.place_marker(&spec, Box::new(move || {
                on_click(MapEvent::PoiClicked { session, listing: listing_id, category: poi_category.clone() })
            }));

            let key = MarkerKey::Poi { listing: listing.id, category: category.clone() };
            self.insert(key, spec.category, handle);
        }
    }

    fn insert(&mut self, key: MarkerKey, category: MarkerCategory, handle: Box<dyn MapOverlay>) {
        // Duplicate ids in the input must not leak the earlier pin
        if let Some(mut old) = self.markers.insert(key, MarkerEntry { category, handle }) {
            old.handle.remove();
        }
    }

    pub fn track_route_line(&mut self, line: Box<dyn MapOverlay>) {
        self.route_lines.push(line);
    }

    pub fn clear_by_category(&mut self, category: MarkerCategory) {
        self.remove_where(|entry| entry.category == category);
    }

    /// Removes every POI, gym and grocery marker.
    pub fn clear_secondary(&mut self) {
        self.remove_where(|entry| entry.category.is_secondary());
    }

    pub fn clear_markers(&mut self) {
        self.remove_where(|_| true);
    }

    pub fn clear_routes(&mut self) {
        for mut line in self.route_lines.drain(..) {
            line.remove();
        }
    }

    pub fn clear_all(&mut self) {
        self.clear_markers();
        self.clear_routes();
    }

    fn remove_where(&mut self, predicate: impl Fn(&MarkerEntry) -> bool) {
        let keys: Vec<MarkerKey> = self.markers.iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();

        for key in keys {
            if let Some(mut entry) = self.markers.remove(&key) {
                entry.handle.remove();
            }
        }
    }

    pub fn count(&self, category: MarkerCategory) -> usize {
        self.markers.values().filter(|entry| entry.category == category).count()
    }

    pub fn secondary_count_for(&self, listing: ListingId) -> usize {
        self.markers.keys()
            .filter(|key| matches!(key, MarkerKey::Poi { listing: id, .. } if *id == listing))
            .count()
    }

    pub fn contains(&self, key: &MarkerKey) -> bool {
        self.markers.contains_key(key)
    }

    pub fn route_line_count(&self) -> usize {
        self.route_lines.len()
    }

    /// Number of live handles, markers and route lines together.
    pub fn len(&self) -> usize {
        self.markers.len() + self.route_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
