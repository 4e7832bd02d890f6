use listing_map_lib::listing::Listing;

pub struct ServerState {
    pub listings: Vec<Listing>,
    /// Access key handed to the map frontend. `None` makes the config endpoint answer 404.
    pub maps_key: Option<String>,
}
