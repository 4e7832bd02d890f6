use std::{path::Path, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use listing_map_lib::listing::ListingId;
use tower_http::services::{ServeDir, ServeFile};

use crate::server_state::ServerState;

pub fn router(state: Arc<ServerState>, dist_dir: &Path) -> Router {
    Router::new()
        .nest_service("/frontend/dist", ServeDir::new(dist_dir))
        .fallback_service(ServeFile::new(dist_dir.join("index.html")))
        .route("/listings", get(get_listings))
        .route("/listings/{listing_id}", get(get_listing))
        .route("/config/maps_key", get(get_maps_key))
        .with_state(state)
}

async fn get_listings(State(state): State<Arc<ServerState>>) -> Response {
    match bincode::serialize(&state.listings) {
        Ok(bytes) => Bytes::from_owner(bytes).into_response(),
        Err(err) => {
            tracing::error!("Failed to serialize listings: {err:?}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_listing(State(state): State<Arc<ServerState>>, UrlPath(listing_id): UrlPath<i64>) -> Response {
    let Some(listing) = state.listings.iter().find(|l| l.id == ListingId(listing_id)) else {
        tracing::debug!("Listing {} not found", listing_id);
        return StatusCode::NOT_FOUND.into_response();
    };

    match bincode::serialize(listing) {
        Ok(bytes) => Bytes::from_owner(bytes).into_response(),
        Err(err) => {
            tracing::error!("Failed to serialize listing {}: {err:?}", listing_id);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_maps_key(State(state): State<Arc<ServerState>>) -> Response {
    match &state.maps_key {
        Some(key) => key.clone().into_response(),
        None => {
            tracing::error!("Map access key requested but none is configured");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
