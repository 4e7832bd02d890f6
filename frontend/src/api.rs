use futures::future::{select, Either};
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use listing_map_engine::{osrm, service::RouteRequest, RouteError};
use listing_map_lib::{listing::Listing, route::Route};

pub async fn make_request<ReturnType>(path: &str) -> Result<ReturnType, ()>
where
    ReturnType: serde::de::DeserializeOwned,
{
    let Ok(response) = Request::get(path).send().await else {
        return Err(());
    };

    if !response.ok() {
        return Err(());
    }

    let Ok(binary) = response.binary().await else {
        return Err(());
    };

    let Ok(result) = bincode::deserialize::<ReturnType>(&binary) else {
        return Err(());
    };

    Ok(result)
}

pub async fn get_listings() -> Result<Vec<Listing>, ()> {
    make_request("/listings").await
}

/// The key is plain text. Any failure here is a credential failure to the caller.
pub async fn get_maps_key() -> Result<String, String> {
    let response = Request::get("/config/maps_key")
        .send()
        .await
        .map_err(|e| format!("credential endpoint unreachable: {e}"))?;

    if !response.ok() {
        return Err(format!("credential endpoint answered {}", response.status()));
    }

    response.text().await.map_err(|e| format!("unreadable key: {e}"))
}

const ROUTE_TIMEOUT_MS: u32 = 15_000;

/// Gives up after [`ROUTE_TIMEOUT_MS`] so a hung request does not keep its route marked in flight.
pub async fn get_route(base: &str, request: &RouteRequest) -> Result<Route, RouteError> {
    let fetch = Box::pin(fetch_route(base, request));
    let timeout = TimeoutFuture::new(ROUTE_TIMEOUT_MS);

    match select(fetch, timeout).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(RouteError::Failed(format!("no answer within {} ms", ROUTE_TIMEOUT_MS))),
    }
}

async fn fetch_route(base: &str, request: &RouteRequest) -> Result<Route, RouteError> {
    let url = osrm::route_url(base, request);

    let response = Request::get(&url)
        .send()
        .await
        .map_err(|e| RouteError::Failed(e.to_string()))?;

    let body = response.text().await.map_err(|e| RouteError::Failed(e.to_string()))?;
    osrm::parse_route_response(&body)
}
