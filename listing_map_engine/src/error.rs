use thiserror::Error;

/// Failures that end a map session before it is usable. Never retried automatically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Failed to fetch map access key: {0}")]
    Credentials(String),

    #[error("Failed to load map service: {0}")]
    ServiceLoad(String),

    #[error("Failed to initialize map surface: {0}")]
    SurfaceInit(String),
}

/// Failure of a single directions request. Absorbed by the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("No route between the given points")]
    NotFound,

    #[error("Directions request failed: {0}")]
    Failed(String),

    #[error("Malformed directions response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for RouteError {
    fn from(e: serde_json::Error) -> Self {
        RouteError::Malformed(e.to_string())
    }
}
