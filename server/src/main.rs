use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use server::{listings::load_listings, routes::router, server_state::ServerState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "listing-map-server")]
#[command(about = "Serves the listing map frontend, its listings and the map access key", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "LISTING_MAP_PORT", default_value_t = 8080)]
    port: u16,
    /// JSON file with the listings to show
    #[arg(long, env = "LISTING_MAP_LISTINGS", default_value = "data/listings.json")]
    listings: PathBuf,
    /// Built frontend
    #[arg(long, env = "LISTING_MAP_DIST", default_value = "frontend/dist")]
    dist: PathBuf,
    /// Access key for the map tiles, handed out on /config/maps_key
    #[arg(long, env = "MAPS_KEY")]
    maps_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    std::fs::create_dir_all("server/log").context("Failed to create log directory")?;
    let log_file = "server/log/server.log";

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .context("Failed to open log file")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let listings = load_listings(&args.listings).await?;
    tracing::info!("Loaded {} listings from {:?}", listings.len(), args.listings);

    if args.maps_key.is_none() {
        tracing::warn!("No map access key configured, the map will not load");
    }

    let state = Arc::new(ServerState {
        listings,
        maps_key: args.maps_key,
    });

    let app = router(state, &args.dist);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
