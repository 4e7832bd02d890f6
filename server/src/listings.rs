use std::path::Path;

use anyhow::Context;
use listing_map_lib::listing::Listing;

/// Reads the listing snapshot exported by the data layer.
pub async fn load_listings(path: &Path) -> anyhow::Result<Vec<Listing>> {
    let json = tokio::fs::read_to_string(path).await
        .with_context(|| format!("Failed to read listings from {:?}", path))?;

    let listings: Vec<Listing> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse listings in {:?}", path))?;

    let missing = listings.iter().filter(|l| l.position().is_none()).count();
    if missing > 0 {
        tracing::warn!("{} of {} listings have no coordinates and will not be shown on the map", missing, listings.len());
    }

    Ok(listings)
}
