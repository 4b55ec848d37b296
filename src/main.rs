use anyhow::{Context, Result};
use dongne_market::geo::{KakaoGeocoder, RegionTable};
use dongne_market::models::{Caller, Coordinates};
use dongne_market::store::MemoryStore;
use dongne_market::telemetry::init_tracing;
use dongne_market::{AppConfig, Marketplace};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Gangnam-gu office, used when no search center is given
const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 37.5172,
    lng: 127.0473,
};

/// One listing in the seed file, posted on behalf of `seller`
#[derive(Debug, Deserialize)]
struct SeedListing {
    seller: String,
    item: serde_json::Value,
}

fn parse_args() -> Result<(Coordinates, Option<f64>)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok((DEFAULT_CENTER, None)),
        [lat, lng] | [lat, lng, _] => {
            let lat = lat.parse::<f64>().context("Invalid latitude")?;
            let lng = lng.parse::<f64>().context("Invalid longitude")?;
            let radius = match args.get(2) {
                Some(radius) => Some(radius.parse::<f64>().context("Invalid radius")?),
                None => None,
            };
            Ok((Coordinates::new(lat, lng), radius))
        }
        _ => anyhow::bail!("usage: dongne-market [lat lng [radius_km]]"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("🥕 Dongne Market - nearby listings");
    info!("==================================");

    let config = AppConfig::from_env()?;
    let (center, radius) = parse_args()?;
    let radius = radius.unwrap_or(config.default_search_radius_km);

    let regions =
        RegionTable::load(config.regions_file.as_deref(), config.nearest_region_max_km).await?;
    let mut market = Marketplace::new(Arc::new(MemoryStore::new()), Arc::new(regions))
        .with_geohash_precision(config.geohash_precision);
    if let Some(key) = &config.kakao_api_key {
        market = market.with_resolver(Arc::new(KakaoGeocoder::new(key.clone())?));
        info!("Kakao reverse geocoding enabled");
    }

    // Seed the store through the same action the UI uses
    let seed = tokio::fs::read_to_string(&config.seed_file)
        .await
        .with_context(|| format!("Failed to read seed file {}", config.seed_file.display()))?;
    let listings: Vec<SeedListing> =
        serde_json::from_str(&seed).context("Failed to parse seed file")?;

    let mut accepted = 0;
    for listing in listings {
        let caller = Caller::user(listing.seller);
        let result = market.create_item(Some(&caller), listing.item).await;
        if result.success {
            accepted += 1;
        } else {
            warn!(
                "Seed listing rejected: {}",
                result.validation_errors.join("; ")
            );
        }
    }
    info!("Seeded {} listings", accepted);

    let result = market.list_nearby_items(center, radius).await;
    let Some(nearby) = result.data else {
        anyhow::bail!(
            "Nearby search failed: {}",
            result.error.unwrap_or_default()
        );
    };

    info!(
        "\n✅ {} listings within {} km of {},{}\n",
        nearby.len(),
        radius,
        center.lat,
        center.lng
    );

    for (i, entry) in nearby.iter().enumerate() {
        let item = &entry.item;
        println!("{}. {} ({} 원)", i + 1, item.title, item.pricing.price);
        println!("   {:.2} km · {}", entry.distance_km, item.location.region);
        if let Some(geohash) = &item.geohash {
            println!("   Geohash: {}", geohash);
        }
        println!("   ID: {}", item.id);
        println!();
    }

    let json = serde_json::to_string_pretty(&nearby)?;
    tokio::fs::write(&config.output_file, json).await?;
    info!("💾 Saved nearby listings to {}", config.output_file.display());

    Ok(())
}
