use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Runtime settings, read from the environment (and `.env` when present)
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JSON region table replacing the bundled one
    pub regions_file: Option<PathBuf>,
    /// How far a point may be from a region center to count as inside it
    pub nearest_region_max_km: f64,
    pub geohash_precision: usize,
    pub default_search_radius_km: f64,
    /// Enables the Kakao reverse geocoder fallback
    pub kakao_api_key: Option<String>,
    pub seed_file: PathBuf,
    pub output_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            regions_file: None,
            nearest_region_max_km: 5.0,
            geohash_precision: 9,
            default_search_radius_km: 3.0,
            kakao_api_key: None,
            seed_file: PathBuf::from("data/seed_items.json"),
            output_file: PathBuf::from("nearby_items.json"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or blank variables keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            regions_file: get("REGIONS_FILE").map(PathBuf::from),
            nearest_region_max_km: parse_or(
                &get,
                "NEAREST_REGION_MAX_KM",
                defaults.nearest_region_max_km,
            )?,
            geohash_precision: parse_or(&get, "GEOHASH_PRECISION", defaults.geohash_precision)?,
            default_search_radius_km: parse_or(
                &get,
                "DEFAULT_SEARCH_RADIUS_KM",
                defaults.default_search_radius_km,
            )?,
            kakao_api_key: get("KAKAO_REST_API_KEY"),
            seed_file: get("SEED_FILE").map(PathBuf::from).unwrap_or(defaults.seed_file),
            output_file: get("OUTPUT_FILE").map(PathBuf::from).unwrap_or(defaults.output_file),
        };

        if !(1..=12).contains(&config.geohash_precision) {
            anyhow::bail!(
                "GEOHASH_PRECISION must be between 1 and 12, got {}",
                config.geohash_precision
            );
        }
        if config.nearest_region_max_km <= 0.0 || config.default_search_radius_km <= 0.0 {
            anyhow::bail!("Distances in the configuration must be positive");
        }

        tracing::info!("Application configuration loaded successfully.");
        Ok(config)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {} value: {}", name, raw)),
        None => Ok(default),
    }
}
