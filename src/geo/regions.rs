use crate::geo::calculate_distance;
use crate::models::Coordinates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const BUNDLED_REGIONS: &str = include_str!("../../data/regions.json");

/// Default search distance for `find_nearest_region`
pub const DEFAULT_MAX_REGION_DISTANCE_KM: f64 = 5.0;

/// Named region and its center point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub name: String,
    pub center: Coordinates,
}

/// Immutable lookup table of region centers, loaded once at startup
#[derive(Debug, Clone)]
pub struct RegionTable {
    regions: Vec<Region>,
    max_distance_km: f64,
}

impl RegionTable {
    pub fn new(regions: Vec<Region>, max_distance_km: f64) -> Self {
        Self {
            regions,
            max_distance_km,
        }
    }

    /// Table shipped with the crate (Seoul districts)
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_REGIONS)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let regions: Vec<Region> =
            serde_json::from_str(json).context("Failed to parse region table")?;
        Ok(Self::new(regions, DEFAULT_MAX_REGION_DISTANCE_KM))
    }

    /// Load from `path` when given, otherwise fall back to the bundled table
    pub async fn load(path: Option<&Path>, max_distance_km: f64) -> Result<Self> {
        let table = match path {
            Some(path) => {
                info!("Loading region table from {}", path.display());
                let json = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read region table {}", path.display()))?;
                Self::from_json(&json)?
            }
            None => Self::bundled()?,
        };

        debug!("Region table holds {} regions", table.regions.len());
        Ok(table.with_max_distance(max_distance_km))
    }

    pub fn with_max_distance(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = max_distance_km;
        self
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    /// Nearest region center within the configured distance, if any
    pub fn find_nearest_region(&self, coords: Coordinates) -> Option<&Region> {
        self.regions
            .iter()
            .map(|region| (region, calculate_distance(coords, region.center)))
            .filter(|(_, distance)| *distance <= self.max_distance_km)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(region, _)| region)
    }
}
