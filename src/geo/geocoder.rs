use crate::geo::RegionTable;
use crate::models::Coordinates;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const KAKAO_BASE_URL: &str = "https://dapi.kakao.com";

/// Reverse geocoding provider: coordinates in, human-readable region out.
/// Lets the region lookup fall back to a map provider (Kakao, Naver, ...) when
/// the local table has nothing close enough.
#[async_trait]
pub trait RegionResolver: Send + Sync {
    /// Region name for the coordinates, `None` when the provider knows nothing
    async fn region_for(&self, coords: Coordinates) -> Result<Option<String>>;

    /// Get the name of the provider
    fn provider_name(&self) -> &'static str;
}

/// Kakao Local API reverse geocoder
pub struct KakaoGeocoder {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RegionCodeResponse {
    documents: Vec<RegionDocument>,
}

#[derive(Debug, Deserialize)]
struct RegionDocument {
    region_type: String,
    #[serde(default)]
    region_2depth_name: String,
    #[serde(default)]
    region_3depth_name: String,
}

impl KakaoGeocoder {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: KAKAO_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Pick the administrative ("H") region, falling back to the legal ("B") one
    fn region_from_response(response: RegionCodeResponse) -> Option<String> {
        let document = response
            .documents
            .iter()
            .find(|doc| doc.region_type == "H")
            .or_else(|| response.documents.first())?;

        let name = format!(
            "{} {}",
            document.region_2depth_name.trim(),
            document.region_3depth_name.trim()
        );
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

#[async_trait]
impl RegionResolver for KakaoGeocoder {
    async fn region_for(&self, coords: Coordinates) -> Result<Option<String>> {
        let url = format!("{}/v2/local/geo/coord2regioncode.json", self.base_url);
        debug!("Reverse geocoding {},{} via {}", coords.lat, coords.lng, url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .query(&[("x", coords.lng), ("y", coords.lat)])
            .send()
            .await
            .context("Failed to reach Kakao geocoder")?;

        if !response.status().is_success() {
            warn!("Kakao geocoder returned status: {}", response.status());
            anyhow::bail!("Kakao geocoder failed: {}", response.status());
        }

        let body: RegionCodeResponse = response
            .json()
            .await
            .context("Failed to decode Kakao geocoder response")?;

        Ok(Self::region_from_response(body))
    }

    fn provider_name(&self) -> &'static str {
        "Kakao"
    }
}

/// Region for `coords`: the nearest table entry if one is in range, otherwise ask the provider
pub async fn resolve_region(
    table: &RegionTable,
    resolver: Option<&dyn RegionResolver>,
    coords: Coordinates,
) -> Result<Option<String>> {
    if let Some(region) = table.find_nearest_region(coords) {
        return Ok(Some(region.name.clone()));
    }

    match resolver {
        Some(resolver) => {
            info!(
                "No table region near {},{}, asking {}",
                coords.lat,
                coords.lng,
                resolver.provider_name()
            );
            resolver.region_for(coords).await
        }
        None => Ok(None),
    }
}
