//! Server actions: validate input, check the caller, talk to the store.
//!
//! Every public action returns an [`ActionResult`]; failures are logged with
//! their typed error and handed to the UI as a localized message.

mod community;
mod inquiries;
mod items;

use crate::config::AppConfig;
use crate::error::{MarketError, Result};
use crate::geo::{coordinates_from_value, resolve_region, to_geo_point, RegionResolver, RegionTable};
use crate::models::Caller;
use crate::store::DocumentStore;
use crate::validation::{is_authenticated, ValidationReport};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// What the UI receives from an action
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-field messages when the payload failed validation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
}

impl<T> ActionResult<T> {
    fn from_result(action: &str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
                validation_errors: Vec::new(),
            },
            Err(err) => {
                match &err {
                    MarketError::Store(_) | MarketError::Geocoding(_) => {
                        error!(action = %action, error = %err, "Action failed")
                    }
                    _ => warn!(action = %action, error = %err, "Action rejected"),
                }
                let validation_errors = match &err {
                    MarketError::Validation(errors) => errors.clone(),
                    _ => Vec::new(),
                };
                Self {
                    success: false,
                    data: None,
                    error: Some(err.localized()),
                    validation_errors,
                }
            }
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Everything an action needs: the store, the region table and an optional geocoder
#[derive(Clone)]
pub struct Marketplace {
    store: Arc<dyn DocumentStore>,
    regions: Arc<RegionTable>,
    resolver: Option<Arc<dyn RegionResolver>>,
    geohash_precision: usize,
}

impl Marketplace {
    pub fn new(store: Arc<dyn DocumentStore>, regions: Arc<RegionTable>) -> Self {
        Self {
            store,
            regions,
            resolver: None,
            geohash_precision: AppConfig::default().geohash_precision,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn RegionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_geohash_precision(mut self, precision: usize) -> Self {
        self.geohash_precision = precision;
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    /// Fill in a missing `location.region` from `location.coordinates`
    async fn fill_region(&self, payload: &mut Value) {
        let Some(location) = payload.get_mut("location").and_then(Value::as_object_mut) else {
            return;
        };
        let has_region = location
            .get("region")
            .and_then(Value::as_str)
            .is_some_and(|region| !region.trim().is_empty());
        if has_region {
            return;
        }
        let Some(coords) = location.get("coordinates").and_then(coordinates_from_value) else {
            return;
        };

        match resolve_region(&self.regions, self.resolver.as_deref(), coords).await {
            Ok(Some(region)) => {
                location.insert("region".to_string(), Value::String(region));
            }
            Ok(None) => {}
            Err(err) => warn!("Region lookup failed, leaving region empty: {:#}", err),
        }
    }
}

fn require_caller(caller: Option<&Caller>) -> Result<&Caller> {
    match caller {
        Some(caller) if is_authenticated(Some(caller)) => Ok(caller),
        _ => Err(MarketError::Unauthenticated),
    }
}

fn ensure_valid(report: ValidationReport) -> Result<()> {
    if report.valid {
        Ok(())
    } else {
        Err(MarketError::Validation(report.errors))
    }
}

fn object_mut(payload: &mut Value) -> Result<&mut serde_json::Map<String, Value>> {
    payload
        .as_object_mut()
        .ok_or_else(|| MarketError::Validation(vec!["payload must be an object".to_string()]))
}

/// Stamp the caller's uid on `field`; a different uid already in the payload is refused
fn claim_owner_field(payload: &mut Value, field: &str, caller: &Caller) -> Result<()> {
    let object = object_mut(payload)?;
    match object.get(field) {
        Some(Value::String(uid)) if uid != &caller.uid => Err(MarketError::Forbidden(format!(
            "{} must match the signed-in user",
            field
        ))),
        _ => {
            object.insert(field.to_string(), Value::String(caller.uid.clone()));
            Ok(())
        }
    }
}

/// Rewrite `location.coordinates` from map-provider `{lat, lng}` to a stored geopoint
fn store_coordinates(payload: &mut Value) -> Result<()> {
    let Some(location) = payload.get_mut("location").and_then(Value::as_object_mut) else {
        return Ok(());
    };
    if let Some(coords) = location.get("coordinates").and_then(coordinates_from_value) {
        location.insert(
            "coordinates".to_string(),
            serde_json::to_value(to_geo_point(coords)).map_err(crate::store::StoreError::from)?,
        );
    }
    Ok(())
}

fn trim_fields(payload: &mut Value, fields: &[&str]) {
    let Some(object) = payload.as_object_mut() else {
        return;
    };
    for field in fields {
        if let Some(Value::String(text)) = object.get_mut(*field) {
            *text = text.trim().to_string();
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn owner_field_is_claimed() {
        let caller = Caller::user("u1");
        let mut payload = json!({});
        claim_owner_field(&mut payload, "sellerId", &caller).unwrap();
        assert_eq!(payload["sellerId"], "u1");

        let mut payload = json!({"sellerId": "u2"});
        assert!(matches!(
            claim_owner_field(&mut payload, "sellerId", &caller),
            Err(MarketError::Forbidden(_))
        ));
    }

    #[test]
    fn coordinates_become_geopoints() {
        let mut payload = json!({
            "location": {"region": "중구", "coordinates": {"lat": 37.56, "lng": 126.99}}
        });
        store_coordinates(&mut payload).unwrap();
        assert_eq!(
            payload["location"]["coordinates"],
            json!({"latitude": 37.56, "longitude": 126.99})
        );
    }

    #[test]
    fn failed_result_carries_localized_message() {
        let result: ActionResult<()> = ActionResult::from_result(
            "test",
            Err(MarketError::Validation(vec!["title is required".to_string()])),
        );
        assert!(!result.success);
        assert_eq!(result.validation_errors, vec!["title is required"]);
        assert!(result.error.unwrap().starts_with("입력값을 확인해주세요"));

        let ok = ActionResult::from_result("test", Ok(5));
        assert!(ok.success);
        assert_eq!(ok.into_data(), Some(5));
    }
}
