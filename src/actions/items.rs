use super::{
    claim_owner_field, ensure_valid, new_id, object_mut, require_caller, store_coordinates,
    trim_fields, ActionResult, Marketplace,
};
use crate::error::{MarketError, Result};
use crate::geo::{generate_geo_hash, is_valid_coordinates, nearby_items, NearbyItem};
use crate::models::{Caller, Coordinates, ItemStatus, MarketItem};
use crate::store::{Collection, Document, Filter};
use crate::validation::{can_modify_item, is_admin, is_item_owner, is_valid_item_data};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

impl Marketplace {
    /// Validate and publish a new listing for the signed-in seller
    pub async fn create_item(
        &self,
        caller: Option<&Caller>,
        payload: Value,
    ) -> ActionResult<MarketItem> {
        ActionResult::from_result("create_item", self.try_create_item(caller, payload).await)
    }

    async fn try_create_item(
        &self,
        caller: Option<&Caller>,
        mut payload: Value,
    ) -> Result<MarketItem> {
        let caller = require_caller(caller)?;
        claim_owner_field(&mut payload, "sellerId", caller)?;
        self.fill_region(&mut payload).await;
        ensure_valid(is_valid_item_data(&payload))?;

        trim_fields(&mut payload, &["title", "description"]);
        store_coordinates(&mut payload)?;

        let id = new_id();
        let now = Utc::now();
        let object = object_mut(&mut payload)?;
        object.insert("id".to_string(), json!(id));
        object.insert("status".to_string(), json!(ItemStatus::Active));
        object.insert("isReported".to_string(), json!(false));
        object.insert("isFeatured".to_string(), json!(false));
        object.insert("createdAt".to_string(), json!(now));
        object.insert("updatedAt".to_string(), json!(now));

        let mut item: MarketItem = serde_json::from_value(payload)
            .map_err(|err| MarketError::InvalidRequest(format!("malformed item: {}", err)))?;
        item.geohash = item
            .coordinates()
            .map(|coords| generate_geo_hash(coords, self.geohash_precision));

        let data = serde_json::to_value(&item).map_err(crate::store::StoreError::from)?;
        self.store.create(Collection::Items, &id, data).await?;

        info!("Listed item {} ({}) for seller {}", item.id, item.title, item.seller_id);
        Ok(item)
    }

    pub async fn get_item(&self, item_id: &str) -> ActionResult<MarketItem> {
        let result: Result<MarketItem> = async {
            let (_, item) = self.load_item(item_id).await?;
            Ok(item)
        }
        .await;
        ActionResult::from_result("get_item", result)
    }

    /// Move a listing between active / reserved / sold / hidden. Seller or admin only.
    pub async fn update_item_status(
        &self,
        caller: Option<&Caller>,
        item_id: &str,
        status: ItemStatus,
    ) -> ActionResult<MarketItem> {
        let result: Result<MarketItem> = async {
            let caller = require_caller(caller)?;
            let (doc, item) = self.load_item(item_id).await?;
            if !can_modify_item(Some(caller), &item) {
                return Err(MarketError::Forbidden(format!(
                    "{} cannot change item {}",
                    caller.uid, item_id
                )));
            }
            if item.status == status {
                return Ok(item);
            }

            self.patch_item(&doc, json!({"status": status, "updatedAt": Utc::now()}))
                .await
        }
        .await;
        ActionResult::from_result("update_item_status", result)
    }

    /// Flag a listing for moderation. Sellers cannot report their own items.
    pub async fn report_item(
        &self,
        caller: Option<&Caller>,
        item_id: &str,
    ) -> ActionResult<MarketItem> {
        let result: Result<MarketItem> = async {
            let caller = require_caller(caller)?;
            let (doc, item) = self.load_item(item_id).await?;
            if is_item_owner(Some(caller), &item) {
                return Err(MarketError::InvalidRequest("cannot report your own item".to_string()));
            }
            if item.is_reported {
                return Ok(item);
            }

            self.patch_item(&doc, json!({"isReported": true, "updatedAt": Utc::now()}))
                .await
        }
        .await;
        ActionResult::from_result("report_item", result)
    }

    pub async fn set_item_featured(
        &self,
        caller: Option<&Caller>,
        item_id: &str,
        featured: bool,
    ) -> ActionResult<MarketItem> {
        let result: Result<MarketItem> = async {
            let caller = require_caller(caller)?;
            if !is_admin(Some(caller)) {
                return Err(MarketError::Forbidden("only admins can feature items".to_string()));
            }
            let (doc, _) = self.load_item(item_id).await?;
            self.patch_item(&doc, json!({"isFeatured": featured, "updatedAt": Utc::now()}))
                .await
        }
        .await;
        ActionResult::from_result("set_item_featured", result)
    }

    /// Active listings within `radius_km` of `center`, nearest first
    pub async fn list_nearby_items(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> ActionResult<Vec<NearbyItem>> {
        let result: Result<Vec<NearbyItem>> = async {
            if !is_valid_coordinates(center) {
                return Err(MarketError::InvalidRequest(format!(
                    "invalid search center {},{}",
                    center.lat, center.lng
                )));
            }
            if !(radius_km.is_finite() && radius_km > 0.0) {
                return Err(MarketError::InvalidRequest(format!("invalid radius {}", radius_km)));
            }

            let docs = self
                .store
                .query(Collection::Items, &[Filter::eq("status", ItemStatus::Active)?])
                .await?;
            let items = docs
                .iter()
                .map(Document::decode::<MarketItem>)
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let nearby = nearby_items(items, center, radius_km);
            debug!(
                "{} of {} active items within {} km",
                nearby.len(),
                docs.len(),
                radius_km
            );
            Ok(nearby)
        }
        .await;
        ActionResult::from_result("list_nearby_items", result)
    }

    pub(super) async fn load_item(&self, item_id: &str) -> Result<(Document, MarketItem)> {
        let doc = self
            .store
            .get(Collection::Items, item_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("item {}", item_id)))?;
        let item = doc.decode()?;
        Ok((doc, item))
    }

    async fn patch_item(&self, doc: &Document, patch: Value) -> Result<MarketItem> {
        let updated = self
            .store
            .update(Collection::Items, &doc.id, patch, Some(doc.version))
            .await?;
        Ok(updated.decode()?)
    }
}
