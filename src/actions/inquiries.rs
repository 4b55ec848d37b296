use super::{ensure_valid, require_caller, ActionResult, Marketplace};
use crate::error::{MarketError, Result};
use crate::inquiry::{apply_transition, record_message, role_of, ActorRole};
use crate::models::{Caller, Inquiry, InquiryStatus, ItemStatus};
use crate::store::{Collection, Document, Filter, StoreError};
use crate::validation::is_valid_inquiry_data;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

/// Inquiry ids are `<item>_<buyer>_<n>`, where `n` counts the buyer's earlier
/// inquiries on the item
fn inquiry_id(item_id: &str, buyer_id: &str, earlier: usize) -> String {
    format!("{}_{}_{}", item_id, buyer_id, earlier + 1)
}

impl Marketplace {
    /// Open a conversation with the seller of `item_id`, or return the one already open
    pub async fn create_inquiry(
        &self,
        caller: Option<&Caller>,
        item_id: &str,
    ) -> ActionResult<Inquiry> {
        ActionResult::from_result(
            "create_inquiry",
            self.try_create_inquiry(caller, item_id).await,
        )
    }

    async fn try_create_inquiry(&self, caller: Option<&Caller>, item_id: &str) -> Result<Inquiry> {
        let caller = require_caller(caller)?;
        let (_, item) = self.load_item(item_id).await?;

        if item.seller_id == caller.uid {
            return Err(MarketError::InvalidRequest(
                "sellers cannot open inquiries on their own items".to_string(),
            ));
        }
        if item.status != ItemStatus::Active {
            return Err(MarketError::InvalidRequest(format!(
                "item {} is not accepting inquiries",
                item_id
            )));
        }

        let history = self
            .store
            .query(
                Collection::Inquiries,
                &[
                    Filter::eq("itemId", item_id)?,
                    Filter::eq("buyerId", &caller.uid)?,
                ],
            )
            .await?;
        let open = history.iter().find(|doc| doc.data["status"] == InquiryStatus::Active.as_str());
        if let Some(doc) = open {
            return Ok(doc.decode()?);
        }

        let payload = json!({
            "itemId": item_id,
            "buyerId": caller.uid,
            "sellerId": item.seller_id,
            "status": InquiryStatus::Active,
        });
        ensure_valid(is_valid_inquiry_data(&payload))?;

        // concurrent opens derive the same id, so at most one create lands
        let now = Utc::now();
        let inquiry = Inquiry {
            id: inquiry_id(item_id, &caller.uid, history.len()),
            item_id: item_id.to_string(),
            buyer_id: caller.uid.clone(),
            seller_id: item.seller_id,
            status: InquiryStatus::Active,
            message_count: 0,
            last_activity_at: now,
            created_at: now,
        };
        let data = serde_json::to_value(&inquiry).map_err(StoreError::from)?;
        match self.store.create(Collection::Inquiries, &inquiry.id, data).await {
            Ok(_) => {}
            Err(StoreError::AlreadyExists { .. }) => {
                debug!("Inquiry {} was opened concurrently, reusing it", inquiry.id);
                let (_, existing) = self.load_inquiry(&inquiry.id).await?;
                return Ok(existing);
            }
            Err(err) => return Err(err.into()),
        }

        info!("Inquiry {} opened on item {} by {}", inquiry.id, item_id, inquiry.buyer_id);
        Ok(inquiry)
    }

    /// Seller (or admin) closes the deal
    pub async fn complete_inquiry(
        &self,
        caller: Option<&Caller>,
        inquiry_id: &str,
    ) -> ActionResult<Inquiry> {
        ActionResult::from_result(
            "complete_inquiry",
            self.transition_inquiry(caller, inquiry_id, InquiryStatus::Completed).await,
        )
    }

    /// Seller (or admin) calls the deal off
    pub async fn cancel_inquiry(
        &self,
        caller: Option<&Caller>,
        inquiry_id: &str,
    ) -> ActionResult<Inquiry> {
        ActionResult::from_result(
            "cancel_inquiry",
            self.transition_inquiry(caller, inquiry_id, InquiryStatus::Cancelled).await,
        )
    }

    /// Either party flags the conversation
    pub async fn report_inquiry(
        &self,
        caller: Option<&Caller>,
        inquiry_id: &str,
    ) -> ActionResult<Inquiry> {
        ActionResult::from_result(
            "report_inquiry",
            self.transition_inquiry(caller, inquiry_id, InquiryStatus::Reported).await,
        )
    }

    /// Bump the message counter of an open inquiry. Participants only.
    pub async fn record_inquiry_message(
        &self,
        caller: Option<&Caller>,
        inquiry_id: &str,
    ) -> ActionResult<Inquiry> {
        let result: Result<Inquiry> = async {
            let caller = require_caller(caller)?;
            let (doc, mut inquiry) = self.load_inquiry(inquiry_id).await?;
            match role_of(caller, &inquiry) {
                Some(ActorRole::Buyer) | Some(ActorRole::Seller) => {}
                _ => {
                    return Err(MarketError::Forbidden(format!(
                        "{} is not part of inquiry {}",
                        caller.uid, inquiry_id
                    )))
                }
            }

            record_message(&mut inquiry, Utc::now())?;
            self.store
                .update(
                    Collection::Inquiries,
                    &doc.id,
                    json!({
                        "messageCount": inquiry.message_count,
                        "lastActivityAt": inquiry.last_activity_at,
                    }),
                    Some(doc.version),
                )
                .await?;
            Ok(inquiry)
        }
        .await;
        ActionResult::from_result("record_inquiry_message", result)
    }

    pub async fn get_inquiry(
        &self,
        caller: Option<&Caller>,
        inquiry_id: &str,
    ) -> ActionResult<Inquiry> {
        let result: Result<Inquiry> = async {
            let caller = require_caller(caller)?;
            let (_, inquiry) = self.load_inquiry(inquiry_id).await?;
            if role_of(caller, &inquiry).is_none() {
                return Err(MarketError::Forbidden(format!(
                    "{} is not part of inquiry {}",
                    caller.uid, inquiry_id
                )));
            }
            Ok(inquiry)
        }
        .await;
        ActionResult::from_result("get_inquiry", result)
    }

    /// Read, check against the transition table, then write conditioned on the
    /// version that was read. A transition that lost a race gets a conflict.
    async fn transition_inquiry(
        &self,
        caller: Option<&Caller>,
        inquiry_id: &str,
        to: InquiryStatus,
    ) -> Result<Inquiry> {
        let caller = require_caller(caller)?;
        let (doc, mut inquiry) = self.load_inquiry(inquiry_id).await?;
        let role = role_of(caller, &inquiry).ok_or_else(|| {
            MarketError::Forbidden(format!("{} is not part of inquiry {}", caller.uid, inquiry_id))
        })?;

        let from = inquiry.status;
        apply_transition(&mut inquiry, to, role, Utc::now())?;

        self.store
            .update(
                Collection::Inquiries,
                &doc.id,
                json!({
                    "status": inquiry.status,
                    "lastActivityAt": inquiry.last_activity_at,
                }),
                Some(doc.version),
            )
            .await?;

        info!("Inquiry {} moved {} -> {} by {} {}", inquiry_id, from, to, role, caller.uid);
        Ok(inquiry)
    }

    async fn load_inquiry(&self, inquiry_id: &str) -> Result<(Document, Inquiry)> {
        let doc = self
            .store
            .get(Collection::Inquiries, inquiry_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("inquiry {}", inquiry_id)))?;
        let inquiry = doc.decode()?;
        Ok((doc, inquiry))
    }
}
