use super::{
    claim_owner_field, ensure_valid, new_id, object_mut, require_caller, store_coordinates,
    trim_fields, ActionResult, Marketplace,
};
use crate::error::{MarketError, Result};
use crate::models::{Caller, Comment, Post, Studio};
use crate::store::{Collection, Filter, StoreError};
use crate::validation::{
    is_admin, is_owner, is_valid_comment_data, is_valid_post_data, is_valid_studio_data,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Attempts at bumping a post's comment counter before giving up
const COUNTER_ATTEMPTS: usize = 3;

/// Stamp id and timestamps onto a validated payload and decode it
fn finish_document<T: DeserializeOwned>(payload: &mut Value, id: &str, extra: Value) -> Result<T> {
    let now = Utc::now();
    let object = object_mut(payload)?;
    object.insert("id".to_string(), json!(id));
    object.insert("createdAt".to_string(), json!(now));
    object.insert("updatedAt".to_string(), json!(now));
    if let Value::Object(extra) = extra {
        object.extend(extra);
    }
    serde_json::from_value(payload.clone())
        .map_err(|err| MarketError::InvalidRequest(format!("malformed document: {}", err)))
}

impl Marketplace {
    pub async fn create_post(
        &self,
        caller: Option<&Caller>,
        payload: Value,
    ) -> ActionResult<Post> {
        ActionResult::from_result("create_post", self.try_create_post(caller, payload).await)
    }

    async fn try_create_post(&self, caller: Option<&Caller>, mut payload: Value) -> Result<Post> {
        let caller = require_caller(caller)?;
        claim_owner_field(&mut payload, "authorId", caller)?;
        self.fill_region(&mut payload).await;
        ensure_valid(is_valid_post_data(&payload))?;

        trim_fields(&mut payload, &["title", "content"]);
        store_coordinates(&mut payload)?;

        let post: Post = finish_document(&mut payload, &new_id(), json!({"commentCount": 0}))?;
        let data = serde_json::to_value(&post).map_err(StoreError::from)?;
        self.store.create(Collection::Posts, &post.id, data).await?;

        info!("Post {} created by {}", post.id, post.author_id);
        Ok(post)
    }

    /// Remove a post and its comments. Author or admin only.
    pub async fn delete_post(&self, caller: Option<&Caller>, post_id: &str) -> ActionResult<()> {
        let result: Result<()> = async {
            let caller = require_caller(caller)?;
            let post: Post = self
                .store
                .get(Collection::Posts, post_id)
                .await?
                .ok_or_else(|| MarketError::NotFound(format!("post {}", post_id)))?
                .decode()?;
            if !is_owner(Some(caller), &post.author_id) && !is_admin(Some(caller)) {
                return Err(MarketError::Forbidden(format!(
                    "{} cannot delete post {}",
                    caller.uid, post_id
                )));
            }

            // post first: a failure below leaves orphaned comments, never a half-emptied post
            self.store.delete(Collection::Posts, post_id).await?;
            let comments = self
                .store
                .query(Collection::Comments, &[Filter::eq("postId", post_id)?])
                .await?;
            for comment in &comments {
                self.store.delete(Collection::Comments, &comment.id).await?;
            }

            info!("Post {} deleted with {} comments by {}", post_id, comments.len(), caller.uid);
            Ok(())
        }
        .await;
        ActionResult::from_result("delete_post", result)
    }

    /// Comment on a post. `parentId` may point at a top-level comment only.
    pub async fn create_comment(
        &self,
        caller: Option<&Caller>,
        post_id: &str,
        payload: Value,
    ) -> ActionResult<Comment> {
        ActionResult::from_result(
            "create_comment",
            self.try_create_comment(caller, post_id, payload).await,
        )
    }

    async fn try_create_comment(
        &self,
        caller: Option<&Caller>,
        post_id: &str,
        mut payload: Value,
    ) -> Result<Comment> {
        let caller = require_caller(caller)?;
        claim_owner_field(&mut payload, "authorId", caller)?;
        object_mut(&mut payload)?.insert("postId".to_string(), json!(post_id));
        ensure_valid(is_valid_comment_data(&payload))?;

        if self.store.get(Collection::Posts, post_id).await?.is_none() {
            return Err(MarketError::NotFound(format!("post {}", post_id)));
        }

        if let Some(parent_id) = payload.get("parentId").and_then(Value::as_str) {
            let parent: Comment = self
                .store
                .get(Collection::Comments, parent_id)
                .await?
                .ok_or_else(|| MarketError::NotFound(format!("comment {}", parent_id)))?
                .decode()?;
            if parent.post_id != post_id {
                return Err(MarketError::InvalidRequest(
                    "parent comment belongs to another post".to_string(),
                ));
            }
            if parent.parent_id.is_some() {
                return Err(MarketError::InvalidRequest(
                    "replies can only be one level deep".to_string(),
                ));
            }
        }

        trim_fields(&mut payload, &["content"]);
        let comment: Comment = finish_document(&mut payload, &new_id(), json!({}))?;
        let data = serde_json::to_value(&comment).map_err(StoreError::from)?;
        self.store.create(Collection::Comments, &comment.id, data).await?;

        if let Err(err) = self.bump_comment_count(post_id).await {
            if let Err(cleanup) = self.store.delete(Collection::Comments, &comment.id).await {
                warn!("Failed to roll back comment {}: {}", comment.id, cleanup);
            }
            return Err(err);
        }
        debug!("Comment {} added to post {}", comment.id, post_id);
        Ok(comment)
    }

    /// Comments of a post, oldest first
    pub async fn list_comments(&self, post_id: &str) -> ActionResult<Vec<Comment>> {
        let result: Result<Vec<Comment>> = async {
            let docs = self
                .store
                .query(Collection::Comments, &[Filter::eq("postId", post_id)?])
                .await?;
            let mut comments = docs
                .iter()
                .map(|doc| doc.decode::<Comment>())
                .collect::<std::result::Result<Vec<_>, _>>()?;
            comments.sort_by_key(|comment| comment.created_at);
            Ok(comments)
        }
        .await;
        ActionResult::from_result("list_comments", result)
    }

    /// Increment under a version check, re-reading when another writer got there first
    async fn bump_comment_count(&self, post_id: &str) -> Result<()> {
        let mut last_err = None;
        for _ in 0..COUNTER_ATTEMPTS {
            let doc = self
                .store
                .get(Collection::Posts, post_id)
                .await?
                .ok_or_else(|| MarketError::NotFound(format!("post {}", post_id)))?;
            let count = doc.data.get("commentCount").and_then(Value::as_u64).unwrap_or(0);

            match self
                .store
                .update(
                    Collection::Posts,
                    post_id,
                    json!({"commentCount": count + 1}),
                    Some(doc.version),
                )
                .await
            {
                Ok(_) => return Ok(()),
                Err(err @ StoreError::VersionMismatch { .. }) => last_err = Some(err),
                Err(err) => return Err(err.into()),
            }
        }
        Err(last_err
            .map(MarketError::from)
            .unwrap_or_else(|| MarketError::Conflict(format!("post {}", post_id))))
    }

    pub async fn create_studio(
        &self,
        caller: Option<&Caller>,
        payload: Value,
    ) -> ActionResult<Studio> {
        ActionResult::from_result(
            "create_studio",
            self.try_create_studio(caller, payload).await,
        )
    }

    async fn try_create_studio(
        &self,
        caller: Option<&Caller>,
        mut payload: Value,
    ) -> Result<Studio> {
        let caller = require_caller(caller)?;
        claim_owner_field(&mut payload, "ownerId", caller)?;
        self.fill_region(&mut payload).await;
        ensure_valid(is_valid_studio_data(&payload))?;

        trim_fields(&mut payload, &["name", "description"]);
        store_coordinates(&mut payload)?;

        let studio: Studio = finish_document(&mut payload, &new_id(), json!({}))?;
        let data = serde_json::to_value(&studio).map_err(StoreError::from)?;
        self.store.create(Collection::Studios, &studio.id, data).await?;

        info!("Studio {} registered by {}", studio.id, studio.owner_id);
        Ok(studio)
    }
}
