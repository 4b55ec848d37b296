use crate::models::PostCategory;
use crate::validation::schema::{FieldRule, Kind, Schema, ValidationReport};
use serde_json::Value;
use std::sync::OnceLock;

pub const MAX_POST_TITLE_LEN: usize = 100;
pub const MAX_POST_CONTENT_LEN: usize = 5000;
pub const MAX_COMMENT_LEN: usize = 1000;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LEN: usize = 20;
pub const MAX_ATTACHMENTS: usize = 5;

fn post_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![
            FieldRule::required("title", Kind::text(MAX_POST_TITLE_LEN)),
            FieldRule::required("content", Kind::text(MAX_POST_CONTENT_LEN)),
            FieldRule::required("category", Kind::OneOf(PostCategory::ALL)),
            FieldRule::optional(
                "tags",
                Kind::TextList {
                    max_items: MAX_TAGS,
                    max_len: MAX_TAG_LEN,
                },
            ),
            FieldRule::optional("attachments", Kind::url_list(MAX_ATTACHMENTS)),
            FieldRule::optional(
                "location",
                Kind::object(vec![
                    FieldRule::required("region", Kind::text(100)),
                    FieldRule::optional("coordinates", Kind::Coordinates),
                ]),
            ),
            FieldRule::required("authorId", Kind::text(128)),
        ])
    })
}

fn comment_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![
            FieldRule::required("postId", Kind::text(128)),
            FieldRule::required("authorId", Kind::text(128)),
            FieldRule::required("content", Kind::text(MAX_COMMENT_LEN)),
            FieldRule::optional("parentId", Kind::text(128)),
        ])
    })
}

fn inquiry_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![
            FieldRule::required("itemId", Kind::text(128)),
            FieldRule::required("buyerId", Kind::text(128)),
            FieldRule::required("sellerId", Kind::text(128)),
            // new inquiries always start out active
            FieldRule::optional("status", Kind::OneOf(&["active"])),
        ])
    })
}

/// Check a community post create payload
pub fn is_valid_post_data(payload: &Value) -> ValidationReport {
    post_schema().validate(payload)
}

pub fn is_valid_comment_data(payload: &Value) -> ValidationReport {
    comment_schema().validate(payload)
}

pub fn is_valid_inquiry_data(payload: &Value) -> ValidationReport {
    inquiry_schema().validate(payload)
}
