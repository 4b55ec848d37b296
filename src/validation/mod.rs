//! Advisory validation of create payloads, mirroring the database security rules.
//!
//! Every schema is built once from the shared [`schema`] engine so the client
//! and server paths evaluate the same rules. Passing validation is not an
//! authorization decision; see [`access`] for the ownership predicates.
//!
//! The schema walker decides presence and builds dotted paths; length, range,
//! email and URL checks are delegated to `validator`.

pub mod access;
pub mod content;
pub mod item;
pub mod schema;
pub mod studio;

pub use access::{
    can_modify_item, is_admin, is_authenticated, is_item_owner, is_owner, is_studio_owner,
};
pub use content::{is_valid_comment_data, is_valid_inquiry_data, is_valid_post_data};
pub use item::{is_valid_item_data, MAX_ITEM_PRICE, MAX_ORIGINAL_PRICE};
pub use schema::{FieldRule, Kind, NumberRule, Schema, ValidationReport};
pub use studio::is_valid_studio_data;
