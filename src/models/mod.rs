use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair as delivered by the map provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geopoint as stored in the document database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for GeoPoint {
    fn from(coords: Coordinates) -> Self {
        Self {
            latitude: coords.lat,
            longitude: coords.lng,
        }
    }
}

impl From<GeoPoint> for Coordinates {
    fn from(point: GeoPoint) -> Self {
        Self {
            lat: point.latitude,
            lng: point.longitude,
        }
    }
}

/// Marketplace item category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Electronics,
    Furniture,
    Clothing,
    Books,
    Sports,
    Hobby,
    Beauty,
    Instruments,
    Other,
}

impl ItemCategory {
    pub const ALL: &'static [&'static str] = &[
        "electronics",
        "furniture",
        "clothing",
        "books",
        "sports",
        "hobby",
        "beauty",
        "instruments",
        "other",
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TradeMethod {
    Direct,
    Delivery,
    Both,
}

impl TradeMethod {
    pub const ALL: &'static [&'static str] = &["direct", "delivery", "both"];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl ItemCondition {
    pub const ALL: &'static [&'static str] = &["new", "like_new", "good", "fair", "poor"];
}

/// Lifecycle status of a listing. Items are never deleted, only moved between these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    Reserved,
    Sold,
    Hidden,
}

impl ItemStatus {
    pub const ALL: &'static [&'static str] = &["active", "reserved", "sold", "hidden"];
}

/// The only currency listings may be priced in
pub const CURRENCY_KRW: &str = "KRW";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub price: i64,
    pub currency: String,
    #[serde(default)]
    pub negotiable: bool,
    pub trade_method: TradeMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Specs {
    pub condition: ItemCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<i64>,
}

/// Where an item or post is located
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

/// Marketplace listing as persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ItemCategory,
    pub pricing: Pricing,
    pub specs: Specs,
    pub location: Location,
    #[serde(default)]
    pub images: Vec<String>,
    pub seller_id: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub is_reported: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geohash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MarketItem {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.coordinates.map(Coordinates::from)
    }
}

/// Status of a buyer/seller conversation about one item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
    Reported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: String,
    pub item_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    #[serde(default)]
    pub status: InquiryStatus,
    #[serde(default)]
    pub message_count: u32,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostCategory {
    Free,
    Question,
    Review,
    Tips,
    Notice,
}

impl PostCategory {
    pub const ALL: &'static [&'static str] = &["free", "question", "review", "tips", "notice"];
}

/// Community post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub comment_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment on a post; `parent_id` points at a top-level comment for replies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StudioCategory {
    Dance,
    Music,
    Photo,
    Yoga,
    Art,
    Other,
}

impl StudioCategory {
    pub const ALL: &'static [&'static str] = &["dance", "music", "photo", "yoga", "art", "other"];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudioLocation {
    pub address: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Rentable studio space
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: StudioCategory,
    pub location: StudioLocation,
    #[serde(default)]
    pub contact: Contact,
    pub hourly_rate: i64,
    #[serde(default)]
    pub images: Vec<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Identity handed to us by the authentication provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Caller {
    pub uid: String,
    #[serde(default)]
    pub role: Role,
}

impl Caller {
    pub fn user(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            role: Role::User,
        }
    }

    pub fn admin(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            role: Role::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_conversion_is_lossless() {
        let coords = Coordinates::new(37.5665, 126.978);
        let point = GeoPoint::from(coords);
        assert_eq!(point.latitude, 37.5665);
        assert_eq!(point.longitude, 126.978);
        assert_eq!(Coordinates::from(point), coords);
    }

    #[test]
    fn item_enums_use_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_value(ItemCondition::LikeNew).unwrap(), "like_new");
        assert_eq!(serde_json::to_value(InquiryStatus::Cancelled).unwrap(), "cancelled");
        let pricing: Pricing = serde_json::from_value(serde_json::json!({
            "price": 1000,
            "currency": "KRW",
            "tradeMethod": "both"
        }))
        .unwrap();
        assert!(!pricing.negotiable);
        assert_eq!(pricing.trade_method, TradeMethod::Both);
    }
}
