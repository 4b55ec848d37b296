use crate::models::{ItemCategory, ItemCondition, ItemStatus, TradeMethod, CURRENCY_KRW};
use crate::validation::schema::{FieldRule, Kind, NumberRule, Schema, ValidationReport};
use serde_json::Value;
use std::sync::OnceLock;

/// Highest price a listing may ask, in KRW
pub const MAX_ITEM_PRICE: i64 = 10_000_000;

/// Ceiling for the price paid when new, in KRW
pub const MAX_ORIGINAL_PRICE: i64 = 1_000_000_000;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_REGION_LEN: usize = 100;
pub const MAX_ITEM_IMAGES: usize = 10;

const CURRENCIES: &[&str] = &[CURRENCY_KRW];

fn item_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![
            FieldRule::required("title", Kind::text(MAX_TITLE_LEN)),
            FieldRule::required("description", Kind::text(MAX_DESCRIPTION_LEN)),
            FieldRule::required("category", Kind::OneOf(ItemCategory::ALL)),
            FieldRule::required(
                "pricing",
                Kind::object(vec![
                    FieldRule::required(
                        "price",
                        Kind::Number(NumberRule {
                            positive: true,
                            max: Some(MAX_ITEM_PRICE),
                            unit: CURRENCY_KRW,
                            ..Default::default()
                        }),
                    ),
                    FieldRule::required("currency", Kind::OneOf(CURRENCIES)),
                    FieldRule::optional("negotiable", Kind::Bool),
                    FieldRule::required("tradeMethod", Kind::OneOf(TradeMethod::ALL)),
                ]),
            ),
            FieldRule::required(
                "specs",
                Kind::object(vec![
                    FieldRule::required("condition", Kind::OneOf(ItemCondition::ALL)),
                    FieldRule::optional(
                        "originalPrice",
                        Kind::Number(NumberRule {
                            min: Some(0),
                            max: Some(MAX_ORIGINAL_PRICE),
                            unit: CURRENCY_KRW,
                            ..Default::default()
                        }),
                    ),
                ]),
            ),
            FieldRule::required(
                "location",
                Kind::object(vec![
                    FieldRule::required("region", Kind::text(MAX_REGION_LEN)),
                    FieldRule::optional("coordinates", Kind::Coordinates),
                ]),
            ),
            FieldRule::optional("images", Kind::url_list(MAX_ITEM_IMAGES)),
            FieldRule::required("sellerId", Kind::text(128)),
            FieldRule::optional("status", Kind::OneOf(ItemStatus::ALL)),
            FieldRule::optional("isReported", Kind::Bool),
            FieldRule::optional("isFeatured", Kind::Bool),
        ])
    })
}

/// Check a marketplace item create payload
pub fn is_valid_item_data(payload: &Value) -> ValidationReport {
    item_schema().validate(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_item() -> Value {
        json!({
            "title": "야마하 디지털 피아노 P-45",
            "description": "1년 사용, 상태 좋아요. 직거래 선호합니다.",
            "category": "instruments",
            "pricing": {
                "price": 350000,
                "currency": "KRW",
                "negotiable": true,
                "tradeMethod": "direct"
            },
            "specs": {"condition": "like_new", "originalPrice": 550000},
            "location": {
                "region": "마포구",
                "coordinates": {"lat": 37.5663, "lng": 126.9019}
            },
            "images": ["https://cdn.example.com/items/piano-1.jpg"],
            "sellerId": "seller-1"
        })
    }

    #[test]
    fn valid_payload_passes() {
        let report = is_valid_item_data(&valid_item());
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn each_missing_required_field_adds_one_error() {
        let required = [
            "title",
            "description",
            "category",
            "pricing",
            "specs",
            "location",
            "sellerId",
        ];
        for field in required {
            let mut payload = valid_item();
            payload.as_object_mut().unwrap().remove(field);
            let report = is_valid_item_data(&payload);
            assert!(!report.valid);
            assert_eq!(report.errors, vec![format!("{} is required", field)]);
        }

        for (parent, field) in [
            ("pricing", "price"),
            ("pricing", "currency"),
            ("pricing", "tradeMethod"),
            ("specs", "condition"),
            ("location", "region"),
        ] {
            let mut payload = valid_item();
            payload[parent].as_object_mut().unwrap().remove(field);
            let report = is_valid_item_data(&payload);
            assert_eq!(report.errors, vec![format!("{}.{} is required", parent, field)]);
        }
    }

    #[test]
    fn price_cap() {
        let mut payload = valid_item();
        payload["pricing"]["price"] = json!(15_000_000);
        let report = is_valid_item_data(&payload);
        assert_eq!(report.errors, vec!["pricing.price cannot exceed 10,000,000 KRW"]);

        payload["pricing"]["price"] = json!(MAX_ITEM_PRICE);
        assert!(is_valid_item_data(&payload).valid);
    }

    #[test]
    fn amounts_must_fit_the_stored_integer() {
        let mut payload = valid_item();
        payload["pricing"]["price"] = json!(350000.0);
        payload["specs"]["originalPrice"] = json!(1e19);
        assert_eq!(
            is_valid_item_data(&payload).errors,
            vec![
                "pricing.price must be an integer",
                "specs.originalPrice must be an integer",
            ]
        );

        let mut payload = valid_item();
        payload["specs"]["originalPrice"] = json!(MAX_ORIGINAL_PRICE + 1);
        assert_eq!(
            is_valid_item_data(&payload).errors,
            vec!["specs.originalPrice cannot exceed 1,000,000,000 KRW"]
        );
    }

    #[test]
    fn collects_all_violations() {
        let mut payload = valid_item();
        payload["title"] = json!("  ");
        payload["pricing"]["price"] = json!(0);
        payload["pricing"]["currency"] = json!("USD");
        payload["specs"]["condition"] = json!("broken");
        payload["images"] = json!([
            "http://insecure.example.com/a.jpg",
            "https://ok.example.com/b.jpg"
        ]);
        payload["location"]["coordinates"] = json!({"lat": 91, "lng": 0});

        let report = is_valid_item_data(&payload);
        assert_eq!(
            report.errors,
            vec![
                "title cannot be empty",
                "pricing.price must be a positive number",
                "pricing.currency must be one of: KRW",
                "specs.condition must be one of: new, like_new, good, fair, poor",
                "location.coordinates must contain a valid lat/lng pair",
                "images[0] must be an https:// URL",
            ]
        );
    }

    #[test]
    fn image_count_is_bounded() {
        let mut payload = valid_item();
        let images: Vec<String> = (0..11)
            .map(|i| format!("https://cdn.example.com/{}.jpg", i))
            .collect();
        payload["images"] = json!(images);
        let report = is_valid_item_data(&payload);
        assert_eq!(report.errors, vec!["images must contain at most 10 items"]);
    }

    #[test]
    fn title_length_counts_characters() {
        let mut payload = valid_item();
        payload["title"] = json!("가".repeat(MAX_TITLE_LEN));
        assert!(is_valid_item_data(&payload).valid);
        payload["title"] = json!("가".repeat(MAX_TITLE_LEN + 1));
        assert_eq!(
            is_valid_item_data(&payload).errors,
            vec!["title must be at most 100 characters"]
        );
    }
}
