use crate::models::{StudioCategory, CURRENCY_KRW};
use crate::validation::schema::{FieldRule, Kind, NumberRule, Schema, ValidationReport};
use serde_json::Value;
use std::sync::OnceLock;

/// Highest hourly rate a studio may charge, in KRW
pub const MAX_HOURLY_RATE: i64 = 1_000_000;

fn studio_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![
            FieldRule::required("name", Kind::text(50)),
            FieldRule::required("description", Kind::text(1000)),
            FieldRule::required("category", Kind::OneOf(StudioCategory::ALL)),
            FieldRule::required(
                "location",
                Kind::object(vec![
                    FieldRule::required("address", Kind::text(200)),
                    FieldRule::required("region", Kind::text(100)),
                    FieldRule::optional("coordinates", Kind::Coordinates),
                ]),
            ),
            FieldRule::optional(
                "contact",
                Kind::object(vec![
                    FieldRule::optional("phone", Kind::Phone),
                    FieldRule::optional("email", Kind::Email),
                    FieldRule::optional("website", Kind::Url),
                ]),
            ),
            FieldRule::required(
                "hourlyRate",
                Kind::Number(NumberRule {
                    positive: true,
                    max: Some(MAX_HOURLY_RATE),
                    unit: CURRENCY_KRW,
                    ..Default::default()
                }),
            ),
            FieldRule::optional("images", Kind::url_list(10)),
            FieldRule::required("ownerId", Kind::text(128)),
        ])
    })
}

/// Check a studio create payload
pub fn is_valid_studio_data(payload: &Value) -> ValidationReport {
    studio_schema().validate(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_studio() -> Value {
        json!({
            "name": "합정 댄스 스튜디오",
            "description": "거울 전면, 방음 완비. 시간 단위 대관 가능합니다.",
            "category": "dance",
            "location": {
                "address": "서울 마포구 양화로 45",
                "region": "마포구",
                "coordinates": {"lat": 37.5495, "lng": 126.9137}
            },
            "contact": {
                "phone": "010-1234-5678",
                "email": "hello@hapjeong-dance.kr",
                "website": "https://hapjeong-dance.kr"
            },
            "hourlyRate": 25000,
            "images": [],
            "ownerId": "owner-1"
        })
    }

    #[test]
    fn valid_studio_passes() {
        let report = is_valid_studio_data(&valid_studio());
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn contact_is_optional_but_checked() {
        let mut payload = valid_studio();
        payload.as_object_mut().unwrap().remove("contact");
        assert!(is_valid_studio_data(&payload).valid);

        let mut payload = valid_studio();
        payload["contact"] = json!({
            "phone": "call me",
            "email": "nope",
            "website": "http://hapjeong-dance.kr"
        });
        assert_eq!(
            is_valid_studio_data(&payload).errors,
            vec![
                "contact.phone must be a valid phone number",
                "contact.email must be a valid email address",
                "contact.website must be an https:// URL",
            ]
        );
    }

    #[test]
    fn hourly_rate_bounds() {
        let mut payload = valid_studio();
        payload["hourlyRate"] = json!(2_000_000);
        assert_eq!(
            is_valid_studio_data(&payload).errors,
            vec!["hourlyRate cannot exceed 1,000,000 KRW"]
        );

        payload["hourlyRate"] = json!("25000");
        assert_eq!(
            is_valid_studio_data(&payload).errors,
            vec!["hourlyRate must be a number"]
        );
    }

    #[test]
    fn nested_location_fields_required() {
        let mut payload = valid_studio();
        payload["location"] = json!({});
        assert_eq!(
            is_valid_studio_data(&payload).errors,
            vec!["location.address is required", "location.region is required"]
        );
    }
}
