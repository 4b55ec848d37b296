#![allow(dead_code)]

use dongne_market::geo::RegionTable;
use dongne_market::store::{DocumentStore, MemoryStore};
use dongne_market::Marketplace;
use serde_json::{json, Value};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

pub fn setup_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("dongne_market=debug"))
            .with_test_writer()
            .try_init();
    });
}

pub fn marketplace_with(store: Arc<dyn DocumentStore>) -> Marketplace {
    setup_tracing();
    let regions = RegionTable::bundled().expect("bundled region table");
    Marketplace::new(store, Arc::new(regions))
}

pub fn marketplace() -> Marketplace {
    marketplace_with(Arc::new(MemoryStore::new()))
}

/// A listing that passes validation, placed near the Gangnam-gu office
pub fn item_payload(title: &str, lat: f64, lng: f64) -> Value {
    json!({
        "title": title,
        "description": "상태 좋아요. 직거래 선호합니다.",
        "category": "instruments",
        "pricing": {
            "price": 350000,
            "currency": "KRW",
            "negotiable": true,
            "tradeMethod": "direct"
        },
        "specs": {"condition": "like_new"},
        "location": {"region": "강남구", "coordinates": {"lat": lat, "lng": lng}},
        "images": ["https://images.example.com/items/1.jpg"]
    })
}
