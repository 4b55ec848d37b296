pub mod geocoder;
pub mod regions;

pub use geocoder::{resolve_region, KakaoGeocoder, RegionResolver};
pub use regions::{Region, RegionTable};

use crate::models::{Coordinates, GeoPoint, MarketItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Flat-Earth approximation of one degree of latitude
pub const KM_PER_DEGREE: f64 = 111.0;

const GEOHASH_ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Axis-aligned search rectangle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub north_east: Coordinates,
    pub south_west: Coordinates,
}

impl BoundingBox {
    pub fn contains(&self, coords: Coordinates) -> bool {
        coords.lat <= self.north_east.lat
            && coords.lat >= self.south_west.lat
            && coords.lng <= self.north_east.lng
            && coords.lng >= self.south_west.lng
    }
}

/// Convert map-provider coordinates to a database geopoint
pub fn to_geo_point(coords: Coordinates) -> GeoPoint {
    coords.into()
}

/// Convert a database geopoint back to map-provider coordinates
pub fn from_geo_point(point: GeoPoint) -> Coordinates {
    point.into()
}

/// Great-circle distance in kilometers (haversine)
pub fn calculate_distance(a: Coordinates, b: Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Approximate rectangle around `center` covering `radius_km`.
///
/// Uses a flat-Earth degrees-per-km conversion. The longitude span is divided
/// by `cos(lat)`, so boxes grow without bound as the center approaches a pole
/// and the longitude edges run past ±180°. Boxes are not wrapped at the
/// antimeridian either. Callers doing polar searches must not rely on this box.
pub fn calculate_bounding_box(center: Coordinates, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let lng_delta = radius_km / (KM_PER_DEGREE * center.lat.to_radians().cos());

    BoundingBox {
        north_east: Coordinates::new(center.lat + lat_delta, center.lng + lng_delta),
        south_west: Coordinates::new(center.lat - lat_delta, center.lng - lng_delta),
    }
}

/// Base-32 geohash of `coords` with `precision` characters
pub fn generate_geo_hash(coords: Coordinates, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut even_bit = true;
    let mut bit = 0;
    let mut index = 0usize;

    while hash.len() < precision {
        let (range, value) = if even_bit {
            (&mut lng_range, coords.lng)
        } else {
            (&mut lat_range, coords.lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        if value >= mid {
            index = index * 2 + 1;
            range.0 = mid;
        } else {
            index *= 2;
            range.1 = mid;
        }
        even_bit = !even_bit;

        bit += 1;
        if bit == 5 {
            hash.push(GEOHASH_ALPHABET[index] as char);
            bit = 0;
            index = 0;
        }
    }

    hash
}

pub fn is_valid_coordinates(coords: Coordinates) -> bool {
    coords.lat.is_finite()
        && coords.lng.is_finite()
        && (-90.0..=90.0).contains(&coords.lat)
        && (-180.0..=180.0).contains(&coords.lng)
}

/// Read `{lat, lng}` out of an untrusted JSON value
pub fn coordinates_from_value(value: &Value) -> Option<Coordinates> {
    let lat = value.get("lat")?.as_f64()?;
    let lng = value.get("lng")?.as_f64()?;
    let coords = Coordinates::new(lat, lng);
    is_valid_coordinates(coords).then_some(coords)
}

/// An item together with its distance from the search center
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyItem {
    pub distance_km: f64,
    pub item: MarketItem,
}

/// Items within `radius_km` of `center`, nearest first. Items without coordinates are skipped.
pub fn nearby_items(
    items: impl IntoIterator<Item = MarketItem>,
    center: Coordinates,
    radius_km: f64,
) -> Vec<NearbyItem> {
    let bbox = calculate_bounding_box(center, radius_km);

    let mut nearby: Vec<NearbyItem> = items
        .into_iter()
        .filter_map(|item| {
            let coords = item.coordinates()?;
            if !bbox.contains(coords) {
                return None;
            }
            let distance_km = calculate_distance(center, coords);
            (distance_km <= radius_km).then_some(NearbyItem { distance_km, item })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SEOUL_CITY_HALL: Coordinates = Coordinates { lat: 37.5665, lng: 126.978 };
    const GANGNAM_STATION: Coordinates = Coordinates { lat: 37.4979, lng: 127.0276 };

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(calculate_distance(SEOUL_CITY_HALL, SEOUL_CITY_HALL), 0.0);
        let pole = Coordinates::new(90.0, 0.0);
        assert_eq!(calculate_distance(pole, pole), 0.0);
    }

    #[test]
    fn distance_is_symmetric_and_plausible() {
        let there = calculate_distance(SEOUL_CITY_HALL, GANGNAM_STATION);
        let back = calculate_distance(GANGNAM_STATION, SEOUL_CITY_HALL);
        assert_eq!(there, back);
        // City hall to Gangnam station is roughly 8.8 km
        assert!(there > 8.0 && there < 9.5, "got {}", there);
    }

    #[test]
    fn distance_across_antimeridian() {
        let a = Coordinates::new(0.0, 179.5);
        let b = Coordinates::new(0.0, -179.5);
        let d = calculate_distance(a, b);
        assert!((d - 111.19).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn bounding_box_is_centered() {
        let bbox = calculate_bounding_box(SEOUL_CITY_HALL, 11.1);
        assert!((bbox.north_east.lat - (SEOUL_CITY_HALL.lat + 0.1)).abs() < 1e-9);
        assert!((bbox.south_west.lat - (SEOUL_CITY_HALL.lat - 0.1)).abs() < 1e-9);
        let lng_span = bbox.north_east.lng - SEOUL_CITY_HALL.lng;
        assert!((lng_span - (SEOUL_CITY_HALL.lng - bbox.south_west.lng)).abs() < 1e-9);
        // longitude degrees are shorter than latitude degrees away from the equator
        assert!(lng_span > 0.1);
        assert!(bbox.contains(SEOUL_CITY_HALL));
    }

    #[test]
    fn bounding_box_distorts_near_poles() {
        let equator = calculate_bounding_box(Coordinates::new(0.0, 0.0), 10.0);
        let arctic = calculate_bounding_box(Coordinates::new(89.0, 0.0), 10.0);
        let equator_span = equator.north_east.lng - equator.south_west.lng;
        let arctic_span = arctic.north_east.lng - arctic.south_west.lng;
        assert!(arctic_span > equator_span * 50.0);
    }

    #[test]
    fn geohash_matches_reference_value() {
        let hash = generate_geo_hash(Coordinates::new(57.64911, 10.40744), 11);
        assert_eq!(hash, "u4pruydqqvj");
    }

    #[test]
    fn geohash_is_deterministic_and_sized() {
        for precision in [1, 5, 9, 12] {
            let first = generate_geo_hash(SEOUL_CITY_HALL, precision);
            let second = generate_geo_hash(SEOUL_CITY_HALL, precision);
            assert_eq!(first, second);
            assert_eq!(first.len(), precision);
        }
        let long = generate_geo_hash(SEOUL_CITY_HALL, 9);
        assert!(long.starts_with(&generate_geo_hash(SEOUL_CITY_HALL, 5)));
        assert_eq!(generate_geo_hash(SEOUL_CITY_HALL, 0), "");
    }

    #[test]
    fn coordinate_validation() {
        assert!(!is_valid_coordinates(Coordinates::new(91.0, 0.0)));
        assert!(!is_valid_coordinates(Coordinates::new(0.0, -180.5)));
        assert!(!is_valid_coordinates(Coordinates::new(f64::NAN, 0.0)));
        assert!(is_valid_coordinates(Coordinates::new(37.5, 127.0)));
        assert!(is_valid_coordinates(Coordinates::new(-90.0, 180.0)));
    }

    #[test]
    fn coordinates_from_untrusted_json() {
        assert_eq!(
            coordinates_from_value(&json!({"lat": 37.5, "lng": 127})),
            Some(Coordinates::new(37.5, 127.0))
        );
        assert_eq!(coordinates_from_value(&json!({"lat": "37.5", "lng": 127})), None);
        assert_eq!(coordinates_from_value(&json!({"lat": 37.5})), None);
        assert_eq!(coordinates_from_value(&json!({"lat": 95, "lng": 0})), None);
    }
}
