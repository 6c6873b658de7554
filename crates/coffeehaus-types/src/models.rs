use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An identity as issued by the auth layer. The profile fields are filled in
/// once the user has completed profile setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoVersions {
    pub original: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePhoto {
    pub versions: PhotoVersions,
}

/// Profile record served by `GET /user` and `PUT /user/{username}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub profile_photo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<ProfilePhoto>,
}

impl Profile {
    /// URL of the original version of the profile photo, if one is attached.
    pub fn photo_url(&self) -> Option<&str> {
        self.photos
            .as_ref()
            .and_then(|p| p.versions.original.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub username: String,
    pub shop_name: String,
    pub location: String,
    pub image_url: String,
    pub likes: u32,
    pub comments: u32,
    pub rating: f32,
    pub caption: String,
    pub drink_name: String,
    pub drink_price: f32,
}

// -- Shops --

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters.
    pub fn distance_m(&self, other: &LatLng) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// A point in the week. `day` is 0 for Sunday through 6 for Saturday and
/// `time` is 24h "HHMM", e.g. "0900".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub day: u8,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub open: TimeOfDay,
    /// Absent for places that never close.
    pub close: Option<TimeOfDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
    #[serde(default)]
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub photo_reference: String,
    pub height: u32,
    pub width: u32,
    #[serde(default)]
    pub html_attributions: Vec<String>,
}

/// Shop data as returned by search. Built either from a Places lookup or from
/// a stored [`Shop`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopDetails {
    pub place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub vicinity: String,
    pub location: LatLng,
    pub rating: f32,
    pub user_ratings_total: u32,
    pub price_level: u8,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub opening_hours: Option<OpeningHours>,
    pub website: String,
    pub formatted_phone: String,
    pub business_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coffeehaus_rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

/// A coffee shop in the catalogue: Places data plus Coffeehaus-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: Uuid,
    pub google_place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub vicinity: String,
    pub location: LatLng,
    pub google_rating: f32,
    pub ratings_total: u32,
    pub price_level: u8,
    pub types: Vec<String>,
    pub photo_refs: Vec<String>,
    pub opening_hours: Option<OpeningHours>,
    pub website: String,
    pub formatted_phone: String,
    pub business_status: String,

    pub coffeehaus_rating: Option<f32>,
    pub last_sync: DateTime<Utc>,
    pub verified: bool,
}

impl From<Shop> for ShopDetails {
    fn from(shop: Shop) -> Self {
        let photos = shop
            .photo_refs
            .into_iter()
            .map(|photo_reference| Photo {
                photo_reference,
                height: 0,
                width: 0,
                html_attributions: Vec::new(),
            })
            .collect();

        Self {
            place_id: shop.google_place_id,
            name: shop.name,
            formatted_address: shop.formatted_address,
            vicinity: shop.vicinity,
            location: shop.location,
            rating: shop.google_rating,
            user_ratings_total: shop.ratings_total,
            price_level: shop.price_level,
            types: shop.types,
            photos,
            opening_hours: shop.opening_hours,
            website: shop.website,
            formatted_phone: shop.formatted_phone,
            business_status: shop.business_status,
            coffeehaus_rating: shop.coffeehaus_rating,
            distance_m: None,
        }
    }
}
