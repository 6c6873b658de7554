use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use coffeehaus_types::models::{LatLng, OpeningHours, Photo, ShopDetails};

use crate::error::{Result, SearchError};

const GOOGLE_MAPS_API_URL: &str = "https://maps.googleapis.com/maps/api";

/// Places lookups are capped before fetching per-place details.
pub const MAX_RESULTS: usize = 10;

/// Source of shop data outside the local catalogue.
#[async_trait]
pub trait PlacesClient: Send + Sync {
    /// Coffee shops around a point.
    async fn nearby(&self, center: LatLng, radius_m: u32) -> Result<Vec<ShopDetails>>;

    /// Free-text search for cafes, e.g. "matcha latte places in Little Tokyo".
    async fn text_search(&self, query: &str) -> Result<Vec<ShopDetails>>;

    /// All locations of a named shop. The name is corrected through
    /// autocomplete first and results whose name does not contain it are dropped.
    async fn specific(&self, shop_name: &str, location: &str) -> Result<Vec<ShopDetails>>;

    /// Human-readable address for a point.
    async fn reverse_geocode(&self, center: LatLng) -> Result<String>;
}

#[derive(Clone)]
pub struct GooglePlacesClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, GOOGLE_MAPS_API_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let body = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(body)
    }

    async fn search(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<PlaceSummary>> {
        let resp: ListResponse<PlaceSummary> = self.get_json(path, params).await?;
        check_status(&resp.status, resp.error_message.as_deref())?;
        Ok(resp.results)
    }

    async fn details(&self, place_id: &str) -> Result<ShopDetails> {
        let resp: DetailsResponse = self
            .get_json("place/details/json", &[("place_id", place_id.to_string())])
            .await?;
        check_status(&resp.status, resp.error_message.as_deref())?;
        resp.result
            .map(PlaceDetails::into_details)
            .ok_or_else(|| SearchError::Places(format!("no details for place {}", place_id)))
    }

    /// Fetches details for up to [`MAX_RESULTS`] places. Places whose details
    /// cannot be fetched are skipped.
    async fn with_details<'a, I>(&self, places: I) -> Vec<ShopDetails>
    where
        I: IntoIterator<Item = &'a PlaceSummary>,
    {
        let mut out = Vec::new();
        for place in places.into_iter().take(MAX_RESULTS) {
            match self.details(&place.place_id).await {
                Ok(details) => out.push(details),
                Err(e) => warn!("Failed to get details for place {}: {}", place.name, e),
            }
        }
        out
    }
}

#[async_trait]
impl PlacesClient for GooglePlacesClient {
    async fn nearby(&self, center: LatLng, radius_m: u32) -> Result<Vec<ShopDetails>> {
        let results = self
            .search(
                "place/nearbysearch/json",
                &[
                    ("location", format!("{},{}", center.lat, center.lng)),
                    ("radius", radius_m.to_string()),
                    ("type", "cafe".to_string()),
                    ("keyword", "coffee shop".to_string()),
                ],
            )
            .await?;
        Ok(self.with_details(&results).await)
    }

    async fn text_search(&self, query: &str) -> Result<Vec<ShopDetails>> {
        let results = self
            .search(
                "place/textsearch/json",
                &[("query", query.to_string()), ("type", "cafe".to_string())],
            )
            .await?;
        Ok(self.with_details(&results).await)
    }

    async fn specific(&self, shop_name: &str, location: &str) -> Result<Vec<ShopDetails>> {
        let input = format!("{} {}", shop_name, location).trim().to_string();
        let predictions: AutocompleteResponse = self
            .get_json(
                "place/autocomplete/json",
                &[("input", input), ("types", "establishment".to_string())],
            )
            .await?;
        check_status(&predictions.status, predictions.error_message.as_deref())?;

        let corrected = predictions
            .predictions
            .first()
            .map(|p| p.structured_formatting.main_text.clone())
            .unwrap_or_else(|| shop_name.to_string());
        debug!("Autocomplete corrected '{}' to '{}'", shop_name, corrected);

        let query = if location.is_empty() {
            corrected.clone()
        } else {
            format!("{} in {}", corrected, location)
        };
        let results = self
            .search("place/textsearch/json", &[("query", query)])
            .await?;

        let needle = corrected.to_lowercase();
        let matching: Vec<&PlaceSummary> = results
            .iter()
            .take(MAX_RESULTS)
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect();
        Ok(self.with_details(matching).await)
    }

    async fn reverse_geocode(&self, center: LatLng) -> Result<String> {
        let resp: ListResponse<GeocodeResult> = self
            .get_json(
                "geocode/json",
                &[("latlng", format!("{},{}", center.lat, center.lng))],
            )
            .await?;
        check_status(&resp.status, resp.error_message.as_deref())?;
        resp.results
            .into_iter()
            .next()
            .map(|r| r.formatted_address)
            .ok_or_else(|| SearchError::Places(format!("no address for {},{}", center.lat, center.lng)))
    }
}

fn check_status(status: &str, message: Option<&str>) -> Result<()> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(SearchError::Places(match message {
            Some(msg) => format!("{}: {}", other, msg),
            None => other.to_string(),
        })),
    }
}

// -- Google wire types --

#[derive(Deserialize)]
struct ListResponse<T> {
    status: String,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct PlaceSummary {
    place_id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct PlaceDetails {
    place_id: String,
    name: String,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    vicinity: String,
    geometry: Geometry,
    #[serde(default)]
    rating: f32,
    #[serde(default)]
    user_ratings_total: u32,
    #[serde(default)]
    price_level: u8,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    photos: Vec<Photo>,
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    website: String,
    #[serde(default)]
    international_phone_number: String,
    #[serde(default)]
    business_status: String,
}

impl PlaceDetails {
    fn into_details(self) -> ShopDetails {
        ShopDetails {
            place_id: self.place_id,
            name: self.name,
            formatted_address: self.formatted_address,
            vicinity: self.vicinity,
            location: self.geometry.location,
            rating: self.rating,
            user_ratings_total: self.user_ratings_total,
            price_level: self.price_level,
            types: self.types,
            photos: self.photos,
            opening_hours: self.opening_hours,
            website: self.website,
            formatted_phone: self.international_phone_number,
            business_status: self.business_status,
            coffeehaus_rating: None,
            distance_m: None,
        }
    }
}

#[derive(Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct Prediction {
    structured_formatting: StructuredFormatting,
}

#[derive(Deserialize)]
struct StructuredFormatting {
    main_text: String,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_results_is_not_an_error() {
        assert!(check_status("OK", None).is_ok());
        assert!(check_status("ZERO_RESULTS", None).is_ok());

        let err = check_status("REQUEST_DENIED", Some("bad key")).unwrap_err();
        assert_eq!(err.to_string(), "Places API error: REQUEST_DENIED: bad key");
    }

    #[test]
    fn details_payload_maps_to_shop_details() {
        let raw = r#"{
            "place_id": "abc",
            "name": "Stereoscope Coffee",
            "formatted_address": "1 Main St, Newport Beach, CA",
            "geometry": { "location": { "lat": 33.61, "lng": -117.87 } },
            "rating": 4.6,
            "user_ratings_total": 812,
            "opening_hours": {
                "open_now": true,
                "weekday_text": ["Monday: 7:00 AM – 4:00 PM"],
                "periods": [{ "open": { "day": 1, "time": "0700" }, "close": { "day": 1, "time": "1600" } }]
            },
            "international_phone_number": "+1 949-555-0100"
        }"#;
        let details: PlaceDetails = serde_json::from_str(raw).unwrap();
        let shop = details.into_details();
        assert_eq!(shop.place_id, "abc");
        assert_eq!(shop.formatted_phone, "+1 949-555-0100");
        assert_eq!(shop.price_level, 0);
        let hours = shop.opening_hours.unwrap();
        assert_eq!(hours.periods[0].open.time, "0700");
        assert_eq!(hours.periods[0].close.as_ref().unwrap().day, 1);
    }
}
