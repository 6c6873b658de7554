use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use coffeehaus_types::models::{LatLng, Shop};

use crate::Database;

const SHOP_COLUMNS: &str = "id, google_place_id, name, formatted_address, vicinity, lat, lng,
     google_rating, ratings_total, price_level, types, photo_refs, opening_hours,
     website, formatted_phone, business_status, coffeehaus_rating, last_sync, verified";

/// Meters per degree of latitude, used for the bounding-box prefilter.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Raw shop columns before the JSON-encoded fields are decoded.
struct ShopRow {
    id: String,
    google_place_id: String,
    name: String,
    formatted_address: String,
    vicinity: String,
    lat: f64,
    lng: f64,
    google_rating: f32,
    ratings_total: u32,
    price_level: u8,
    types: String,
    photo_refs: String,
    opening_hours: Option<String>,
    website: String,
    formatted_phone: String,
    business_status: String,
    coffeehaus_rating: Option<f32>,
    last_sync: String,
    verified: bool,
}

impl ShopRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            google_place_id: row.get(1)?,
            name: row.get(2)?,
            formatted_address: row.get(3)?,
            vicinity: row.get(4)?,
            lat: row.get(5)?,
            lng: row.get(6)?,
            google_rating: row.get(7)?,
            ratings_total: row.get(8)?,
            price_level: row.get(9)?,
            types: row.get(10)?,
            photo_refs: row.get(11)?,
            opening_hours: row.get(12)?,
            website: row.get(13)?,
            formatted_phone: row.get(14)?,
            business_status: row.get(15)?,
            coffeehaus_rating: row.get(16)?,
            last_sync: row.get(17)?,
            verified: row.get(18)?,
        })
    }

    fn into_shop(self) -> Result<Shop> {
        let id: Uuid = self
            .id
            .parse()
            .with_context(|| format!("corrupt shop id '{}'", self.id))?;
        let opening_hours = self
            .opening_hours
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .with_context(|| format!("corrupt opening_hours on shop '{}'", self.id))?;

        Ok(Shop {
            id,
            google_place_id: self.google_place_id,
            name: self.name,
            formatted_address: self.formatted_address,
            vicinity: self.vicinity,
            location: LatLng::new(self.lat, self.lng),
            google_rating: self.google_rating,
            ratings_total: self.ratings_total,
            price_level: self.price_level,
            types: serde_json::from_str(&self.types).unwrap_or_default(),
            photo_refs: serde_json::from_str(&self.photo_refs).unwrap_or_default(),
            opening_hours,
            website: self.website,
            formatted_phone: self.formatted_phone,
            business_status: self.business_status,
            coffeehaus_rating: self.coffeehaus_rating,
            last_sync: self
                .last_sync
                .parse::<DateTime<Utc>>()
                .with_context(|| format!("corrupt last_sync on shop '{}'", self.id))?,
            verified: self.verified,
        })
    }
}

impl Database {
    /// Case-insensitive substring match on the shop name.
    pub fn find_shops_by_name(&self, name: &str, limit: usize) -> Result<Vec<Shop>> {
        let pattern = format!("%{}%", escape_like(name));
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM shops WHERE name LIKE ?1 ESCAPE '\\' ORDER BY google_rating DESC LIMIT ?2",
                SHOP_COLUMNS
            );
            collect_shops(conn, &sql, rusqlite::params![pattern, limit as i64])
        })
    }

    /// Shops within `radius_m` of `center`, nearest first, paired with their
    /// distance in meters.
    pub fn find_shops_near(&self, center: LatLng, radius_m: u32, limit: usize) -> Result<Vec<(Shop, f64)>> {
        let dlat = radius_m as f64 / METERS_PER_DEGREE;
        let dlng = radius_m as f64 / (METERS_PER_DEGREE * center.lat.to_radians().cos().abs().max(0.01));

        let candidates = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM shops WHERE lat BETWEEN ?1 AND ?2 AND lng BETWEEN ?3 AND ?4",
                SHOP_COLUMNS
            );
            collect_shops(
                conn,
                &sql,
                rusqlite::params![
                    center.lat - dlat,
                    center.lat + dlat,
                    center.lng - dlng,
                    center.lng + dlng
                ],
            )
        })?;

        let mut hits: Vec<(Shop, f64)> = candidates
            .into_iter()
            .map(|shop| {
                let d = center.distance_m(&shop.location);
                (shop, d)
            })
            .filter(|(_, d)| *d <= radius_m as f64)
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(limit);
        Ok(hits)
    }

    pub fn find_shop_by_place_id(&self, place_id: &str) -> Result<Option<Shop>> {
        Ok(self.find_shops_by_place_ids(&[place_id.to_string()])?.pop())
    }

    /// Batch lookup used by the sync manager.
    pub fn find_shops_by_place_ids(&self, place_ids: &[String]) -> Result<Vec<Shop>> {
        if place_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=place_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {} FROM shops WHERE google_place_id IN ({})",
                SHOP_COLUMNS,
                placeholders.join(", ")
            );
            let params: Vec<&dyn rusqlite::types::ToSql> = place_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            collect_shops(conn, &sql, params.as_slice())
        })
    }

    /// Inserts all shops in one transaction.
    pub fn insert_shops(&self, shops: &[Shop]) -> Result<()> {
        if shops.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO shops ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                    SHOP_COLUMNS
                ))?;
                for shop in shops {
                    stmt.execute(rusqlite::params![
                        shop.id.to_string(),
                        shop.google_place_id,
                        shop.name,
                        shop.formatted_address,
                        shop.vicinity,
                        shop.location.lat,
                        shop.location.lng,
                        shop.google_rating,
                        shop.ratings_total,
                        shop.price_level,
                        serde_json::to_string(&shop.types)?,
                        serde_json::to_string(&shop.photo_refs)?,
                        shop.opening_hours.as_ref().map(serde_json::to_string).transpose()?,
                        shop.website,
                        shop.formatted_phone,
                        shop.business_status,
                        shop.coffeehaus_rating,
                        shop.last_sync.to_rfc3339(),
                        shop.verified,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Overwrites the Places-sourced columns of the shop with the same
    /// `google_place_id`. Coffeehaus-owned columns (rating, verified) are left
    /// alone. Returns false when no such shop exists.
    pub fn update_shop_places_data(&self, shop: &Shop) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE shops SET
                    name = ?2, formatted_address = ?3, vicinity = ?4, lat = ?5, lng = ?6,
                    google_rating = ?7, ratings_total = ?8, price_level = ?9, types = ?10,
                    photo_refs = ?11, opening_hours = ?12, website = ?13, formatted_phone = ?14,
                    business_status = ?15, last_sync = ?16
                 WHERE google_place_id = ?1",
                rusqlite::params![
                    shop.google_place_id,
                    shop.name,
                    shop.formatted_address,
                    shop.vicinity,
                    shop.location.lat,
                    shop.location.lng,
                    shop.google_rating,
                    shop.ratings_total,
                    shop.price_level,
                    serde_json::to_string(&shop.types)?,
                    serde_json::to_string(&shop.photo_refs)?,
                    shop.opening_hours.as_ref().map(serde_json::to_string).transpose()?,
                    shop.website,
                    shop.formatted_phone,
                    shop.business_status,
                    shop.last_sync.to_rfc3339(),
                ],
            )?;
            Ok(changed > 0)
        })
    }
}

fn collect_shops<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Shop>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, ShopRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(ShopRow::into_shop).collect()
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
