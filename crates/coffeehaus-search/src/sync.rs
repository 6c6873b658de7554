use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use coffeehaus_db::Database;
use coffeehaus_types::models::{Shop, ShopDetails};

use crate::error::Result;

/// Existing shops are rewritten this many per blocking task.
const UPDATE_BATCH_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Copies Places results into the shop catalogue.
#[derive(Clone)]
pub struct ShopSync {
    db: Arc<Database>,
}

impl ShopSync {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Creates shops the catalogue has never seen and refreshes the ones whose
    /// Places data changed.
    pub async fn batch_sync(&self, inputs: Vec<ShopDetails>) -> Result<SyncReport> {
        if inputs.is_empty() {
            return Ok(SyncReport::default());
        }

        let place_ids: Vec<String> = inputs.iter().map(|s| s.place_id.clone()).collect();
        let db = self.db.clone();
        let existing = tokio::task::spawn_blocking(move || db.find_shops_by_place_ids(&place_ids)).await??;

        let existing: HashMap<&str, &Shop> = existing
            .iter()
            .map(|shop| (shop.google_place_id.as_str(), shop))
            .collect();

        let now = Utc::now();
        let mut to_create = Vec::new();
        let mut to_update = Vec::new();
        let mut report = SyncReport::default();
        // Places can return the same place twice in one response.
        let mut seen = HashSet::new();

        for input in &inputs {
            if !seen.insert(input.place_id.as_str()) {
                continue;
            }
            match existing.get(input.place_id.as_str()) {
                None => to_create.push(shop_from_details(Uuid::new_v4(), input, now)),
                Some(current) if needs_update(current, input) => {
                    to_update.push(shop_from_details(current.id, input, now))
                }
                Some(_) => report.unchanged += 1,
            }
        }

        info!(
            "Shop sync: {} to create, {} to update, {} unchanged",
            to_create.len(),
            to_update.len(),
            report.unchanged
        );

        if !to_create.is_empty() {
            report.created = to_create.len();
            let db = self.db.clone();
            tokio::task::spawn_blocking(move || db.insert_shops(&to_create)).await??;
        }

        for batch in to_update.chunks(UPDATE_BATCH_SIZE) {
            let db = self.db.clone();
            let batch = batch.to_vec();
            report.updated += tokio::task::spawn_blocking(move || {
                let mut n = 0;
                for shop in &batch {
                    if db.update_shop_places_data(shop)? {
                        n += 1;
                    }
                }
                Ok::<_, anyhow::Error>(n)
            })
            .await??;
        }

        Ok(report)
    }
}

/// True when any non-empty incoming field differs from what is stored.
/// Empty or zero incoming values never trigger an update.
pub fn needs_update(existing: &Shop, input: &ShopDetails) -> bool {
    fn changed(incoming: &str, stored: &str) -> bool {
        !incoming.is_empty() && incoming != stored
    }

    changed(&input.name, &existing.name)
        || changed(&input.formatted_address, &existing.formatted_address)
        || changed(&input.vicinity, &existing.vicinity)
        || (input.rating > 0.0 && input.rating != existing.google_rating)
        || (input.user_ratings_total > 0 && input.user_ratings_total != existing.ratings_total)
        || (input.price_level > 0 && input.price_level != existing.price_level)
        || changed(&input.website, &existing.website)
        || changed(&input.formatted_phone, &existing.formatted_phone)
        || changed(&input.business_status, &existing.business_status)
}

/// Catalogue record for a Places result. Coffeehaus-owned fields start empty;
/// the update path never writes them.
pub fn shop_from_details(id: Uuid, details: &ShopDetails, now: DateTime<Utc>) -> Shop {
    Shop {
        id,
        google_place_id: details.place_id.clone(),
        name: details.name.clone(),
        formatted_address: details.formatted_address.clone(),
        vicinity: details.vicinity.clone(),
        location: details.location,
        google_rating: details.rating,
        ratings_total: details.user_ratings_total,
        price_level: details.price_level,
        types: details.types.clone(),
        photo_refs: details.photos.iter().map(|p| p.photo_reference.clone()).collect(),
        opening_hours: details.opening_hours.clone(),
        website: details.website.clone(),
        formatted_phone: details.formatted_phone.clone(),
        business_status: details.business_status.clone(),
        coffeehaus_rating: None,
        last_sync: now,
        verified: false,
    }
}
