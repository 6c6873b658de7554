use std::sync::Arc;

use tracing::{info, warn};

use coffeehaus_db::Database;
use coffeehaus_types::models::{LatLng, ShopDetails};
use coffeehaus_types::search::{SearchIntent, SearchOptions, SearchResult, SearchType};

use crate::analyzer::QueryAnalyzer;
use crate::cache::SearchCache;
use crate::error::Result;
use crate::places::PlacesClient;
use crate::sync::ShopSync;

/// Rows read from the catalogue per search. Cached results are paged from
/// this list, so it must not depend on the caller's page.
const CATALOGUE_WINDOW: usize = 100;

/// Entry point for shop search. The query analyzer decides how to search;
/// the local catalogue is consulted before Places where it can answer.
#[derive(Clone)]
pub struct SearchService {
    inner: Arc<SearchServiceInner>,
}

struct SearchServiceInner {
    places: Arc<dyn PlacesClient>,
    analyzer: Arc<dyn QueryAnalyzer>,
    db: Arc<Database>,
    sync: ShopSync,
    cache: SearchCache,
}

impl SearchService {
    pub fn new(places: Arc<dyn PlacesClient>, analyzer: Arc<dyn QueryAnalyzer>, db: Arc<Database>) -> Self {
        Self::with_cache(places, analyzer, db, SearchCache::default())
    }

    pub fn with_cache(
        places: Arc<dyn PlacesClient>,
        analyzer: Arc<dyn QueryAnalyzer>,
        db: Arc<Database>,
        cache: SearchCache,
    ) -> Self {
        Self {
            inner: Arc::new(SearchServiceInner {
                places,
                analyzer,
                sync: ShopSync::new(db.clone()),
                db,
                cache,
            }),
        }
    }

    pub async fn search(&self, opts: SearchOptions) -> Result<SearchResult> {
        let opts = opts.with_defaults();
        let intent = self
            .inner
            .analyzer
            .analyze(&opts.query, &opts.user_location())
            .await?;
        info!(
            "Search '{}' classified as {:?} ('{}')",
            opts.query, intent.search_type, intent.normalized_query
        );

        let key = cache_key(&intent, &opts);
        let shops = match self.inner.cache.get(&key).await {
            Some(hit) => hit.shops,
            None => {
                let shops = match intent.search_type {
                    SearchType::Specific => self.specific(&intent, &opts).await?,
                    SearchType::Area => self.area(&opts.query).await?,
                    SearchType::Proximity => self.proximity(&intent, &opts).await?,
                };
                let full = SearchResult {
                    search_type: intent.search_type,
                    normalized_query: intent.normalized_query.clone(),
                    shops,
                };
                self.inner.cache.insert(key, full.clone()).await;
                full.shops
            }
        };

        Ok(SearchResult {
            search_type: intent.search_type,
            normalized_query: intent.normalized_query,
            shops: shops.into_iter().skip(opts.offset).take(opts.limit).collect(),
        })
    }

    async fn specific(&self, intent: &SearchIntent, opts: &SearchOptions) -> Result<Vec<ShopDetails>> {
        let shop_name = intent
            .terms
            .shop
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| opts.query.clone());

        let known = self.catalogue_by_name(&shop_name).await;
        if !known.is_empty() {
            return Ok(known);
        }

        let mut location = String::new();
        if opts.has_location() {
            match self
                .inner
                .places
                .reverse_geocode(LatLng::new(opts.lat, opts.lng))
                .await
            {
                Ok(address) => location = address,
                Err(e) => warn!("Reverse geocode failed: {}", e),
            }
        }
        if location.is_empty() {
            if let Some(loc) = &intent.location {
                location = loc.name.clone();
            }
        }

        let shops = self.inner.places.specific(&opts.query, &location).await?;
        self.background_sync(&shops);
        Ok(shops)
    }

    async fn area(&self, query: &str) -> Result<Vec<ShopDetails>> {
        let shops = self.inner.places.text_search(query).await?;
        self.background_sync(&shops);
        Ok(shops)
    }

    async fn proximity(&self, intent: &SearchIntent, opts: &SearchOptions) -> Result<Vec<ShopDetails>> {
        if !opts.has_location() {
            // Nothing to be near; search the named area or the raw query instead.
            let query = match &intent.location {
                Some(loc) if !loc.name.is_empty() => format!("coffee shops in {}", loc.name),
                _ => opts.query.clone(),
            };
            return self.area(&query).await;
        }

        let center = LatLng::new(opts.lat, opts.lng);
        let known = self.catalogue_near(center, opts.radius, CATALOGUE_WINDOW).await;
        if !known.is_empty() {
            return Ok(known);
        }

        let shops = self.inner.places.nearby(center, opts.radius).await?;
        self.background_sync(&shops);
        Ok(shops)
    }

    /// Catalogue name lookup. Failures fall through to Places.
    async fn catalogue_by_name(&self, name: &str) -> Vec<ShopDetails> {
        let db = self.inner.db.clone();
        let name = name.to_string();
        match tokio::task::spawn_blocking(move || db.find_shops_by_name(&name, CATALOGUE_WINDOW)).await {
            Ok(Ok(shops)) => shops.into_iter().map(ShopDetails::from).collect(),
            Ok(Err(e)) => {
                warn!("Catalogue name lookup failed: {}", e);
                vec![]
            }
            Err(e) => {
                warn!("Catalogue name lookup panicked: {}", e);
                vec![]
            }
        }
    }

    /// Catalogue radius lookup. Failures fall through to Places.
    async fn catalogue_near(&self, center: LatLng, radius_m: u32, limit: usize) -> Vec<ShopDetails> {
        let db = self.inner.db.clone();
        match tokio::task::spawn_blocking(move || db.find_shops_near(center, radius_m, limit)).await {
            Ok(Ok(hits)) => hits
                .into_iter()
                .map(|(shop, distance)| ShopDetails {
                    distance_m: Some(distance),
                    ..ShopDetails::from(shop)
                })
                .collect(),
            Ok(Err(e)) => {
                warn!("Catalogue radius lookup failed: {}", e);
                vec![]
            }
            Err(e) => {
                warn!("Catalogue radius lookup panicked: {}", e);
                vec![]
            }
        }
    }

    fn background_sync(&self, shops: &[ShopDetails]) {
        if shops.is_empty() {
            return;
        }

        let sync = self.inner.sync.clone();
        let inputs = shops.to_vec();
        tokio::spawn(async move {
            info!("Starting background sync of {} shops", inputs.len());
            if let Err(e) = sync.batch_sync(inputs).await {
                warn!("Background shop sync failed: {}", e);
            }
        });
    }
}

/// Proximity results depend on where the user is, specific results on the
/// location context handed to Places. Area searches only on the query.
fn cache_key(intent: &SearchIntent, opts: &SearchOptions) -> String {
    let kind = match intent.search_type {
        SearchType::Proximity => "proximity",
        SearchType::Area => "area",
        SearchType::Specific => "specific",
    };
    let query = intent.normalized_query.trim().to_lowercase();
    match intent.search_type {
        SearchType::Proximity if opts.has_location() => format!(
            "{}:{}:{:.3},{:.3}:{}",
            kind, query, opts.lat, opts.lng, opts.radius
        ),
        SearchType::Specific if opts.has_location() => {
            format!("{}:{}:{:.3},{:.3}", kind, query, opts.lat, opts.lng)
        }
        SearchType::Specific => {
            let place = intent
                .location
                .as_ref()
                .map(|l| l.name.trim().to_lowercase())
                .unwrap_or_default();
            format!("{}:{}:{}", kind, query, place)
        }
        _ => format!("{}:{}", kind, query),
    }
}
