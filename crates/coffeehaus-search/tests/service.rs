use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use coffeehaus_db::Database;
use coffeehaus_search::{PlacesClient, QueryAnalyzer, Result, SearchService, SearchError, ShopSync};
use coffeehaus_types::models::{LatLng, ShopDetails};
use coffeehaus_types::search::{IntentLocation, SearchIntent, SearchOptions, SearchTerms, SearchType};

struct FixedAnalyzer(SearchIntent);

#[async_trait]
impl QueryAnalyzer for FixedAnalyzer {
    async fn analyze(&self, _query: &str, _user_location: &str) -> Result<SearchIntent> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct FakePlaces {
    shops: Vec<ShopDetails>,
    nearby_calls: AtomicUsize,
    text_calls: AtomicUsize,
    specific_calls: AtomicUsize,
    last_query: std::sync::Mutex<String>,
    last_location: std::sync::Mutex<String>,
    geocode_fails: bool,
}

#[async_trait]
impl PlacesClient for FakePlaces {
    async fn nearby(&self, _center: LatLng, _radius_m: u32) -> Result<Vec<ShopDetails>> {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.shops.clone())
    }

    async fn text_search(&self, _query: &str) -> Result<Vec<ShopDetails>> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.shops.clone())
    }

    async fn specific(&self, query: &str, location: &str) -> Result<Vec<ShopDetails>> {
        self.specific_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = query.to_string();
        *self.last_location.lock().unwrap() = location.to_string();
        Ok(self.shops.clone())
    }

    async fn reverse_geocode(&self, _center: LatLng) -> Result<String> {
        if self.geocode_fails {
            Err(SearchError::Places("OVER_QUERY_LIMIT".into()))
        } else {
            Ok("Long Beach, CA, USA".into())
        }
    }
}

fn shop(place_id: &str, name: &str, lat: f64, lng: f64) -> ShopDetails {
    ShopDetails {
        place_id: place_id.into(),
        name: name.into(),
        formatted_address: "1 Main St".into(),
        location: LatLng::new(lat, lng),
        rating: 4.5,
        user_ratings_total: 10,
        ..Default::default()
    }
}

fn intent(search_type: SearchType, shop: Option<&str>, location: Option<&str>) -> SearchIntent {
    SearchIntent {
        search_type,
        normalized_query: "coffee".into(),
        location: location.map(|name| IntentLocation { name: name.into(), radius: 5.0 }),
        terms: SearchTerms {
            shop: shop.map(String::from),
            filters: vec![],
        },
    }
}

fn service(places: Arc<FakePlaces>, intent: SearchIntent, db: Arc<Database>) -> SearchService {
    SearchService::new(places, Arc::new(FixedAnalyzer(intent)), db)
}

fn opts(query: &str, lat: f64, lng: f64) -> SearchOptions {
    SearchOptions {
        query: query.into(),
        lat,
        lng,
        ..Default::default()
    }
}

async fn wait_for_shop(db: &Database, place_id: &str) -> bool {
    for _ in 0..50 {
        if db.find_shop_by_place_id(place_id).unwrap().is_some() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn specific_search_prefers_catalogue() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    ShopSync::new(db.clone())
        .batch_sync(vec![shop("p1", "Stereoscope Coffee", 33.6, -117.9)])
        .await
        .unwrap();

    let places = Arc::new(FakePlaces::default());
    let svc = service(places.clone(), intent(SearchType::Specific, Some("Stereoscope"), None), db);

    let result = svc.search(opts("stereoscope", 0.0, 0.0)).await.unwrap();
    assert_eq!(result.search_type, SearchType::Specific);
    assert_eq!(result.shops.len(), 1);
    assert_eq!(result.shops[0].name, "Stereoscope Coffee");
    assert_eq!(places.specific_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn specific_search_falls_back_to_places_and_syncs() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let places = Arc::new(FakePlaces {
        shops: vec![shop("p9", "Hidden House Coffee", 33.7, -117.8)],
        ..Default::default()
    });
    let svc = service(
        places.clone(),
        intent(SearchType::Specific, Some("Hidden House"), Some("Santa Ana, CA")),
        db.clone(),
    );

    let result = svc.search(opts("hidden house coffee", 33.77, -118.19)).await.unwrap();
    assert_eq!(result.shops.len(), 1);
    assert_eq!(places.specific_calls.load(Ordering::SeqCst), 1);
    // Reverse geocode wins over the analyzer's location.
    assert_eq!(*places.last_location.lock().unwrap(), "Long Beach, CA, USA");
    // Places gets the caller's words, not the analyzer's shop name.
    assert_eq!(*places.last_query.lock().unwrap(), "hidden house coffee");

    assert!(wait_for_shop(&db, "p9").await);
}

#[tokio::test]
async fn geocode_failure_uses_intent_location() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let places = Arc::new(FakePlaces {
        geocode_fails: true,
        ..Default::default()
    });
    let svc = service(
        places.clone(),
        intent(SearchType::Specific, Some("Hidden House"), Some("Santa Ana, CA")),
        db,
    );

    let result = svc.search(opts("hidden house", 33.77, -118.19)).await.unwrap();
    assert!(result.shops.is_empty());
    assert_eq!(*places.last_location.lock().unwrap(), "Santa Ana, CA");
}

#[tokio::test]
async fn proximity_search_reports_distance_from_catalogue() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    ShopSync::new(db.clone())
        .batch_sync(vec![
            shop("near", "Near Cafe", 33.7701, -118.1901),
            shop("far", "Far Cafe", 34.5, -118.19),
        ])
        .await
        .unwrap();

    let places = Arc::new(FakePlaces::default());
    let svc = service(places.clone(), intent(SearchType::Proximity, None, None), db);

    let result = svc.search(opts("coffee near me", 33.77, -118.19)).await.unwrap();
    assert_eq!(result.shops.len(), 1);
    assert_eq!(result.shops[0].place_id, "near");
    assert!(result.shops[0].distance_m.unwrap() < 100.0);
    assert_eq!(places.nearby_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn proximity_without_coordinates_searches_text() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let places = Arc::new(FakePlaces::default());
    let svc = service(places.clone(), intent(SearchType::Proximity, None, Some("Irvine, CA")), db);

    svc.search(opts("coffee nearby", 0.0, 0.0)).await.unwrap();
    assert_eq!(places.text_calls.load(Ordering::SeqCst), 1);
    assert_eq!(places.nearby_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_search_is_served_from_cache_with_paging() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let places = Arc::new(FakePlaces {
        shops: (0..5)
            .map(|i| shop(&format!("p{}", i), &format!("Cafe {}", i), 33.6, -117.9))
            .collect(),
        ..Default::default()
    });
    let svc = service(places.clone(), intent(SearchType::Area, None, Some("Irvine, CA")), db);

    let first = svc.search(opts("cafes in irvine", 0.0, 0.0)).await.unwrap();
    assert_eq!(first.shops.len(), 5);

    let paged = svc
        .search(SearchOptions {
            limit: 2,
            offset: 3,
            ..opts("cafes in irvine", 0.0, 0.0)
        })
        .await
        .unwrap();
    assert_eq!(paged.shops.len(), 2);
    assert_eq!(paged.shops[0].place_id, "p3");
    assert_eq!(places.text_calls.load(Ordering::SeqCst), 1);
}

async fn seeded_nearby(count: usize) -> Arc<Database> {
    let db = Arc::new(Database::open_in_memory().unwrap());
    ShopSync::new(db.clone())
        .batch_sync(
            (0..count)
                .map(|i| shop(&format!("n{}", i), &format!("Corner {}", i), 33.77 + i as f64 * 0.001, -118.19))
                .collect(),
        )
        .await
        .unwrap();
    db
}

#[tokio::test]
async fn larger_page_after_smaller_one_sees_every_catalogue_shop() {
    let db = seeded_nearby(5).await;
    let places = Arc::new(FakePlaces::default());
    let svc = service(places.clone(), intent(SearchType::Proximity, None, None), db);

    let small = svc
        .search(SearchOptions {
            limit: 2,
            ..opts("coffee near me", 33.77, -118.19)
        })
        .await
        .unwrap();
    assert_eq!(small.shops.len(), 2);

    let large = svc
        .search(SearchOptions {
            limit: 5,
            ..opts("coffee near me", 33.77, -118.19)
        })
        .await
        .unwrap();
    assert_eq!(large.shops.len(), 5);
    assert_eq!(places.nearby_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn huge_paging_values_give_an_empty_page() {
    let db = seeded_nearby(3).await;
    let places = Arc::new(FakePlaces::default());
    let svc = service(places, intent(SearchType::Proximity, None, None), db);

    let result = svc
        .search(SearchOptions {
            limit: usize::MAX,
            offset: usize::MAX,
            ..opts("coffee near me", 33.77, -118.19)
        })
        .await
        .unwrap();
    assert!(result.shops.is_empty());

    let capped = svc
        .search(SearchOptions {
            limit: usize::MAX,
            ..opts("coffee near me", 33.77, -118.19)
        })
        .await
        .unwrap();
    assert_eq!(capped.shops.len(), 3);
}

#[tokio::test]
async fn specific_search_is_cached_per_location() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let places = Arc::new(FakePlaces::default());
    let svc = service(places.clone(), intent(SearchType::Specific, Some("Portola"), None), db);

    svc.search(opts("portola", 33.77, -118.19)).await.unwrap();
    svc.search(opts("portola", 33.77, -118.19)).await.unwrap();
    assert_eq!(places.specific_calls.load(Ordering::SeqCst), 1);

    svc.search(opts("portola", 37.77, -122.41)).await.unwrap();
    assert_eq!(places.specific_calls.load(Ordering::SeqCst), 2);
}
