use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use coffeehaus_types::search::SearchResult;

/// Search results stay cached this long.
pub const SEARCH_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// In-memory search result cache with a fixed TTL.
pub struct SearchCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, SearchResult)>>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<SearchResult> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, result)| result.clone())
    }

    pub async fn insert(&self, key: String, result: SearchResult) {
        let mut entries = self.entries.write().await;
        // Prune on write so the map cannot grow without bound.
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), result));
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(SEARCH_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffeehaus_types::search::SearchType;

    fn result(q: &str) -> SearchResult {
        SearchResult {
            search_type: SearchType::Area,
            normalized_query: q.into(),
            shops: vec![],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.insert("matcha".into(), result("matcha")).await;
        assert!(cache.get("matcha").await.is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("matcha").await.is_none());

        cache.insert("latte".into(), result("latte")).await;
        assert_eq!(cache.len().await, 1);
    }
}
