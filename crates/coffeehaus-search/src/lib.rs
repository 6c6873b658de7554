//! Shop discovery: free-text search over the local catalogue with Google
//! Places as the fallback source, plus the background sync that copies Places
//! results into the catalogue.

pub mod analyzer;
pub mod cache;
pub mod error;
pub mod places;
pub mod service;
pub mod sync;

pub use analyzer::{ClaudeAnalyzer, QueryAnalyzer};
pub use error::{Result, SearchError};
pub use places::{GooglePlacesClient, PlacesClient};
pub use service::SearchService;
pub use sync::{ShopSync, SyncReport};
