pub mod cache_store;
pub mod cached_result;
pub mod error;

pub use cache_store::{CacheStats, CacheStore, Namespace};
pub use cached_result::{CachedResult, DEFAULT_CACHE_TTL};
pub use error::StoreError;
