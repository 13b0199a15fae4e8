pub mod claim_cache;

pub use claim_cache::{CacheValue, ClaimCache, ClaimCacheConfig};
