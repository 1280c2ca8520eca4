// Service exports
pub mod cache;
pub mod matching;
pub mod memory;
pub mod postgres;
pub mod profiles;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats, CachedProfileDirectory};
pub use matching::{MatchService, MatchingOptions};
pub use memory::{MemoryPairingStore, MemoryProfileDirectory};
pub use postgres::{PostgresError, PostgresPairingStore};
pub use profiles::{ProfileServiceClient, ProfileServiceError};
pub use store::{PairingPage, PairingStore, ProfileDirectory, StoreError};
