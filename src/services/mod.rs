// Service exports
pub mod cache;
pub mod matching;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CachedUserDirectory};
pub use matching::{MatchingService, MATCH_EVENT};
pub use memory::MemoryStore;
pub use notifier::{HttpNotifier, NoopNotifier, Notifier, NotifyError};
pub use postgres::PostgresStore;
pub use store::{BlockRegistry, MatchStore, PairRemoval, StoreError, UserDirectory};
