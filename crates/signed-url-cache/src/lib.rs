//! Two-tier signed URL cache
//!
//! Maps storage object paths to short-lived signed URLs. Reads are served
//! from a bounded in-memory tier backed by a persistent key-value tier; both
//! expire entries after a fixed TTL. A total miss mints a fresh URL through a
//! [`UrlMinter`], with concurrent lookups for the same key sharing one mint.

mod cache;
mod clock;
mod config;
mod error;
mod memory;
mod minter;
mod path;
mod store;
mod types;

pub use cache::{Lookup, SignedUrlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use memory::MemoryTier;
pub use minter::{MintError, UrlMinter};
pub use path::{is_absolute_url, normalize_key};
pub use store::{FileStore, InMemoryStore, KeyValueStore};
pub use types::{CacheEntry, CacheStats};
