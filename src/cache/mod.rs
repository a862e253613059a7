//! Cache module - named caches backed by Moka.
//!
//! - `CacheRegistry` - central registry holding all named caches
//! - `TypedCache` - typed handle over one cache
//! - `CacheConfig` - capacity and expiry presets
//!
//! ```rust,ignore
//! let settings: TypedCache<i64, FloodSettings> =
//!     registry.get_or_create("flood_settings", CacheConfig::flood_settings())?;
//! settings.insert(chat_id, resolved);
//! ```

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;
