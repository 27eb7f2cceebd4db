//! Time-boxed single-slot response cache.
//!
//! Each route owns one [`CachedRoute`]: a single serialized payload, the
//! instant it was produced, and the route's TTL. A request that finds the
//! payload fresh is answered from the slot; otherwise the route's fetch runs
//! and its serialized result replaces the slot.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod clock;
mod refresh;
mod slot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use refresh::{get_or_refresh, CachedRoute};
pub use slot::CacheSlot;
