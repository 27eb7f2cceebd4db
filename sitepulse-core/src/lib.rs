//! # Sitepulse Core
//!
//! Shared building blocks for the sitepulse crates:
//!
//! - **Types**: response items for every route and the activity tally
//! - **Errors**: the upstream failure taxonomy
//! - **Constants**: route TTLs and configuration defaults
//!
//! ## Example
//!
//! ```rust
//! use sitepulse_core::{ActivityCount, Limit};
//!
//! let count = ActivityCount::from_increments(vec![3, 0, 7]);
//! assert_eq!(count.total, 10);
//! assert_eq!(Limit::from_signed(2).truncate(vec![1, 2, 3]), vec![1, 2]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{Result, SitepulseError};
pub use types::*;
