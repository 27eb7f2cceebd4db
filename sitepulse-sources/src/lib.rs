//! # Sitepulse Sources
//!
//! Clients for the upstream services behind each route, plus the pure
//! transforms that turn their answers into response items.
//!
//! - [`GithubClient`]: contribution calendar (GraphQL) and starred repositories
//! - [`MisskeyClient`]: daily note chart and recent notes
//! - [`FeedClient`]: Atom/RSS download and parsing

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod feed;
mod github;
mod http;
mod misskey;

pub use feed::{blog_items, github_items, parse_feed, FeedClient, FeedEntry};
pub use github::{tally_contributions, ContributionDay, GithubClient, GithubConfig};
pub use misskey::{note_items, MisskeyClient, MisskeyConfig, MisskeyNote};
