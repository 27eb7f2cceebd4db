//! Atom/RSS feeds and the blog and GitHub feed transforms.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use sitepulse_core::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use sitepulse_core::error::{Result, SitepulseError};
use sitepulse_core::types::{BlogFeedItem, GithubFeedItem, Limit};

use crate::http::{build_client, request_error, send};

/// A feed entry, independent of the feed format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedEntry {
    /// Entry title, empty when the feed has none
    pub title: String,
    /// Alternate link, or the first link
    pub link: String,
    /// Publication time, falling back to the update time
    pub published: Option<DateTime<Utc>>,
    /// Category terms
    pub categories: Vec<String>,
    /// First media thumbnail
    pub cover_image_url: Option<String>,
}

impl From<feed_rs::model::Entry> for FeedEntry {
    fn from(entry: feed_rs::model::Entry) -> Self {
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone())
            .unwrap_or_default();

        let cover_image_url = entry
            .media
            .iter()
            .flat_map(|m| m.thumbnails.iter())
            .map(|t| t.image.uri.clone())
            .next();

        Self {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            link,
            published: entry.published.or(entry.updated),
            categories: entry.categories.into_iter().map(|c| c.term).collect(),
            cover_image_url,
        }
    }
}

/// Parses an Atom or RSS document into its entries, in document order.
pub fn parse_feed(document: &[u8]) -> Result<Vec<FeedEntry>> {
    let feed =
        feed_rs::parser::parse(document).map_err(|e| SitepulseError::FeedParse(e.to_string()))?;
    Ok(feed.entries.into_iter().map(FeedEntry::from).collect())
}

/// Downloads and parses feeds.
pub struct FeedClient {
    http_client: reqwest::Client,
}

impl FeedClient {
    /// Creates a feed client with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT_SECS)
    }

    /// Creates a feed client with a custom timeout.
    pub fn with_timeout(timeout_seconds: u64) -> Self {
        Self {
            http_client: build_client(timeout_seconds),
        }
    }

    /// Fetches `url` and returns its entries, newest first as published.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let document = send(self.http_client.get(url))
            .await?
            .bytes()
            .await
            .map_err(request_error)?;

        let entries = parse_feed(&document)?;
        debug!(count = entries.len(), "Parsed feed");
        Ok(entries)
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Blog posts: untitled entries are skipped and do not count toward `limit`.
pub fn blog_items(
    entries: Vec<FeedEntry>,
    limit: Limit,
    default_cover: &str,
) -> Vec<BlogFeedItem> {
    let mut items = Vec::new();

    for entry in entries {
        if !limit.allows(items.len()) {
            break;
        }
        if entry.title.is_empty() {
            continue;
        }

        items.push(BlogFeedItem {
            cover: entry
                .cover_image_url
                .unwrap_or_else(|| default_cover.to_string()),
            date: entry.published,
            title: entry.title,
            categories: entry.categories,
            link: entry.link,
        });
    }

    items
}

/// GitHub activity: the first `limit` entries, unfiltered.
pub fn github_items(entries: Vec<FeedEntry>, limit: Limit) -> Vec<GithubFeedItem> {
    let items = entries
        .into_iter()
        .map(|entry| GithubFeedItem {
            date: entry.published,
            title: entry.title,
            link: entry.link,
        })
        .collect();
    limit.truncate(items)
}
