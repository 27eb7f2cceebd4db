//! App state: configuration, upstream clients and the per-route caches.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use sitepulse_cache::{CachedRoute, Clock, SystemClock};
use sitepulse_core::constants::*;
use sitepulse_core::error::{Result, SitepulseError};
use sitepulse_core::types::Limit;
use sitepulse_sources::{FeedClient, GithubClient, GithubConfig, MisskeyClient, MisskeyConfig};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Bind address
    pub listen: String,
    /// Blog posts served by `/feed/blog`
    pub feed_limit_blog: Limit,
    /// Entries served by `/feed/github`
    pub feed_limit_github: Limit,
    /// Notes served by `/feed/misskey`
    pub feed_limit_misskey: Limit,
    /// Cache lifetime of `/feed/misskey`
    pub misskey_feed_ttl: Duration,
    /// Activity window in days
    pub count_days: usize,
    /// Repositories served by `/like/github`
    pub like_limit_github: Limit,
    /// GitHub API access
    pub github: GithubConfig,
    /// GitHub public activity feed
    pub github_feed_url: String,
    /// Blog Atom/RSS feed
    pub blog_feed_url: String,
    /// Cover for posts without a thumbnail
    pub blog_default_cover: String,
    /// Misskey instance and account
    pub misskey: MisskeyConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.into(),
            feed_limit_blog: Limit::from_signed(DEFAULT_FEED_LIMIT_BLOG),
            feed_limit_github: Limit::from_signed(DEFAULT_FEED_LIMIT_GITHUB),
            feed_limit_misskey: Limit::from_signed(DEFAULT_FEED_LIMIT_MISSKEY),
            misskey_feed_ttl: DEFAULT_MISSKEY_FEED_TTL,
            count_days: DEFAULT_COUNT_DAYS,
            like_limit_github: Limit::from_signed(DEFAULT_LIKE_LIMIT_GITHUB),
            github: GithubConfig::new(""),
            github_feed_url: github_feed_url(DEFAULT_GITHUB_USER),
            blog_feed_url: DEFAULT_BLOG_FEED_URL.into(),
            blog_default_cover: DEFAULT_BLOG_COVER.into(),
            misskey: MisskeyConfig::default(),
        }
    }
}

fn github_feed_url(user: &str) -> String {
    format!("{}/{}.atom", DEFAULT_GITHUB_WEB_URL, user)
}

impl ApiConfig {
    /// Reads the configuration from the environment (and `.env`, if present).
    ///
    /// Fails only when `GITHUB_TOKEN` is missing.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("GITHUB_TOKEN")
            .ok_or_else(|| SitepulseError::Config("GITHUB_TOKEN is not set".into()))?;

        let defaults = Self::default();
        let parsed = |key: &str| -> Option<i64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<i64>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key, value = %raw, error = %e, "Ignoring unparsable setting");
                    None
                }
            }
        };
        let limit =
            |key: &str, default: Limit| parsed(key).map(Limit::from_signed).unwrap_or(default);

        let count_days = match parsed("COUNT_DAYS").map(usize::try_from) {
            Some(Ok(days)) => days,
            Some(Err(_)) => {
                warn!("Ignoring negative COUNT_DAYS");
                defaults.count_days
            }
            None => defaults.count_days,
        };

        let misskey_feed_ttl = match parsed("FEED_TTL_MISSKEY").map(u64::try_from) {
            Some(Ok(secs)) => Duration::from_secs(secs),
            Some(Err(_)) => {
                warn!("Ignoring negative FEED_TTL_MISSKEY");
                defaults.misskey_feed_ttl
            }
            None => defaults.misskey_feed_ttl,
        };

        let mut github = GithubConfig::new(token);
        if let Some(user) = lookup("GITHUB_USER") {
            github = github.with_user(user);
        }
        if let Some(api_url) = lookup("GITHUB_API_URL") {
            github = github.with_api_url(api_url);
        }

        let mut misskey = defaults.misskey.clone();
        if let Some(instance) = lookup("MISSKEY_INSTANCE") {
            misskey.instance_url = instance;
        }
        if let Some(user_id) = lookup("MISSKEY_USER_ID") {
            misskey.user_id = user_id;
        }

        Ok(Self {
            listen: lookup("LISTEN")
                .map(|l| normalize_listen(&l))
                .unwrap_or(defaults.listen),
            feed_limit_blog: limit("FEED_LIMIT_BLOG", defaults.feed_limit_blog),
            feed_limit_github: limit("FEED_LIMIT_GITHUB", defaults.feed_limit_github),
            feed_limit_misskey: limit("FEED_LIMIT_MISSKEY", defaults.feed_limit_misskey),
            misskey_feed_ttl,
            count_days,
            like_limit_github: limit("LIKE_LIMIT_GITHUB", defaults.like_limit_github),
            github_feed_url: lookup("GITHUB_FEED_URL")
                .unwrap_or_else(|| github_feed_url(&github.user)),
            github,
            blog_feed_url: lookup("BLOG_FEED_URL").unwrap_or(defaults.blog_feed_url),
            blog_default_cover: lookup("BLOG_DEFAULT_COVER").unwrap_or(defaults.blog_default_cover),
            misskey,
        })
    }
}

/// Turns a port-only address such as `:8080` into one bound on all interfaces.
pub fn normalize_listen(listen: &str) -> String {
    let listen = listen.trim();
    if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    }
}

/// One cache per route.
#[derive(Debug)]
pub struct RouteCaches {
    /// `/feed/blog`
    pub blog_feed: CachedRoute,
    /// `/feed/github`
    pub github_feed: CachedRoute,
    /// `/feed/misskey`
    pub misskey_feed: CachedRoute,
    /// `/count/activity` and `/count/social-activity`
    pub activity: CachedRoute,
    /// `/like/github`
    pub github_stars: CachedRoute,
}

impl RouteCaches {
    /// Creates empty caches on the given clock.
    pub fn new(misskey_feed_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            blog_feed: CachedRoute::with_clock("feed/blog", BLOG_FEED_TTL, clock.clone()),
            github_feed: CachedRoute::with_clock("feed/github", GITHUB_FEED_TTL, clock.clone()),
            misskey_feed: CachedRoute::with_clock("feed/misskey", misskey_feed_ttl, clock.clone()),
            activity: CachedRoute::with_clock("count/activity", ACTIVITY_TTL, clock.clone()),
            github_stars: CachedRoute::with_clock("like/github", GITHUB_STARS_TTL, clock),
        }
    }
}

/// Shared state handed to every handler.
pub struct AppState {
    /// Resolved configuration
    pub config: ApiConfig,
    /// Per-route caches
    pub caches: RouteCaches,
    /// GitHub API client
    pub github: GithubClient,
    /// Misskey API client
    pub misskey: MisskeyClient,
    /// Feed downloader
    pub feeds: FeedClient,
}

impl AppState {
    /// Creates state on the system clock.
    pub fn new(config: ApiConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates state on the given clock.
    pub fn with_clock(config: ApiConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            caches: RouteCaches::new(config.misskey_feed_ttl, clock),
            github: GithubClient::new(config.github.clone()),
            misskey: MisskeyClient::with_config(config.misskey.clone()),
            feeds: FeedClient::new(),
            config,
        }
    }
}
