//! Route TTLs and configuration defaults.
//!
//! Every value here can be overridden at startup except the route TTLs,
//! which are fixed per route (the Misskey feed TTL is the one exception).

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTE TTLS
// ═══════════════════════════════════════════════════════════════════════════════

const HOUR: u64 = 60 * 60;

/// How long the blog feed stays cached.
pub const BLOG_FEED_TTL: Duration = Duration::from_secs(12 * HOUR);

/// How long the GitHub public activity feed stays cached.
pub const GITHUB_FEED_TTL: Duration = Duration::from_secs(HOUR);

/// Default TTL of the Misskey notes feed (overridable).
pub const DEFAULT_MISSKEY_FEED_TTL: Duration = Duration::from_secs(HOUR);

/// How long the combined GitHub + Misskey activity tally stays cached.
pub const ACTIVITY_TTL: Duration = Duration::from_secs(12 * HOUR);

/// How long the starred repository list stays cached.
pub const GITHUB_STARS_TTL: Duration = Duration::from_secs(HOUR);

// ═══════════════════════════════════════════════════════════════════════════════
// LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default number of blog items returned.
pub const DEFAULT_FEED_LIMIT_BLOG: i64 = 10;

/// Default number of GitHub feed items returned.
pub const DEFAULT_FEED_LIMIT_GITHUB: i64 = 10;

/// Default number of Misskey notes returned.
pub const DEFAULT_FEED_LIMIT_MISSKEY: i64 = 10;

/// Default number of starred repositories returned.
pub const DEFAULT_LIKE_LIMIT_GITHUB: i64 = 10;

/// Default activity window, in days.
pub const DEFAULT_COUNT_DAYS: usize = 30;

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default bind address.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:1323";

/// Default GitHub login whose activity is reported.
pub const DEFAULT_GITHUB_USER: &str = "Candinya";

/// Default GitHub REST/GraphQL API base.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default GitHub web base, used for the public `.atom` activity feed.
pub const DEFAULT_GITHUB_WEB_URL: &str = "https://github.com";

/// GitHub REST API version header value.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Default blog Atom feed.
pub const DEFAULT_BLOG_FEED_URL: &str = "https://candinya.com/atom.xml";

/// Cover used for blog posts without a media thumbnail.
pub const DEFAULT_BLOG_COVER: &str = "https://candinya.com/images/default.webp";

/// Default Misskey instance.
pub const DEFAULT_MISSKEY_INSTANCE: &str = "https://nya.one";

/// Default Misskey user id.
pub const DEFAULT_MISSKEY_USER_ID: &str = "8837yxdz1d";

/// Outbound request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Sent with every outbound request; GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("sitepulse/", env!("CARGO_PKG_VERSION"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_ttls() {
        assert_eq!(BLOG_FEED_TTL.as_secs(), 43_200);
        assert_eq!(ACTIVITY_TTL.as_secs(), 43_200);
        assert_eq!(GITHUB_FEED_TTL.as_secs(), 3_600);
        assert_eq!(GITHUB_STARS_TTL.as_secs(), 3_600);
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("sitepulse/"));
        assert!(USER_AGENT.len() > "sitepulse/".len());
    }
}
