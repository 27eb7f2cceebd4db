//! GitHub contribution calendar and starred repositories.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use sitepulse_core::constants::{
    DEFAULT_GITHUB_API_URL, DEFAULT_GITHUB_USER, DEFAULT_HTTP_TIMEOUT_SECS, GITHUB_API_VERSION,
};
use sitepulse_core::error::{Result, SitepulseError};
use sitepulse_core::types::{ActivityCount, Limit};

use crate::http::{build_client, send_json};

const CONTRIBUTIONS_QUERY: &str = r#"
query($userName: String!) {
  user(login: $userName) {
    contributionsCollection {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            contributionCount
            date
          }
        }
      }
    }
  }
}
"#;

/// Largest page the starred endpoint serves.
const STARRED_PAGE_SIZE: usize = 100;

/// GitHub client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API base (e.g., "https://api.github.com")
    pub api_url: String,
    /// Login whose data is fetched
    pub user: String,
    /// Personal access token
    pub token: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl GithubConfig {
    /// Creates a config for the default user with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.into(),
            user: DEFAULT_GITHUB_USER.into(),
            token: token.into(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    /// Points the client at another API base.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Fetches data for another login.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// One day of the contribution calendar.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDay {
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Contributions on that day
    pub contribution_count: i64,
}

impl ContributionDay {
    /// Creates a calendar day.
    pub fn new(date: NaiveDate, contribution_count: i64) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            contribution_count,
        }
    }
}

/// Client for the GitHub GraphQL and REST APIs.
pub struct GithubClient {
    config: GithubConfig,
    http_client: reqwest::Client,
}

impl GithubClient {
    /// Creates a new GitHub client.
    pub fn new(config: GithubConfig) -> Self {
        let http_client = build_client(config.timeout_seconds);
        Self {
            config,
            http_client,
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    /// Tallies contributions over the last `days` days, today first.
    pub async fn contribution_activity(&self, days: usize) -> Result<ActivityCount> {
        let calendar = self.contribution_calendar().await?;
        Ok(tally_contributions(&calendar, days, Utc::now().date_naive()))
    }

    /// Fetches the raw contribution calendar of the configured user.
    #[instrument(skip(self), fields(user = %self.config.user))]
    pub async fn contribution_calendar(&self) -> Result<Vec<ContributionDay>> {
        let body = serde_json::json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": { "userName": self.config.user },
        });

        let request = self
            .http_client
            .post(format!("{}/graphql", self.api_base()))
            .bearer_auth(&self.config.token)
            .json(&body);

        let response: GraphqlResponse<ContributionData> = send_json(request).await?;

        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(SitepulseError::ResponseParse(format!(
                "GraphQL errors: {}",
                messages.join("; ")
            )));
        }

        let user = response
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| {
                SitepulseError::ResponseParse(format!(
                    "GitHub user '{}' not found",
                    self.config.user
                ))
            })?;

        let calendar = user.contributions_collection.contribution_calendar;
        debug!(
            total = calendar.total_contributions,
            weeks = calendar.weeks.len(),
            "Fetched contribution calendar"
        );

        Ok(calendar
            .weeks
            .into_iter()
            .flat_map(|week| week.contribution_days)
            .collect())
    }

    /// Full names of the repositories the configured user starred, most
    /// recent first, cut to `limit`.
    #[instrument(skip(self), fields(user = %self.config.user))]
    pub async fn starred(&self, limit: Limit) -> Result<Vec<String>> {
        let request = self
            .http_client
            .get(format!("{}/users/{}/starred", self.api_base(), self.config.user))
            .query(&[("per_page", STARRED_PAGE_SIZE)])
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .bearer_auth(&self.config.token);

        let repos: Vec<StarredRepo> = send_json(request).await?;
        debug!(count = repos.len(), "Fetched starred repositories");

        let names = repos.into_iter().map(|r| r.full_name).collect();
        Ok(limit.truncate(names))
    }

    fn api_base(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }
}

/// Spreads calendar days over a `window`-day array, `day[0]` being `today`.
///
/// Days without contributions, days outside the window, days after `today`
/// and days whose date does not parse are left out of the tally.
pub fn tally_contributions(
    calendar: &[ContributionDay],
    window: usize,
    today: NaiveDate,
) -> ActivityCount {
    let mut tally = ActivityCount::empty(window);

    for day in calendar.iter().filter(|d| d.contribution_count > 0) {
        let date = match NaiveDate::parse_from_str(&day.date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                warn!(date = %day.date, error = %e, "Skipping unparsable calendar date");
                continue;
            }
        };

        let Ok(days_ago) = usize::try_from((today - date).num_days()) else {
            continue;
        };
        tally.record(days_ago, day.contribution_count);
    }

    tally
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ContributionData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionCalendar {
    total_contributions: i64,
    weeks: Vec<ContributionWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionWeek {
    contribution_days: Vec<ContributionDay>,
}

#[derive(Debug, Deserialize)]
struct StarredRepo {
    full_name: String,
}
