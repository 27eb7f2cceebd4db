//! Misskey note chart and recent notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use sitepulse_core::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MISSKEY_INSTANCE, DEFAULT_MISSKEY_USER_ID,
};
use sitepulse_core::error::Result;
use sitepulse_core::types::{ActivityCount, Limit, MisskeyNoteItem};

use crate::http::{build_client, send_json};

/// Largest page `users/notes` serves.
const NOTES_PAGE_MAX: usize = 100;

/// Page size used when the route is unlimited.
const NOTES_PAGE_DEFAULT: usize = 10;

/// Misskey client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MisskeyConfig {
    /// Instance base URL (e.g., "https://nya.one")
    pub instance_url: String,
    /// Id of the user whose notes are read
    pub user_id: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for MisskeyConfig {
    fn default() -> Self {
        Self {
            instance_url: DEFAULT_MISSKEY_INSTANCE.into(),
            user_id: DEFAULT_MISSKEY_USER_ID.into(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl MisskeyConfig {
    /// Creates a config for the given instance and user.
    pub fn new(instance_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

/// A note as returned by `users/notes`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MisskeyNote {
    /// Note id
    pub id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Body
    #[serde(default)]
    pub text: Option<String>,
    /// Content warning
    #[serde(default)]
    pub cw: Option<String>,
}

/// Client for a Misskey instance's public API.
pub struct MisskeyClient {
    config: MisskeyConfig,
    http_client: reqwest::Client,
}

impl MisskeyClient {
    /// Creates a client with the default instance and user.
    pub fn new() -> Self {
        Self::with_config(MisskeyConfig::default())
    }

    /// Creates a client with custom configuration.
    pub fn with_config(config: MisskeyConfig) -> Self {
        let http_client = build_client(config.timeout_seconds);
        Self {
            config,
            http_client,
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &MisskeyConfig {
        &self.config
    }

    /// Notes posted per day over the last `days` days, today first.
    #[instrument(skip(self), fields(user_id = %self.config.user_id))]
    pub async fn note_activity(&self, days: usize) -> Result<ActivityCount> {
        let request = self
            .http_client
            .get(format!("{}/api/charts/user/notes", self.instance()))
            .query(&[
                ("userId", self.config.user_id.as_str()),
                ("limit", days.to_string().as_str()),
                ("span", "day"),
            ]);

        let chart: NotesChart = send_json(request).await?;
        debug!(points = chart.inc.len(), "Fetched note chart");

        Ok(ActivityCount::from_increments(chart.inc))
    }

    /// Most recent notes of the configured user, without replies or renotes.
    #[instrument(skip(self), fields(user_id = %self.config.user_id))]
    pub async fn recent_notes(&self, limit: Limit) -> Result<Vec<MisskeyNoteItem>> {
        let page = limit
            .get()
            .map_or(NOTES_PAGE_DEFAULT, |n| n.min(NOTES_PAGE_MAX));

        let body = serde_json::json!({
            "userId": self.config.user_id,
            "limit": page,
            "withReplies": false,
            "withRenotes": false,
        });

        let request = self
            .http_client
            .post(format!("{}/api/users/notes", self.instance()))
            .json(&body);

        let notes: Vec<MisskeyNote> = send_json(request).await?;
        debug!(count = notes.len(), "Fetched notes");

        Ok(note_items(notes, self.instance(), limit))
    }

    fn instance(&self) -> &str {
        self.config.instance_url.trim_end_matches('/')
    }
}

impl Default for MisskeyClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps notes to feed items linking back to `instance`, cut to `limit`.
pub fn note_items(notes: Vec<MisskeyNote>, instance: &str, limit: Limit) -> Vec<MisskeyNoteItem> {
    let instance = instance.trim_end_matches('/');
    let items = notes
        .into_iter()
        .map(|note| MisskeyNoteItem {
            link: format!("{}/notes/{}", instance, note.id),
            date: note.created_at,
            text: note.text,
            cw: note.cw,
        })
        .collect();
    limit.truncate(items)
}

/// `charts/user/notes` response; only the increments are used.
#[derive(Debug, Deserialize)]
struct NotesChart {
    inc: Vec<i64>,
}
