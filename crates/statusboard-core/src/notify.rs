//! Outbound announcements of incidents and maintenance updates.
//!
//! Notification is best effort: the lifecycle managers call it after their
//! transaction has committed, and a failure is logged and otherwise
//! ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use statusboard_db::{DbPool, Entity, RecordStore, SqliteStore};
use statusboard_types::{Incident, ScheduledMaintenance, StatusUpdate};

use crate::CoreError;

/// Longest post the notifier sends, in characters.
pub const MAX_POST_CHARS: usize = 280;

/// Default timeout for a single post.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from a notifier backend.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notifier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notifier rejected the post with status {0}")]
    Status(u16),

    #[error("notifier response had no usable post id")]
    Decode,

    #[error("notifier is disabled")]
    Disabled,
}

/// Something that can publish a short text and return its post id.
pub trait Notifier: Send + Sync {
    /// Publishes `text`, threaded under `reply_to` when given.
    fn post(&self, text: &str, reply_to: Option<i64>) -> Result<i64, NotifyError>;
}

#[derive(Serialize)]
struct PostRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to: Option<i64>,
}

#[derive(Deserialize)]
struct PostResponse {
    id: i64,
}

/// Posts announcements as JSON to an HTTP endpoint.
///
/// Uses the blocking client, so calls must run off the async runtime
/// (the server wraps every core call in `spawn_blocking`).
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    endpoint: String,
    token: String,
    timeout: Duration,
}

impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            timeout,
        }
    }
}

impl Notifier for HttpNotifier {
    fn post(&self, text: &str, reply_to: Option<i64>) -> Result<i64, NotifyError> {
        if self.endpoint.is_empty() {
            return Err(NotifyError::Disabled);
        }

        // Blocking clients own a runtime; build inside the blocking context.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent("statusboard/1.0 (notifier)")
            .build()?;

        let response = client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&PostRequest {
                text,
                in_reply_to: reply_to,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        let body: PostResponse = response.json().map_err(|_| NotifyError::Decode)?;
        if body.id == 0 {
            return Err(NotifyError::Decode);
        }
        Ok(body.id)
    }
}

/// Posts through `notifier` if there is one, logging any failure.
///
/// Returns the new post id, or `None` when nothing was posted.
pub(crate) fn post_best_effort(
    notifier: Option<&dyn Notifier>,
    text: &str,
    reply_to: Option<i64>,
) -> Option<i64> {
    let notifier = notifier?;
    match notifier.post(text, reply_to) {
        Ok(id) if id != 0 => Some(id),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "failed to post status notification");
            None
        }
    }
}

/// Writes a new post id into `record` through a freshly checked-out
/// connection.
///
/// `record` only changes once the write succeeds; otherwise it still matches
/// the stored row and the error is logged. The write is not retried.
pub(crate) fn store_post_id<T: Entity + Clone>(
    pool: &DbPool,
    record: &mut T,
    field: fn(&mut T) -> &mut i64,
    post_id: i64,
) {
    let mut announced = record.clone();
    *field(&mut announced) = post_id;
    let stored = pool
        .get()
        .map_err(CoreError::from)
        .and_then(|conn| Ok(SqliteStore::new(&conn).update(&mut announced)?));
    match stored {
        Ok(()) => *record = announced,
        Err(e) => tracing::error!(
            table = T::TABLE,
            id = record.id(),
            post_id,
            error = %e,
            "failed to store announcement id"
        ),
    }
}

/// A non-zero post id as a reply target.
pub(crate) fn reply_target(post_id: i64) -> Option<i64> {
    (post_id != 0).then_some(post_id)
}

fn clip(mut text: String) -> String {
    if let Some((cut, _)) = text.char_indices().nth(MAX_POST_CHARS) {
        let mut end = cut;
        // Leave room for the ellipsis.
        if let Some((prev, _)) = text[..cut].char_indices().next_back() {
            end = prev;
        }
        text.truncate(end);
        text.push('…');
    }
    text
}

fn latest_message(updates: &[StatusUpdate]) -> &str {
    updates.last().map(|u| u.message.as_str()).unwrap_or_default()
}

/// Announcement for a newly created incident.
pub fn incident_created_text(incident: &Incident) -> String {
    clip(format!(
        "[{}] {}: {}",
        incident.status,
        incident.title,
        latest_message(&incident.updates)
    ))
}

/// Announcement for an update appended to an incident.
pub fn incident_update_text(incident: &Incident, update: &StatusUpdate) -> String {
    clip(format!(
        "[{}] {}: {}",
        update.status, incident.title, update.message
    ))
}

/// Announcement for an update appended to a scheduled maintenance.
pub fn maintenance_update_text(maintenance: &ScheduledMaintenance, update: &StatusUpdate) -> String {
    clip(format!(
        "[{}] {}: {}",
        update.status, maintenance.title, update.message
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use statusboard_types::{now, IncidentStatus};

    struct Failing;

    impl Notifier for Failing {
        fn post(&self, _text: &str, _reply_to: Option<i64>) -> Result<i64, NotifyError> {
            Err(NotifyError::Status(503))
        }
    }

    struct Fixed(i64);

    impl Notifier for Fixed {
        fn post(&self, _text: &str, _reply_to: Option<i64>) -> Result<i64, NotifyError> {
            Ok(self.0)
        }
    }

    #[test]
    fn best_effort_swallows_failures() {
        assert_eq!(post_best_effort(Some(&Failing), "x", None), None);
        assert_eq!(post_best_effort(None, "x", None), None);
        assert_eq!(post_best_effort(Some(&Fixed(0)), "x", None), None);
        assert_eq!(post_best_effort(Some(&Fixed(42)), "x", Some(7)), Some(42));
    }

    #[test]
    fn reply_target_ignores_unset_ids() {
        assert_eq!(reply_target(0), None);
        assert_eq!(reply_target(99), Some(99));
    }

    #[test]
    fn long_posts_are_clipped() {
        let clipped = clip("é".repeat(400));
        assert_eq!(clipped.chars().count(), MAX_POST_CHARS);
        assert!(clipped.ends_with('…'));

        let short = clip("all good".to_string());
        assert_eq!(short, "all good");
    }

    #[test]
    fn update_text_names_status_and_title() {
        let at = now();
        let maintenance = ScheduledMaintenance {
            id: 3,
            title: "Database upgrade".to_string(),
            description: String::new(),
            planned_start: at,
            planned_end: at,
            completed: false,
            services: Vec::new(),
            updates: Vec::new(),
            next_update_id: 0,
            original_tweet_id: 0,
            latest_tweet_id: 0,
            created_at: at,
            updated_at: at,
        };
        let update = StatusUpdate {
            id: 0,
            time: at,
            status: IncidentStatus::Resolved,
            message: "Upgrade finished".to_string(),
            services: Vec::new(),
        };

        assert_eq!(
            maintenance_update_text(&maintenance, &update),
            "[Resolved] Database upgrade: Upgrade finished"
        );
    }

    #[test]
    fn empty_endpoint_is_disabled() {
        let notifier = HttpNotifier::new("", "token", DEFAULT_TIMEOUT);
        assert!(matches!(
            notifier.post("hello", None),
            Err(NotifyError::Disabled)
        ));
    }
}
