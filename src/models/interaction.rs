use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of the public share identifiers (`visible_id`, share codes).
const VISIBLE_ID_LEN: usize = 10;

/// One user's encounter with one problem. Created lazily the first time the
/// problem is served to that user; one row per (user, problem) pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: i64,
    pub visible_id: String,
    pub user_id: String,
    pub problem_id: i64,
    pub reaction: Option<Reaction>,
    pub solved: bool,
    pub started_at: DateTime<Utc>,
    pub solved_at: Option<DateTime<Utc>>,
    pub time_spent_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Reaction::Like),
            "dislike" => Some(Reaction::Dislike),
            _ => None,
        }
    }
}

/// Generate a short url-safe public id for share links.
pub fn new_visible_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VISIBLE_ID_LEN)
        .map(char::from)
        .collect()
}

/// Outcome of a solved/unsolved toggle, as reported back to the client and
/// used to drive the daily-stats side effect.
#[derive(Debug, Clone, Copy)]
pub struct SolveOutcome {
    pub solved: bool,
    pub time_spent_seconds: Option<i64>,
    /// Set only when the toggle actually changed state, so repeated
    /// identical calls never double-count.
    pub stats_event: Option<super::stats::StatEvent>,
}
