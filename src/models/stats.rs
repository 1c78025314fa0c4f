use chrono::NaiveDate;
use serde::Serialize;

/// Aggregator event for a user's daily counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEvent {
    Attempted,
    Solved,
    Unsolved,
}

/// One (user, date) counter row. Derived/cached from interactions, kept
/// incrementally rather than recomputed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: NaiveDate,
    pub problems_attempted: i64,
    pub problems_solved: i64,
    pub streak: i64,
}

/// Today's counters, zero-filled when the user has no row yet.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub problems_attempted: i64,
    pub problems_solved: i64,
    pub streak: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub today: TodayStats,
    pub total_solved: i64,
    pub recent_activity: Vec<DailyStat>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub total_solved: i64,
}
