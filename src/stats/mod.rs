use chrono::{NaiveDate, Utc};

use crate::db::Repository;
use crate::error::Result;
use crate::models::{LeaderboardEntry, StatEvent, TodayStats, UserStats};

const RECENT_DAYS: usize = 7;

/// Maintains the per-(user, date) counter rows incrementally and serves the
/// aggregated read side (user summary, leaderboard). The rows are a cache
/// over the interaction table, not a source of truth.
#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn record(&self, user_id: &str, event: StatEvent) -> Result<()> {
        self.record_on(user_id, event, Utc::now().date_naive()).await
    }

    /// The streak is fixed at row creation: yesterday's streak + 1 when a
    /// row for the previous date exists, else 1. Only the immediately
    /// preceding date is consulted, so activity after a gap restarts at 1
    /// and out-of-order backfill is unsupported.
    pub async fn record_on(
        &self,
        user_id: &str,
        event: StatEvent,
        date: NaiveDate,
    ) -> Result<()> {
        self.repository.record_stat(user_id, event, date).await
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let today = self
            .repository
            .get_daily_stat(user_id, Utc::now().date_naive())
            .await?
            .map(|stat| TodayStats {
                problems_attempted: stat.problems_attempted,
                problems_solved: stat.problems_solved,
                streak: stat.streak,
            })
            .unwrap_or_default();

        let total_solved = self.repository.total_solved(user_id).await?;
        let recent_activity = self.repository.recent_stats(user_id, RECENT_DAYS).await?;

        Ok(UserStats {
            today,
            total_solved,
            recent_activity,
        })
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.repository.leaderboard(limit).await
    }
}
