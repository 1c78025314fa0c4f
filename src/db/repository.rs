use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{
    blocks_to_json, parse_blocks, DailyStat, Effect, Interaction, LeaderboardEntry, NewProblem,
    NewProfile, NewShare, Problem, ProblemPatch, Profile, Reaction, Role, Share, ShareStatus,
    ShareView, SolveOutcome, StatEvent,
};

use super::schema::SCHEMA;

const PROBLEM_COLUMNS: &str = "id, title, question_blocks, answer_blocks, background_video_url, \
     background_music_url, effect, is_published, created_by, created_at, updated_at";

const INTERACTION_COLUMNS: &str = "id, visible_id, user_id, problem_id, reaction, solved, \
     started_at, solved_at, time_spent_seconds";

#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            // Foreign keys are off by default in SQLite; the declared
            // cascades depend on this pragma.
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Profile operations

    pub async fn ensure_profile(&self, profile: NewProfile) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO profiles (id, email, name, avatar_url, role)
                     VALUES (?1, ?2, ?3, ?4, 'user')
                     ON CONFLICT(id) DO NOTHING",
                    params![profile.id, profile.email, profile.name, profile.avatar_url],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let user_id = user_id.to_string();
        let profile = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, email, name, avatar_url, role, created_at, updated_at
                     FROM profiles WHERE id = ?1",
                )?;
                let profile = stmt
                    .query_row(params![user_id], |row| Ok(profile_from_row(row)))
                    .optional()?;
                Ok(profile)
            })
            .await?;
        Ok(profile)
    }

    // Problem operations

    pub async fn insert_problem(
        &self,
        problem: NewProblem,
        created_by: Option<String>,
    ) -> Result<i64> {
        let question_blocks = blocks_to_json(&problem.question_blocks)?;
        let answer_blocks = blocks_to_json(&problem.answer_blocks)?;

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO problems (title, question_blocks, answer_blocks, \
                     background_video_url, background_music_url, effect, is_published, created_by)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        problem.title,
                        question_blocks,
                        answer_blocks,
                        problem.background_video_url,
                        problem.background_music_url,
                        problem.effect.as_str(),
                        problem.is_published,
                        created_by,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_problem(&self, id: i64) -> Result<Option<Problem>> {
        let row = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ?1"
                ))?;
                let row = stmt
                    .query_row(params![id], |row| Ok(problem_row(row)))
                    .optional()?;
                Ok(row)
            })
            .await?;

        match row {
            None => Ok(None),
            Some(row) => match parse_problem(row) {
                Some(problem) => Ok(Some(problem)),
                None => Err(anyhow!("problem {} has invalid content blocks", id).into()),
            },
        }
    }

    pub async fn list_problems(&self) -> Result<Vec<Problem>> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PROBLEM_COLUMNS} FROM problems ORDER BY created_at DESC, id DESC"
                ))?;
                let rows = stmt
                    .query_map([], |row| Ok(problem_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows.into_iter().filter_map(parse_problem).collect())
    }

    /// Ids of published problems the caller has not been served yet this
    /// session (the exclude set accumulates client-side).
    pub async fn list_unseen_published_ids(&self, exclude: Vec<i64>) -> Result<Vec<i64>> {
        let ids = self
            .conn
            .call(move |conn| {
                let ids = if exclude.is_empty() {
                    let mut stmt =
                        conn.prepare("SELECT id FROM problems WHERE is_published = 1")?;
                    let x = stmt
                        .query_map([], |row| row.get(0))?
                        .collect::<std::result::Result<Vec<i64>, _>>()?;
                    x
                } else {
                    let placeholders = vec!["?"; exclude.len()].join(",");
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id FROM problems WHERE is_published = 1 AND id NOT IN ({placeholders})"
                    ))?;
                    let x = stmt
                        .query_map(params_from_iter(exclude.iter()), |row| row.get(0))?
                        .collect::<std::result::Result<Vec<i64>, _>>()?;
                    x
                };
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    pub async fn get_published_by_ids(&self, ids: Vec<i64>) -> Result<Vec<Problem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .conn
            .call(move |conn| {
                let placeholders = vec!["?"; ids.len()].join(",");
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PROBLEM_COLUMNS} FROM problems \
                     WHERE is_published = 1 AND id IN ({placeholders})"
                ))?;
                let rows = stmt
                    .query_map(params_from_iter(ids.iter()), |row| Ok(problem_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows.into_iter().filter_map(parse_problem).collect())
    }

    pub async fn update_problem(&self, id: i64, update: NewProblem) -> Result<Option<Problem>> {
        let question_blocks = blocks_to_json(&update.question_blocks)?;
        let answer_blocks = blocks_to_json(&update.answer_blocks)?;

        let row = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE problems SET title = ?1, question_blocks = ?2, answer_blocks = ?3, \
                     background_video_url = ?4, background_music_url = ?5, effect = ?6, \
                     is_published = ?7, updated_at = datetime('now') WHERE id = ?8",
                    params![
                        update.title,
                        question_blocks,
                        answer_blocks,
                        update.background_video_url,
                        update.background_music_url,
                        update.effect.as_str(),
                        update.is_published,
                        id,
                    ],
                )?;
                if changed == 0 {
                    return Ok(None);
                }
                let row = conn.query_row(
                    &format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ?1"),
                    params![id],
                    |row| Ok(problem_row(row)),
                )?;
                Ok(Some(row))
            })
            .await?;

        match row {
            None => Ok(None),
            Some(row) => match parse_problem(row) {
                Some(problem) => Ok(Some(problem)),
                None => Err(anyhow!("problem {} has invalid content blocks", id).into()),
            },
        }
    }

    pub async fn patch_problem(&self, id: i64, patch: ProblemPatch) -> Result<Option<Problem>> {
        let question_blocks = match &patch.question_blocks {
            Some(blocks) => Some(blocks_to_json(blocks)?),
            None => None,
        };
        let answer_blocks = match &patch.answer_blocks {
            Some(blocks) => Some(blocks_to_json(blocks)?),
            None => None,
        };
        let ProblemPatch {
            title,
            background_video_url,
            background_music_url,
            effect,
            is_published,
            ..
        } = patch;

        let row = self
            .conn
            .call(move |conn| {
                let current = conn
                    .query_row(
                        &format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ?1"),
                        params![id],
                        |row| Ok(problem_row(row)),
                    )
                    .optional()?;
                let Some(mut row) = current else {
                    return Ok(None);
                };

                if let Some(title) = title {
                    row.title = title;
                }
                if let Some(blocks) = question_blocks {
                    row.question_blocks = blocks;
                }
                if let Some(blocks) = answer_blocks {
                    row.answer_blocks = blocks;
                }
                if let Some(url) = background_video_url {
                    row.background_video_url = Some(url);
                }
                if let Some(url) = background_music_url {
                    row.background_music_url = Some(url);
                }
                if let Some(effect) = effect {
                    row.effect = effect.as_str().to_string();
                }
                if let Some(is_published) = is_published {
                    row.is_published = is_published;
                }

                conn.execute(
                    "UPDATE problems SET title = ?1, question_blocks = ?2, answer_blocks = ?3, \
                     background_video_url = ?4, background_music_url = ?5, effect = ?6, \
                     is_published = ?7, updated_at = datetime('now') WHERE id = ?8",
                    params![
                        row.title,
                        row.question_blocks,
                        row.answer_blocks,
                        row.background_video_url,
                        row.background_music_url,
                        row.effect,
                        row.is_published,
                        id,
                    ],
                )?;
                let row = conn.query_row(
                    &format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ?1"),
                    params![id],
                    |row| Ok(problem_row(row)),
                )?;
                Ok(Some(row))
            })
            .await?;

        match row {
            None => Ok(None),
            Some(row) => match parse_problem(row) {
                Some(problem) => Ok(Some(problem)),
                None => Err(anyhow!("problem {} has invalid content blocks", id).into()),
            },
        }
    }

    pub async fn delete_problem(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute("DELETE FROM problems WHERE id = ?1", params![id])?;
                Ok(changed > 0)
            })
            .await?;
        Ok(deleted)
    }

    // Interaction operations

    /// Fetch the caller's interaction for a problem, creating it when absent.
    /// The insert is conditional on the (user, problem) uniqueness
    /// constraint, so concurrent requests cannot produce duplicate rows.
    /// Returns the row and whether this call created it.
    pub async fn ensure_interaction(
        &self,
        user_id: &str,
        problem_id: i64,
        visible_id: String,
        started_at: DateTime<Utc>,
    ) -> Result<(Interaction, bool)> {
        let user_id = user_id.to_string();
        let result = self
            .conn
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO interactions (visible_id, user_id, problem_id, started_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(user_id, problem_id) DO NOTHING",
                    params![visible_id, user_id, problem_id, started_at.to_rfc3339()],
                )?;
                let interaction = conn.query_row(
                    &format!(
                        "SELECT {INTERACTION_COLUMNS} FROM interactions \
                         WHERE user_id = ?1 AND problem_id = ?2"
                    ),
                    params![user_id, problem_id],
                    |row| Ok(interaction_from_row(row)),
                )?;
                Ok((interaction, inserted > 0))
            })
            .await?;
        Ok(result)
    }

    /// Overwrite the reaction on the caller's own interaction. Returns false
    /// when no row matches (absent id and foreign-owned id are
    /// indistinguishable to the caller).
    pub async fn set_reaction(
        &self,
        interaction_id: i64,
        user_id: &str,
        reaction: Option<Reaction>,
    ) -> Result<bool> {
        let user_id = user_id.to_string();
        let updated = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE interactions SET reaction = ?1 WHERE id = ?2 AND user_id = ?3",
                    params![reaction.map(|r| r.as_str()), interaction_id, user_id],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(updated)
    }

    /// Toggle the solved flag on the caller's own interaction. The prior
    /// state is read and the new state written on the serialized connection,
    /// and the returned outcome carries a stats event only when the state
    /// actually changed.
    pub async fn set_solved(
        &self,
        interaction_id: i64,
        user_id: &str,
        solved: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<SolveOutcome>> {
        let user_id = user_id.to_string();
        let outcome = self
            .conn
            .call(move |conn| {
                let prior = conn
                    .query_row(
                        "SELECT solved, started_at FROM interactions \
                         WHERE id = ?1 AND user_id = ?2",
                        params![interaction_id, user_id],
                        |row| {
                            Ok((row.get::<_, i64>(0)? != 0, row.get::<_, String>(1)?))
                        },
                    )
                    .optional()?;
                let Some((was_solved, started_at)) = prior else {
                    return Ok(None);
                };

                if solved {
                    let started = parse_datetime(&started_at).unwrap_or(now);
                    let elapsed = (now - started).num_seconds().max(0);
                    conn.execute(
                        "UPDATE interactions SET solved = 1, solved_at = ?1, \
                         time_spent_seconds = ?2 WHERE id = ?3",
                        params![now.to_rfc3339(), elapsed, interaction_id],
                    )?;
                    Ok(Some(SolveOutcome {
                        solved: true,
                        time_spent_seconds: Some(elapsed),
                        stats_event: (!was_solved).then_some(StatEvent::Solved),
                    }))
                } else {
                    conn.execute(
                        "UPDATE interactions SET solved = 0, solved_at = NULL WHERE id = ?1",
                        params![interaction_id],
                    )?;
                    Ok(Some(SolveOutcome {
                        solved: false,
                        time_spent_seconds: None,
                        stats_event: was_solved.then_some(StatEvent::Unsolved),
                    }))
                }
            })
            .await?;
        Ok(outcome)
    }

    pub async fn get_owned_interaction(
        &self,
        interaction_id: i64,
        user_id: &str,
    ) -> Result<Option<(Interaction, String)>> {
        let user_id = user_id.to_string();
        let result = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT i.id, i.visible_id, i.user_id, i.problem_id, i.reaction, i.solved, \
                            i.started_at, i.solved_at, i.time_spent_seconds, p.title
                     FROM interactions i
                     JOIN problems p ON p.id = i.problem_id
                     WHERE i.id = ?1 AND i.user_id = ?2",
                )?;
                let result = stmt
                    .query_row(params![interaction_id, user_id], |row| {
                        Ok((interaction_from_row(row), row.get::<_, String>(9)?))
                    })
                    .optional()?;
                Ok(result)
            })
            .await?;
        Ok(result)
    }

    // Daily stats operations

    /// Apply one aggregator event to the (user, date) row. Counter bumps are
    /// single atomic UPDATEs; row creation computes the streak from
    /// yesterday's row only and tolerates a concurrent insert via the
    /// (user, date) conflict clause. `Unsolved` never creates a row and its
    /// decrement is floor-guarded in SQL.
    pub async fn record_stat(
        &self,
        user_id: &str,
        event: StatEvent,
        date: NaiveDate,
    ) -> Result<()> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| {
                let date_str = date.format("%Y-%m-%d").to_string();
                match event {
                    StatEvent::Attempted | StatEvent::Solved => {
                        let column = match event {
                            StatEvent::Attempted => "problems_attempted",
                            _ => "problems_solved",
                        };
                        let updated = conn.execute(
                            &format!(
                                "UPDATE daily_stats SET {column} = {column} + 1 \
                                 WHERE user_id = ?1 AND date = ?2"
                            ),
                            params![user_id, date_str],
                        )?;
                        if updated == 0 {
                            let prev_streak: Option<i64> = match date.pred_opt() {
                                Some(yesterday) => conn
                                    .query_row(
                                        "SELECT streak FROM daily_stats \
                                         WHERE user_id = ?1 AND date = ?2",
                                        params![
                                            user_id,
                                            yesterday.format("%Y-%m-%d").to_string()
                                        ],
                                        |row| row.get(0),
                                    )
                                    .optional()?,
                                None => None,
                            };
                            let streak = prev_streak.map_or(1, |s| s + 1);
                            let (attempted, solved) = match event {
                                StatEvent::Attempted => (1, 0),
                                _ => (0, 1),
                            };
                            conn.execute(
                                "INSERT INTO daily_stats \
                                 (user_id, date, problems_attempted, problems_solved, streak)
                                 VALUES (?1, ?2, ?3, ?4, ?5)
                                 ON CONFLICT(user_id, date) DO UPDATE SET
                                     problems_attempted = problems_attempted + excluded.problems_attempted,
                                     problems_solved = problems_solved + excluded.problems_solved",
                                params![user_id, date_str, attempted, solved, streak],
                            )?;
                        }
                    }
                    StatEvent::Unsolved => {
                        conn.execute(
                            "UPDATE daily_stats SET problems_solved = problems_solved - 1 \
                             WHERE user_id = ?1 AND date = ?2 AND problems_solved > 0",
                            params![user_id, date_str],
                        )?;
                    }
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_daily_stat(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyStat>> {
        let user_id = user_id.to_string();
        let stat = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT date, problems_attempted, problems_solved, streak
                     FROM daily_stats WHERE user_id = ?1 AND date = ?2",
                )?;
                let stat = stmt
                    .query_row(
                        params![user_id, date.format("%Y-%m-%d").to_string()],
                        |row| Ok(daily_stat_from_row(row)),
                    )
                    .optional()?;
                Ok(stat)
            })
            .await?;
        Ok(stat)
    }

    pub async fn total_solved(&self, user_id: &str) -> Result<i64> {
        let user_id = user_id.to_string();
        let count = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM interactions WHERE user_id = ?1 AND solved = 1",
                    params![user_id],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    pub async fn recent_stats(&self, user_id: &str, limit: usize) -> Result<Vec<DailyStat>> {
        let user_id = user_id.to_string();
        let stats = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT date, problems_attempted, problems_solved, streak
                     FROM daily_stats WHERE user_id = ?1
                     ORDER BY date DESC LIMIT ?2",
                )?;
                let stats = stmt
                    .query_map(params![user_id, limit as i64], |row| {
                        Ok(daily_stat_from_row(row))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await?;
        Ok(stats)
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let entries = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT p.id, p.name, p.avatar_url, COUNT(i.id) AS total_solved
                     FROM profiles p
                     LEFT JOIN interactions i ON i.user_id = p.id AND i.solved = 1
                     GROUP BY p.id
                     ORDER BY total_solved DESC, p.created_at ASC, p.id ASC
                     LIMIT ?1",
                )?;
                let entries = stmt
                    .query_map(params![limit as i64], |row| {
                        Ok(LeaderboardEntry {
                            user_id: row.get(0)?,
                            name: row.get(1)?,
                            avatar_url: row.get(2)?,
                            total_solved: row.get(3)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    // Share operations

    pub async fn insert_share(&self, share: NewShare) -> Result<Share> {
        let share = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO shares (share_code, interaction_id, status, share_message)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        share.share_code,
                        share.interaction_id,
                        share.status.as_str(),
                        share.share_message,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                let share = conn.query_row(
                    "SELECT id, share_code, interaction_id, status, share_message, created_at
                     FROM shares WHERE id = ?1",
                    params![id],
                    |row| Ok(share_from_row(row)),
                )?;
                Ok(share)
            })
            .await?;
        Ok(share)
    }

    /// Resolve a public visible id to the share-link projection.
    pub async fn get_share_view(&self, visible_id: &str) -> Result<Option<ShareView>> {
        let visible_id = visible_id.to_string();
        let view = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT p.title, pf.name, pf.avatar_url, i.solved, i.time_spent_seconds
                     FROM interactions i
                     JOIN problems p ON p.id = i.problem_id
                     JOIN profiles pf ON pf.id = i.user_id
                     WHERE i.visible_id = ?1",
                )?;
                let view = stmt
                    .query_row(params![visible_id], |row| {
                        Ok(ShareView {
                            problem_title: row.get(0)?,
                            user_name: row.get(1)?,
                            user_avatar: row.get(2)?,
                            solved: row.get::<_, i64>(3)? != 0,
                            time_spent_seconds: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                        })
                    })
                    .optional()?;
                Ok(view)
            })
            .await?;
        Ok(view)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

fn profile_from_row(row: &Row) -> Profile {
    Profile {
        id: row.get(0).unwrap(),
        email: row.get(1).unwrap(),
        name: row.get(2).unwrap(),
        avatar_url: row.get(3).unwrap(),
        role: Role::from_str(&row.get::<_, String>(4).unwrap()),
        created_at: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

/// Raw problems row with the block sequences still serialized.
struct ProblemRow {
    id: i64,
    title: String,
    question_blocks: String,
    answer_blocks: String,
    background_video_url: Option<String>,
    background_music_url: Option<String>,
    effect: String,
    is_published: bool,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn problem_row(row: &Row) -> ProblemRow {
    ProblemRow {
        id: row.get(0).unwrap(),
        title: row.get(1).unwrap(),
        question_blocks: row.get(2).unwrap(),
        answer_blocks: row.get(3).unwrap(),
        background_video_url: row.get(4).unwrap(),
        background_music_url: row.get(5).unwrap(),
        effect: row.get(6).unwrap(),
        is_published: row.get::<_, i64>(7).unwrap() != 0,
        created_by: row.get(8).unwrap(),
        created_at: row
            .get::<_, String>(9)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, String>(10)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

/// Parse the serialized block sequences, logging and dropping rows that
/// fail the tagged-union validation instead of serving them unchecked.
fn parse_problem(row: ProblemRow) -> Option<Problem> {
    let question_blocks = match parse_blocks(&row.question_blocks) {
        Ok(blocks) => blocks,
        Err(e) => {
            tracing::warn!("Problem {} has invalid question blocks: {}", row.id, e);
            return None;
        }
    };
    let answer_blocks = match parse_blocks(&row.answer_blocks) {
        Ok(blocks) => blocks,
        Err(e) => {
            tracing::warn!("Problem {} has invalid answer blocks: {}", row.id, e);
            return None;
        }
    };
    Some(Problem {
        id: row.id,
        title: row.title,
        question_blocks,
        answer_blocks,
        background_video_url: row.background_video_url,
        background_music_url: row.background_music_url,
        effect: Effect::from_str(&row.effect),
        is_published: row.is_published,
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn interaction_from_row(row: &Row) -> Interaction {
    Interaction {
        id: row.get(0).unwrap(),
        visible_id: row.get(1).unwrap(),
        user_id: row.get(2).unwrap(),
        problem_id: row.get(3).unwrap(),
        reaction: row
            .get::<_, Option<String>>(4)
            .unwrap()
            .and_then(|s| Reaction::from_str(&s)),
        solved: row.get::<_, i64>(5).unwrap() != 0,
        started_at: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        solved_at: row
            .get::<_, Option<String>>(7)
            .unwrap()
            .and_then(|s| parse_datetime(&s)),
        time_spent_seconds: row.get::<_, Option<i64>>(8).unwrap().unwrap_or(0),
    }
}

fn daily_stat_from_row(row: &Row) -> DailyStat {
    DailyStat {
        date: parse_date(&row.get::<_, String>(0).unwrap()),
        problems_attempted: row.get(1).unwrap(),
        problems_solved: row.get(2).unwrap(),
        streak: row.get(3).unwrap(),
    }
}

fn share_from_row(row: &Row) -> Share {
    Share {
        id: row.get(0).unwrap(),
        share_code: row.get(1).unwrap(),
        interaction_id: row.get(2).unwrap(),
        status: ShareStatus::from_str(&row.get::<_, String>(3).unwrap()),
        share_message: row.get::<_, Option<String>>(4).unwrap().unwrap_or_default(),
        created_at: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_visible_id, ContentBlock};

    async fn test_repo() -> (Repository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (repo, dir)
    }

    fn profile(id: &str) -> NewProfile {
        NewProfile {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            name: Some(id.to_string()),
            avatar_url: None,
        }
    }

    fn problem(title: &str, published: bool) -> NewProblem {
        NewProblem {
            title: title.to_string(),
            question_blocks: vec![ContentBlock::Markdown("Q?".to_string())],
            answer_blocks: vec![ContentBlock::Markdown("A.".to_string())],
            background_video_url: None,
            background_music_url: None,
            effect: Effect::None,
            is_published: published,
        }
    }

    #[tokio::test]
    async fn ensure_interaction_creates_once() {
        let (repo, _dir) = test_repo().await;
        repo.ensure_profile(profile("u1")).await.unwrap();
        let pid = repo.insert_problem(problem("p", true), None).await.unwrap();

        let (first, created) = repo
            .ensure_interaction("u1", pid, new_visible_id(), Utc::now())
            .await
            .unwrap();
        assert!(created);
        assert!(!first.solved);

        let (second, created) = repo
            .ensure_interaction("u1", pid, new_visible_id(), Utc::now())
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.visible_id, first.visible_id);
    }

    #[tokio::test]
    async fn deleting_a_problem_cascades_to_interactions() {
        let (repo, _dir) = test_repo().await;
        repo.ensure_profile(profile("u1")).await.unwrap();
        let pid = repo.insert_problem(problem("p", true), None).await.unwrap();
        let (interaction, _) = repo
            .ensure_interaction("u1", pid, new_visible_id(), Utc::now())
            .await
            .unwrap();

        assert!(repo.delete_problem(pid).await.unwrap());
        let gone = repo
            .get_owned_interaction(interaction.id, "u1")
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn reaction_update_is_scoped_to_the_owner() {
        let (repo, _dir) = test_repo().await;
        repo.ensure_profile(profile("owner")).await.unwrap();
        repo.ensure_profile(profile("other")).await.unwrap();
        let pid = repo.insert_problem(problem("p", true), None).await.unwrap();
        let (interaction, _) = repo
            .ensure_interaction("owner", pid, new_visible_id(), Utc::now())
            .await
            .unwrap();

        let updated = repo
            .set_reaction(interaction.id, "other", Some(Reaction::Like))
            .await
            .unwrap();
        assert!(!updated);

        let updated = repo
            .set_reaction(interaction.id, "owner", Some(Reaction::Like))
            .await
            .unwrap();
        assert!(updated);
    }

    #[tokio::test]
    async fn corrupt_block_rows_are_dropped_from_lists() {
        let (repo, _dir) = test_repo().await;
        let good = repo.insert_problem(problem("good", true), None).await.unwrap();
        let bad = repo.insert_problem(problem("bad", true), None).await.unwrap();
        repo.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE problems SET question_blocks = 'not json' WHERE id = ?1",
                    params![bad],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let listed = repo.list_problems().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, good);
        assert!(repo.get_problem(bad).await.is_err());
    }
}
