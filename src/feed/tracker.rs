use chrono::Utc;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Reaction, SolveOutcome};
use crate::stats::StatsService;

/// Records reactions and solved toggles against the caller's own
/// interactions, feeding the daily-stats aggregator as a side effect.
#[derive(Clone)]
pub struct InteractionTracker {
    repository: Repository,
    stats: StatsService,
}

impl InteractionTracker {
    pub fn new(repository: Repository, stats: StatsService) -> Self {
        Self { repository, stats }
    }

    /// Last write wins; `None` clears the reaction. No history is kept.
    pub async fn record_reaction(
        &self,
        user_id: &str,
        interaction_id: i64,
        reaction: Option<Reaction>,
    ) -> Result<()> {
        let updated = self
            .repository
            .set_reaction(interaction_id, user_id, reaction)
            .await?;
        if !updated {
            return Err(AppError::NotFound("Interaction"));
        }
        Ok(())
    }

    /// Toggle solved state. The day's solved counter moves only on a real
    /// state transition, so repeated identical calls are idempotent.
    pub async fn set_solved(
        &self,
        user_id: &str,
        interaction_id: i64,
        solved: bool,
    ) -> Result<SolveOutcome> {
        let outcome = self
            .repository
            .set_solved(interaction_id, user_id, solved, Utc::now())
            .await?
            .ok_or(AppError::NotFound("Interaction"))?;

        if let Some(event) = outcome.stats_event {
            // Best-effort: the toggle already succeeded, a failed counter
            // update is logged and swallowed.
            if let Err(e) = self.stats.record(user_id, event).await {
                tracing::warn!("Failed to update daily stats for {}: {}", user_id, e);
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_visible_id, ContentBlock, Effect, NewProblem, NewProfile};
    use chrono::Duration;

    async fn test_tracker() -> (InteractionTracker, Repository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repository = Repository::new(path.to_str().unwrap()).await.unwrap();
        let stats = StatsService::new(repository.clone());
        let tracker = InteractionTracker::new(repository.clone(), stats);
        (tracker, repository, dir)
    }

    async fn seed_interaction(repository: &Repository, user_id: &str) -> i64 {
        repository
            .ensure_profile(NewProfile {
                id: user_id.to_string(),
                email: format!("{user_id}@example.com"),
                name: None,
                avatar_url: None,
            })
            .await
            .unwrap();
        let problem_id = repository
            .insert_problem(
                NewProblem {
                    title: "p".to_string(),
                    question_blocks: vec![ContentBlock::Markdown("Q?".to_string())],
                    answer_blocks: vec![ContentBlock::Markdown("A.".to_string())],
                    background_video_url: None,
                    background_music_url: None,
                    effect: Effect::None,
                    is_published: true,
                },
                None,
            )
            .await
            .unwrap();
        let (interaction, _) = repository
            .ensure_interaction(user_id, problem_id, new_visible_id(), Utc::now())
            .await
            .unwrap();
        interaction.id
    }

    async fn solved_today(repository: &Repository, user_id: &str) -> i64 {
        repository
            .get_daily_stat(user_id, Utc::now().date_naive())
            .await
            .unwrap()
            .map(|s| s.problems_solved)
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn solving_reports_elapsed_seconds() {
        let (tracker, repository, _dir) = test_tracker().await;
        repository
            .ensure_profile(NewProfile {
                id: "u1".to_string(),
                email: "u1@example.com".to_string(),
                name: None,
                avatar_url: None,
            })
            .await
            .unwrap();
        let problem_id = repository
            .insert_problem(
                NewProblem {
                    title: "p".to_string(),
                    question_blocks: vec![ContentBlock::Markdown("Q?".to_string())],
                    answer_blocks: vec![ContentBlock::Markdown("A.".to_string())],
                    background_video_url: None,
                    background_music_url: None,
                    effect: Effect::None,
                    is_published: true,
                },
                None,
            )
            .await
            .unwrap();
        // Problem was first served 61 seconds ago.
        let (interaction, _) = repository
            .ensure_interaction(
                "u1",
                problem_id,
                new_visible_id(),
                Utc::now() - Duration::seconds(61),
            )
            .await
            .unwrap();

        let outcome = tracker.set_solved("u1", interaction.id, true).await.unwrap();
        assert!(outcome.solved);
        assert_eq!(outcome.time_spent_seconds, Some(61));
        assert_eq!(solved_today(&repository, "u1").await, 1);
    }

    #[tokio::test]
    async fn repeated_solves_count_once() {
        let (tracker, repository, _dir) = test_tracker().await;
        let id = seed_interaction(&repository, "u1").await;

        tracker.set_solved("u1", id, true).await.unwrap();
        tracker.set_solved("u1", id, true).await.unwrap();
        tracker.set_solved("u1", id, true).await.unwrap();

        assert_eq!(solved_today(&repository, "u1").await, 1);
    }

    #[tokio::test]
    async fn solve_unsolve_solve_nets_one() {
        let (tracker, repository, _dir) = test_tracker().await;
        let id = seed_interaction(&repository, "u1").await;

        tracker.set_solved("u1", id, true).await.unwrap();
        let outcome = tracker.set_solved("u1", id, false).await.unwrap();
        assert!(!outcome.solved);
        assert_eq!(outcome.time_spent_seconds, None);
        assert_eq!(solved_today(&repository, "u1").await, 0);

        tracker.set_solved("u1", id, true).await.unwrap();
        assert_eq!(solved_today(&repository, "u1").await, 1);
    }

    #[tokio::test]
    async fn unsolving_an_unsolved_interaction_changes_nothing() {
        let (tracker, repository, _dir) = test_tracker().await;
        let id = seed_interaction(&repository, "u1").await;

        let outcome = tracker.set_solved("u1", id, false).await.unwrap();
        assert!(!outcome.solved);
        assert_eq!(solved_today(&repository, "u1").await, 0);
    }

    #[tokio::test]
    async fn reaction_overwrites_and_clears() {
        let (tracker, repository, _dir) = test_tracker().await;
        let id = seed_interaction(&repository, "u1").await;

        tracker
            .record_reaction("u1", id, Some(Reaction::Like))
            .await
            .unwrap();
        tracker
            .record_reaction("u1", id, Some(Reaction::Dislike))
            .await
            .unwrap();
        let (interaction, _) = repository
            .get_owned_interaction(id, "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(interaction.reaction, Some(Reaction::Dislike));

        tracker.record_reaction("u1", id, None).await.unwrap();
        let (interaction, _) = repository
            .get_owned_interaction(id, "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(interaction.reaction, None);
    }

    #[tokio::test]
    async fn mutations_against_foreign_interactions_are_not_found() {
        let (tracker, repository, _dir) = test_tracker().await;
        let id = seed_interaction(&repository, "owner").await;
        repository
            .ensure_profile(NewProfile {
                id: "intruder".to_string(),
                email: "intruder@example.com".to_string(),
                name: None,
                avatar_url: None,
            })
            .await
            .unwrap();

        let err = tracker
            .record_reaction("intruder", id, Some(Reaction::Like))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = tracker.set_solved("intruder", id, true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_interaction_is_not_found() {
        let (tracker, repository, _dir) = test_tracker().await;
        seed_interaction(&repository, "u1").await;

        let err = tracker.set_solved("u1", 9999, true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
