use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::db::Repository;
use crate::error::Result;
use crate::models::{new_visible_id, ProblemWithInteraction, StatEvent};
use crate::stats::StatsService;

use super::policy::SelectionPolicy;

/// Hard ceiling on a single feed fetch, whatever the client asks for.
pub const MAX_FEED_LIMIT: usize = 20;

/// Serves the next batch of unseen published problems for a user, lazily
/// creating the interaction row the first time each problem is handed out.
#[derive(Clone)]
pub struct FeedSelector {
    repository: Repository,
    stats: StatsService,
    policy: Arc<dyn SelectionPolicy>,
}

impl FeedSelector {
    pub fn new(
        repository: Repository,
        stats: StatsService,
        policy: Arc<dyn SelectionPolicy>,
    ) -> Self {
        Self {
            repository,
            stats,
            policy,
        }
    }

    /// An empty result means the exclude set covers every published problem:
    /// the feed is exhausted, which is a terminal signal rather than an
    /// error.
    pub async fn next_problems(
        &self,
        user_id: &str,
        exclude: Vec<i64>,
        limit: usize,
    ) -> Result<Vec<ProblemWithInteraction>> {
        let limit = limit.clamp(1, MAX_FEED_LIMIT);

        let candidates = self.repository.list_unseen_published_ids(exclude).await?;
        let picked = self.policy.pick(&candidates, limit);
        if picked.is_empty() {
            return Ok(Vec::new());
        }

        let problems = self.repository.get_published_by_ids(picked.clone()).await?;
        let mut by_id: HashMap<i64, _> = problems.into_iter().map(|p| (p.id, p)).collect();

        // Serve in the order the policy picked, not database order.
        let mut result = Vec::with_capacity(by_id.len());
        for id in picked {
            let Some(problem) = by_id.remove(&id) else {
                continue;
            };

            let (interaction, created) = self
                .repository
                .ensure_interaction(user_id, problem.id, new_visible_id(), Utc::now())
                .await?;

            if created {
                // Best-effort: a failed counter update must not fail the feed.
                if let Err(e) = self.stats.record(user_id, StatEvent::Attempted).await {
                    tracing::warn!("Failed to update daily stats for {}: {}", user_id, e);
                }
            }

            result.push(ProblemWithInteraction::new(problem, interaction));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentBlock, Effect, NewProblem, NewProfile};
    use std::collections::HashSet;

    async fn test_selector() -> (FeedSelector, Repository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repository = Repository::new(path.to_str().unwrap()).await.unwrap();
        let stats = StatsService::new(repository.clone());
        let selector = FeedSelector::new(
            repository.clone(),
            stats,
            Arc::new(super::super::policy::RandomPolicy),
        );
        (selector, repository, dir)
    }

    async fn seed_user(repository: &Repository, id: &str) {
        repository
            .ensure_profile(NewProfile {
                id: id.to_string(),
                email: format!("{id}@example.com"),
                name: Some(id.to_string()),
                avatar_url: None,
            })
            .await
            .unwrap();
    }

    async fn seed_problem(repository: &Repository, title: &str, published: bool) -> i64 {
        repository
            .insert_problem(
                NewProblem {
                    title: title.to_string(),
                    question_blocks: vec![ContentBlock::Markdown("Q?".to_string())],
                    answer_blocks: vec![ContentBlock::Markdown("A.".to_string())],
                    background_video_url: None,
                    background_music_url: None,
                    effect: Effect::None,
                    is_published: published,
                },
                None,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn serves_whole_catalog_when_request_exceeds_it() {
        let (selector, repository, _dir) = test_selector().await;
        seed_user(&repository, "u1").await;
        for i in 0..3 {
            seed_problem(&repository, &format!("p{i}"), true).await;
        }

        let batch = selector.next_problems("u1", Vec::new(), 5).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|p| !p.solved));
        assert!(batch.iter().all(|p| p.interaction_id > 0));
        assert!(batch.iter().all(|p| !p.visible_id.is_empty()));
    }

    #[tokio::test]
    async fn unpublished_problems_never_appear() {
        let (selector, repository, _dir) = test_selector().await;
        seed_user(&repository, "u1").await;
        let published = seed_problem(&repository, "live", true).await;
        seed_problem(&repository, "draft", false).await;

        let batch = selector.next_problems("u1", Vec::new(), 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, published);
    }

    #[tokio::test]
    async fn accumulating_excludes_never_repeats_and_terminates_empty() {
        let (selector, repository, _dir) = test_selector().await;
        seed_user(&repository, "u1").await;
        for i in 0..6 {
            seed_problem(&repository, &format!("p{i}"), true).await;
        }

        let mut seen = HashSet::new();
        let mut exclude = Vec::new();
        loop {
            let batch = selector
                .next_problems("u1", exclude.clone(), 2)
                .await
                .unwrap();
            if batch.is_empty() {
                break;
            }
            for p in &batch {
                assert!(seen.insert(p.id), "problem {} served twice", p.id);
                exclude.push(p.id);
            }
        }
        assert_eq!(seen.len(), 6);

        // Exhausted feed stays empty, not an error.
        let batch = selector.next_problems("u1", exclude, 2).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn re_serving_a_problem_reuses_the_interaction() {
        let (selector, repository, _dir) = test_selector().await;
        seed_user(&repository, "u1").await;
        seed_problem(&repository, "p", true).await;

        let first = selector.next_problems("u1", Vec::new(), 1).await.unwrap();
        let second = selector.next_problems("u1", Vec::new(), 1).await.unwrap();
        assert_eq!(first[0].interaction_id, second[0].interaction_id);
        assert_eq!(first[0].visible_id, second[0].visible_id);
    }

    #[tokio::test]
    async fn first_serve_counts_as_attempted_today() {
        let (selector, repository, _dir) = test_selector().await;
        seed_user(&repository, "u1").await;
        seed_problem(&repository, "p", true).await;

        selector.next_problems("u1", Vec::new(), 1).await.unwrap();
        // Re-serving the same problem must not count again.
        selector.next_problems("u1", Vec::new(), 1).await.unwrap();

        let today = repository
            .get_daily_stat("u1", Utc::now().date_naive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(today.problems_attempted, 1);
        assert_eq!(today.problems_solved, 0);
    }
}
