use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::ProblemWithInteraction;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
    /// Comma-separated problem ids already seen this session.
    pub exclude: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub problems: Vec<ProblemWithInteraction>,
}

pub async fn next_problems(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let limit = query.limit.unwrap_or(state.config.default_feed_limit);
    let exclude = parse_exclude(query.exclude.as_deref());

    let problems = state.feed.next_problems(&user.id, exclude, limit).await?;
    Ok(Json(FeedResponse { problems }))
}

/// Unparseable ids are dropped rather than failing the fetch.
fn parse_exclude(raw: Option<&str>) -> Vec<i64> {
    raw.map(|s| {
        s.split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_ids() {
        assert_eq!(parse_exclude(Some("1,2,3")), vec![1, 2, 3]);
    }

    #[test]
    fn drops_blank_and_malformed_entries() {
        assert_eq!(parse_exclude(Some("1,,abc, 4")), vec![1, 4]);
        assert_eq!(parse_exclude(Some("")), Vec::<i64>::new());
        assert_eq!(parse_exclude(None), Vec::<i64>::new());
    }
}
