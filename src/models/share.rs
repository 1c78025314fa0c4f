use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interaction::Interaction;

/// Solving under this many seconds earns the bragging variant.
const FAST_SOLVE_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    SolvedFast,
    Solved,
    GaveUp,
    Unsolved,
}

impl ShareStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareStatus::SolvedFast => "solved_fast",
            ShareStatus::Solved => "solved",
            ShareStatus::GaveUp => "gave_up",
            ShareStatus::Unsolved => "unsolved",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "solved_fast" => ShareStatus::SolvedFast,
            "solved" => ShareStatus::Solved,
            "gave_up" => ShareStatus::GaveUp,
            _ => ShareStatus::Unsolved,
        }
    }

    /// Snapshot the outcome of an interaction at share time.
    pub fn for_interaction(interaction: &Interaction) -> Self {
        if interaction.solved {
            if interaction.time_spent_seconds < FAST_SOLVE_SECONDS {
                ShareStatus::SolvedFast
            } else {
                ShareStatus::Solved
            }
        } else {
            ShareStatus::Unsolved
        }
    }

    pub fn share_message(&self, problem_title: &str) -> String {
        match self {
            ShareStatus::SolvedFast | ShareStatus::Solved => format!(
                "I just solved \"{}\" on Tilt! Can you beat my time?",
                problem_title
            ),
            ShareStatus::GaveUp | ShareStatus::Unsolved => {
                "This problem on Tilt has me stumped! Think you can solve it?".to_string()
            }
        }
    }
}

/// Immutable snapshot row written at share time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub id: i64,
    pub share_code: String,
    pub interaction_id: i64,
    pub status: ShareStatus,
    pub share_message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewShare {
    pub share_code: String,
    pub interaction_id: i64,
    pub status: ShareStatus,
    pub share_message: String,
}

/// Public projection served to share links for social-preview rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareView {
    pub problem_title: String,
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
    pub solved: bool,
    pub time_spent_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn interaction(solved: bool, time_spent_seconds: i64) -> Interaction {
        Interaction {
            id: 1,
            visible_id: "abcDEF1234".to_string(),
            user_id: "user-1".to_string(),
            problem_id: 7,
            reaction: None,
            solved,
            started_at: Utc::now(),
            solved_at: solved.then(Utc::now),
            time_spent_seconds,
        }
    }

    #[test]
    fn fast_solve_is_detected() {
        let status = ShareStatus::for_interaction(&interaction(true, 42));
        assert_eq!(status, ShareStatus::SolvedFast);
    }

    #[test]
    fn slow_solve_is_plain_solved() {
        let status = ShareStatus::for_interaction(&interaction(true, 61));
        assert_eq!(status, ShareStatus::Solved);
    }

    #[test]
    fn unsolved_interaction_maps_to_unsolved() {
        let status = ShareStatus::for_interaction(&interaction(false, 0));
        assert_eq!(status, ShareStatus::Unsolved);
    }

    #[test]
    fn messages_mention_the_problem_when_solved() {
        let msg = ShareStatus::Solved.share_message("The Impossible Staircase");
        assert!(msg.contains("The Impossible Staircase"));
        let msg = ShareStatus::Unsolved.share_message("The Impossible Staircase");
        assert!(msg.contains("stumped"));
    }
}
