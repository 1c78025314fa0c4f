use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::{ContentBlock, Effect};
use super::interaction::{Interaction, Reaction};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: i64,
    pub title: String,
    pub question_blocks: Vec<ContentBlock>,
    pub answer_blocks: Vec<ContentBlock>,
    pub background_video_url: Option<String>,
    pub background_music_url: Option<String>,
    pub effect: Effect,
    pub is_published: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProblem {
    pub title: String,
    pub question_blocks: Vec<ContentBlock>,
    pub answer_blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub background_video_url: Option<String>,
    #[serde(default)]
    pub background_music_url: Option<String>,
    #[serde(default)]
    pub effect: Effect,
    #[serde(default)]
    pub is_published: bool,
}

/// Partial update for a problem. Absent fields are left unchanged; this is
/// the full set of editable fields, so arbitrary payload keys never reach
/// the storage layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemPatch {
    pub title: Option<String>,
    pub question_blocks: Option<Vec<ContentBlock>>,
    pub answer_blocks: Option<Vec<ContentBlock>>,
    pub background_video_url: Option<String>,
    pub background_music_url: Option<String>,
    pub effect: Option<Effect>,
    pub is_published: Option<bool>,
}

/// A problem combined with the requesting user's interaction state, as
/// served in the feed. Only content fields are exposed here; publication
/// and authorship metadata stay on the admin surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemWithInteraction {
    pub id: i64,
    pub title: String,
    pub question_blocks: Vec<ContentBlock>,
    pub answer_blocks: Vec<ContentBlock>,
    pub background_video_url: Option<String>,
    pub background_music_url: Option<String>,
    pub effect: Effect,
    pub interaction_id: i64,
    pub visible_id: String,
    pub reaction: Option<Reaction>,
    pub solved: bool,
    pub started_at: DateTime<Utc>,
}

impl ProblemWithInteraction {
    pub fn new(problem: Problem, interaction: Interaction) -> Self {
        Self {
            id: problem.id,
            title: problem.title,
            question_blocks: problem.question_blocks,
            answer_blocks: problem.answer_blocks,
            background_video_url: problem.background_video_url,
            background_music_url: problem.background_music_url,
            effect: problem.effect,
            interaction_id: interaction.id,
            visible_id: interaction.visible_id,
            reaction: interaction.reaction,
            solved: interaction.solved,
            started_at: interaction.started_at,
        }
    }
}
