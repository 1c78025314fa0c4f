use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One unit of problem content, rendered in sequence by the client.
///
/// Stored as serialized JSON (`[{"type": "markdown", "content": "..."}]`) in
/// the `problems` table and parsed back into this strict tagged form at the
/// storage boundary, so a `video`/`image` tag is never trusted without its
/// content actually being a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ContentBlock {
    Markdown(String),
    Video(String),
    Image(String),
}

impl ContentBlock {
    pub fn validate(&self) -> Result<()> {
        match self {
            ContentBlock::Markdown(_) => Ok(()),
            ContentBlock::Video(content) | ContentBlock::Image(content) => {
                url::Url::parse(content).map_err(|_| {
                    AppError::Validation(format!(
                        "Block content is not a valid URL: {}",
                        content
                    ))
                })?;
                Ok(())
            }
        }
    }
}

/// Parse a serialized block sequence, rejecting unknown tags and media
/// blocks whose content is not a URL.
pub fn parse_blocks(raw: &str) -> Result<Vec<ContentBlock>> {
    let blocks: Vec<ContentBlock> = serde_json::from_str(raw)?;
    validate_blocks(&blocks)?;
    Ok(blocks)
}

pub fn validate_blocks(blocks: &[ContentBlock]) -> Result<()> {
    for block in blocks {
        block.validate()?;
    }
    Ok(())
}

pub fn blocks_to_json(blocks: &[ContentBlock]) -> Result<String> {
    Ok(serde_json::to_string(blocks)?)
}

/// Visual treatment applied client-side while a problem is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    None,
    Jitter,
    Confetti,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Jitter => "jitter",
            Effect::Confetti => "confetti",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "jitter" => Effect::Jitter,
            "confetti" => Effect::Confetti,
            _ => Effect::None,
        }
    }
}
