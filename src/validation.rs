use thiserror::Error;

pub const STORY_MAX_CHARS: usize = 4000;
pub const FEELING_MAX_CHARS: usize = 100;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("story is required")]
    StoryRequired,

    #[error("story is too long (max 4000 chars)")]
    StoryTooLong,

    #[error("feeling is required")]
    FeelingRequired,

    #[error("feeling is too long (max 100 chars)")]
    FeelingTooLong,
}

/// Check a submission. Inputs are expected to be trimmed already;
/// story is checked before feeling and the first violation wins.
pub fn validate_post(story: &str, feeling: &str) -> Result<(), ValidationError> {
    if story.is_empty() {
        return Err(ValidationError::StoryRequired);
    }
    if story.chars().count() > STORY_MAX_CHARS {
        return Err(ValidationError::StoryTooLong);
    }
    if feeling.is_empty() {
        return Err(ValidationError::FeelingRequired);
    }
    if feeling.chars().count() > FEELING_MAX_CHARS {
        return Err(ValidationError::FeelingTooLong);
    }
    Ok(())
}
