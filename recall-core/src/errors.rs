use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("storage error: {0}")]
    Storage(&'static str),

    #[error("invalid input: quality {0} is outside 0..=5")]
    InvalidQuality(i32),
    #[error("invalid input: ease factor {0} is below the 1.3 floor")]
    InvalidEaseFactor(f64),
    #[error("invalid input: interval {0} must be at least 1 day")]
    InvalidInterval(i32),
    #[error("invalid input: repetition {0} must not be negative")]
    InvalidRepetition(i32),
}

impl CoreError {
    /// True for caller-side contract violations, as opposed to storage failures.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidQuality(_)
                | CoreError::InvalidEaseFactor(_)
                | CoreError::InvalidInterval(_)
                | CoreError::InvalidRepetition(_)
        )
    }
}
