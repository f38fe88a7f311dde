//! Display-only progress classification over [`ReviewState`].
//!
//! Nothing here is read back by the scheduler.

use crate::ReviewState;
use serde::{Deserialize, Serialize};

pub const MAX_STAGE: u8 = 8;
/// Stages strictly above this count as mastered.
pub const MASTERY_STAGE: u8 = 5;

/// 0 never studied, 1 studied but no successful repetition yet, then one
/// stage per consecutive successful repetition up to [`MAX_STAGE`].
pub fn derive_stage(state: &ReviewState) -> u8 {
    if state.first_learn_date == 0 {
        return 0;
    }
    let reps = state.repetition.max(0);
    u8::try_from(reps.saturating_add(1))
        .unwrap_or(MAX_STAGE)
        .min(MAX_STAGE)
}

pub fn is_mastered(stage: u8) -> bool {
    stage > MASTERY_STAGE
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    New,
    Learning,
    Reviewing,
    Mastered,
}

impl MasteryLevel {
    pub fn from_stage(stage: u8) -> Self {
        match stage {
            0 => MasteryLevel::New,
            1 => MasteryLevel::Learning,
            s if is_mastered(s) => MasteryLevel::Mastered,
            _ => MasteryLevel::Reviewing,
        }
    }

    pub fn of(state: &ReviewState) -> Self {
        Self::from_stage(derive_stage(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn studied(repetition: i32) -> ReviewState {
        ReviewState {
            first_learn_date: 1,
            repetition,
            ..ReviewState::default()
        }
    }

    #[test]
    fn stages() {
        assert_eq!(derive_stage(&ReviewState::new()), 0);
        assert_eq!(derive_stage(&studied(0)), 1);
        assert_eq!(derive_stage(&studied(1)), 2);
        assert_eq!(derive_stage(&studied(4)), 5);
        assert_eq!(derive_stage(&studied(5)), 6);
        assert_eq!(derive_stage(&studied(40)), MAX_STAGE);
        assert_eq!(derive_stage(&studied(i32::MAX)), MAX_STAGE);
    }

    #[test]
    fn mastery_cutoff() {
        assert!(!is_mastered(5));
        assert!(is_mastered(6));
        assert_eq!(MasteryLevel::of(&ReviewState::new()), MasteryLevel::New);
        assert_eq!(MasteryLevel::of(&studied(0)), MasteryLevel::Learning);
        assert_eq!(MasteryLevel::of(&studied(4)), MasteryLevel::Reviewing);
        assert_eq!(MasteryLevel::of(&studied(5)), MasteryLevel::Mastered);
    }
}
