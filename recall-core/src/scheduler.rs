use crate::calendar::add_calendar_days;
use crate::stage::derive_stage;
use crate::{
    CoreError, EpochMillis, Quality, ReviewState, EF_MIN, INTERVAL_INITIAL, INTERVAL_MAX,
    INTERVAL_SECOND_STEP, MS_PER_DAY, QUALITY_MAX,
};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewResult {
    pub next_interval: i32,
    pub ease_factor: f64,
    pub repetition: i32,
    pub next_review_time: EpochMillis,
}

fn validate(
    quality: i32,
    ease_factor: f64,
    interval_days: i32,
    repetition: i32,
) -> Result<Quality, CoreError> {
    if !(0..=QUALITY_MAX).contains(&quality) {
        return Err(CoreError::InvalidQuality(quality));
    }
    if !ease_factor.is_finite() || ease_factor < EF_MIN {
        return Err(CoreError::InvalidEaseFactor(ease_factor));
    }
    if interval_days < 1 {
        return Err(CoreError::InvalidInterval(interval_days));
    }
    if repetition < 0 {
        return Err(CoreError::InvalidRepetition(repetition));
    }
    Quality::try_from(quality)
}

fn next_ease(ease_factor: f64, quality: Quality) -> f64 {
    let miss = (QUALITY_MAX - quality.as_score()) as f64;
    let delta = 0.1 - miss * (0.08 + miss * 0.02);
    (ease_factor + delta).max(EF_MIN)
}

fn grow_interval(interval_days: i32, ease: f64) -> i32 {
    let raw = (interval_days as f64 * ease).round();
    raw.clamp(1.0, INTERVAL_MAX as f64) as i32
}

/// SM-2 update in the host's local time zone. See [`compute_next_review_in`].
pub fn compute_next_review(
    quality: i32,
    ease_factor: f64,
    interval_days: i32,
    repetition: i32,
    now: EpochMillis,
) -> Result<ReviewResult, CoreError> {
    compute_next_review_in(&Local, quality, ease_factor, interval_days, repetition, now)
}

/// SM-2 update: the new ease factor, repetition count and interval for a
/// review of `quality`, plus the next-due timestamp `next_interval` calendar
/// days after `now` in `tz`.
///
/// Out-of-contract input is rejected, never clamped. A lapse (quality below 3)
/// restarts the schedule but keeps the softened ease factor.
pub fn compute_next_review_in<Tz: TimeZone>(
    tz: &Tz,
    quality: i32,
    ease_factor: f64,
    interval_days: i32,
    repetition: i32,
    now: EpochMillis,
) -> Result<ReviewResult, CoreError> {
    let quality = validate(quality, ease_factor, interval_days, repetition).map_err(|e| {
        warn!(error = %e, "rejected review input");
        e
    })?;

    let new_ease = next_ease(ease_factor, quality);

    let (new_repetition, new_interval) = if quality.is_lapse() {
        (0, INTERVAL_INITIAL)
    } else if repetition == 0 {
        (1, INTERVAL_INITIAL)
    } else if repetition == 1 {
        (2, INTERVAL_SECOND_STEP)
    } else {
        (repetition + 1, grow_interval(interval_days, new_ease))
    };

    let next_review_time = add_calendar_days(now, i64::from(new_interval), tz);

    debug!(
        quality = quality.as_score(),
        ease = new_ease,
        interval = new_interval,
        repetition = new_repetition,
        "computed next review"
    );

    Ok(ReviewResult {
        next_interval: new_interval,
        ease_factor: new_ease,
        repetition: new_repetition,
        next_review_time,
    })
}

impl ReviewState {
    /// Computes the next schedule from this state and, only if that succeeds,
    /// writes it back along with counters, timestamps and the derived stage.
    pub fn record_review_in<Tz: TimeZone>(
        &mut self,
        tz: &Tz,
        quality: Quality,
        now: EpochMillis,
    ) -> Result<ReviewResult, CoreError> {
        let result = compute_next_review_in(
            tz,
            quality.as_score(),
            self.ease_factor,
            self.interval_days,
            self.repetition,
            now,
        )?;
        self.apply(&result, quality, now);
        Ok(result)
    }

    pub fn record_review(&mut self, quality: Quality, now: EpochMillis) -> Result<ReviewResult, CoreError> {
        self.record_review_in(&Local, quality, now)
    }

    fn apply(&mut self, result: &ReviewResult, quality: Quality, now: EpochMillis) {
        self.ease_factor = result.ease_factor;
        self.interval_days = result.next_interval;
        self.repetition = result.repetition;
        self.next_review_time = result.next_review_time;
        self.last_review_time = now;
        if self.first_learn_date == 0 {
            self.first_learn_date = now;
        }
        if quality.is_lapse() {
            self.wrong_count += 1;
        } else {
            self.correct_count += 1;
        }
        self.review_stage = derive_stage(self);
    }
}

/// Turns a raw attempt outcome into a quality score.
pub trait QualityPolicy {
    fn derive(&self, is_correct: bool, attempt_count: u32) -> Quality;
}

/// Perfect on the first attempt, hesitant on the second, difficult after
/// that; any incorrect outcome counts as wrong.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttemptPolicy;

impl QualityPolicy for AttemptPolicy {
    fn derive(&self, is_correct: bool, attempt_count: u32) -> Quality {
        if !is_correct {
            return Quality::Wrong;
        }
        match attempt_count {
            0 | 1 => Quality::Perfect,
            2 => Quality::CorrectHesitant,
            _ => Quality::CorrectDifficult,
        }
    }
}

pub fn derive_quality(is_correct: bool, attempt_count: u32) -> Quality {
    AttemptPolicy.derive(is_correct, attempt_count)
}

pub fn is_due(next_review_time: EpochMillis, now: EpochMillis) -> bool {
    now >= next_review_time
}

/// Whole days until due, rounded toward negative infinity; negative when overdue.
pub fn days_until_due(next_review_time: EpochMillis, now: EpochMillis) -> i64 {
    next_review_time.saturating_sub(now).div_euclid(MS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const NOW: EpochMillis = 1_700_000_000_000;

    #[test]
    fn rejects_out_of_contract_input() {
        let r = compute_next_review_in(&Utc, 6, 2.5, 1, 0, NOW);
        assert!(matches!(r, Err(CoreError::InvalidQuality(6))));
        let r = compute_next_review_in(&Utc, -1, 2.5, 1, 0, NOW);
        assert!(matches!(r, Err(CoreError::InvalidQuality(-1))));
        let r = compute_next_review_in(&Utc, 4, 1.29, 1, 0, NOW);
        assert!(matches!(r, Err(CoreError::InvalidEaseFactor(_))));
        let r = compute_next_review_in(&Utc, 4, f64::NAN, 1, 0, NOW);
        assert!(matches!(r, Err(CoreError::InvalidEaseFactor(_))));
        let r = compute_next_review_in(&Utc, 5, f64::INFINITY, 10, 3, NOW);
        assert!(matches!(r, Err(CoreError::InvalidEaseFactor(_))));
        let r = compute_next_review_in(&Utc, 4, 2.5, 0, 0, NOW);
        assert!(matches!(r, Err(CoreError::InvalidInterval(0))));
        let r = compute_next_review_in(&Utc, 4, 2.5, 1, -1, NOW);
        assert!(matches!(r, Err(CoreError::InvalidRepetition(-1))));
        assert!(r.unwrap_err().is_invalid_input());
    }

    #[test]
    fn ease_deltas_per_band() {
        let deltas: Vec<f64> = Quality::ALL
            .iter()
            .map(|q| next_ease(2.5, *q) - 2.5)
            .collect();
        let expected = [-0.8, -0.54, -0.32, -0.14, 0.0, 0.1];
        for (got, want) in deltas.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }

    #[test]
    fn failed_record_leaves_state_untouched() {
        let mut state = ReviewState::new();
        state.ease_factor = 1.0;
        let before = state.clone();
        assert!(state.record_review_in(&Utc, Quality::Perfect, NOW).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn record_review_updates_bookkeeping() {
        let mut state = ReviewState::new();
        state.record_review_in(&Utc, Quality::Perfect, NOW).unwrap();
        assert_eq!(state.first_learn_date, NOW);
        assert_eq!(state.last_review_time, NOW);
        assert_eq!(state.correct_count, 1);
        assert_eq!(state.review_stage, 2);
        assert_eq!(state.next_review_time, NOW + MS_PER_DAY);

        let later = NOW + MS_PER_DAY;
        state.record_review_in(&Utc, Quality::Wrong, later).unwrap();
        assert_eq!(state.first_learn_date, NOW);
        assert_eq!(state.last_review_time, later);
        assert_eq!(state.wrong_count, 1);
        assert_eq!(state.repetition, 0);
        assert_eq!(state.review_stage, 1);
    }

    #[test]
    fn host_zone_variant_agrees_on_schedule() {
        let r = compute_next_review(5, 2.5, 1, 0, NOW).unwrap();
        assert_eq!((r.repetition, r.next_interval), (1, 1));
        assert!(r.next_review_time > NOW);

        let mut state = ReviewState::new();
        state.record_review(Quality::CorrectDifficult, NOW).unwrap();
        assert_eq!(state.repetition, 1);
        assert!((state.ease_factor - 2.36).abs() < 1e-9);
    }

    #[test]
    fn attempt_policy_bands() {
        assert_eq!(derive_quality(true, 0), Quality::Perfect);
        assert_eq!(derive_quality(true, 1), Quality::Perfect);
        assert_eq!(derive_quality(true, 2), Quality::CorrectHesitant);
        assert_eq!(derive_quality(true, 3), Quality::CorrectDifficult);
        assert_eq!(derive_quality(true, 9), Quality::CorrectDifficult);
        assert_eq!(derive_quality(false, 1), Quality::Wrong);
        assert_eq!(derive_quality(false, 4), Quality::Wrong);
    }

    #[test]
    fn due_checks() {
        assert!(is_due(NOW, NOW));
        assert!(!is_due(NOW, NOW - 1));
        assert_eq!(days_until_due(NOW + MS_PER_DAY, NOW), 1);
        assert_eq!(days_until_due(NOW + MS_PER_DAY - 1, NOW), 0);
        assert_eq!(days_until_due(NOW - 1, NOW), -1);
        assert_eq!(days_until_due(NOW - 3 * MS_PER_DAY, NOW), -3);
    }
}
