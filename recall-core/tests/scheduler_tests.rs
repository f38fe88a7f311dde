use chrono::{Days, TimeZone, Timelike, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Europe::Berlin;
use proptest::prelude::*;
use recall_core::calendar::to_local;
use recall_core::{
    add_calendar_days, compute_next_review_in, EpochMillis, Quality, Question, ReviewState,
    Reviewable, VocabEntry, EF_DEFAULT, EF_MIN, INTERVAL_MAX, MS_PER_DAY,
};

const NOW: EpochMillis = 1_700_000_000_000;

#[test]
fn perfect_from_new() {
    let r = compute_next_review_in(&Utc, 5, 2.5, 1, 0, NOW).unwrap();
    assert_eq!(r.repetition, 1);
    assert_eq!(r.next_interval, 1);
    assert!((r.ease_factor - 2.6).abs() < 1e-9);
    assert_eq!(r.next_review_time, NOW + MS_PER_DAY);
}

#[test]
fn second_step_is_six_days() {
    let r = compute_next_review_in(&Utc, 5, 2.6, 1, 1, NOW).unwrap();
    assert_eq!(r.repetition, 2);
    assert_eq!(r.next_interval, 6);
    assert_eq!(r.next_review_time, NOW + 6 * MS_PER_DAY);
}

#[test]
fn steady_state_multiplies_by_new_ease() {
    let r = compute_next_review_in(&Utc, 5, 2.6, 6, 2, NOW).unwrap();
    assert_eq!(r.repetition, 3);
    // 6 * 2.7 = 16.2
    assert_eq!(r.next_interval, 16);
}

#[test]
fn lapse_restarts_schedule() {
    let r = compute_next_review_in(&Utc, 1, 2.6, 16, 3, NOW).unwrap();
    assert_eq!(r.repetition, 0);
    assert_eq!(r.next_interval, 1);
    assert!(r.ease_factor < 2.6);
    assert!(r.ease_factor >= EF_MIN);
}

#[test]
fn blackout_at_floor_stays_at_floor() {
    let r = compute_next_review_in(&Utc, 0, 1.3, 5, 2, NOW).unwrap();
    assert_eq!(r.ease_factor, EF_MIN);
    assert_eq!(r.repetition, 0);
    assert_eq!(r.next_interval, 1);
}

#[test]
fn perfect_streak_hits_cap() {
    let mut state = ReviewState::new();
    let mut now = NOW;
    let mut hit_cap_at = None;
    for n in 0..40 {
        let r = state.record_review_in(&Utc, Quality::Perfect, now).unwrap();
        assert!(r.next_interval <= INTERVAL_MAX);
        if r.next_interval == INTERVAL_MAX && hit_cap_at.is_none() {
            hit_cap_at = Some(n);
        }
        now = r.next_review_time;
    }
    assert!(hit_cap_at.is_some());
    assert_eq!(state.interval_days, INTERVAL_MAX);
    assert_eq!(state.repetition, 40);
}

#[test]
fn same_rule_for_vocabulary_and_questions() {
    let mut word = VocabEntry::new("hola", "hello");
    let mut question = Question::new(
        "Capital of France?",
        vec!["Lyon".into(), "Paris".into()],
        1,
    );
    assert!(question.is_correct(1));

    for q in [Quality::Perfect, Quality::CorrectHesitant, Quality::Perfect] {
        word.review_state_mut().record_review_in(&Utc, q, NOW).unwrap();
        question.review_state_mut().record_review_in(&Utc, q, NOW).unwrap();
    }
    assert_eq!(word.review_state(), question.review_state());
    assert!((word.review.ease_factor - (EF_DEFAULT + 0.2)).abs() < 1e-9);
}

#[test]
fn scheduling_across_dst_keeps_wall_clock() {
    // 2024-03-09 09:00 EST, one day before spring-forward.
    let start = New_York
        .with_ymd_and_hms(2024, 3, 9, 9, 0, 0)
        .single()
        .unwrap()
        .timestamp_millis();
    let r = compute_next_review_in(&New_York, 4, 2.5, 1, 0, start).unwrap();
    let due = to_local(r.next_review_time, &New_York).unwrap();
    assert_eq!(due.hour(), 9);
    assert_eq!(r.next_review_time - start, 23 * 3_600_000);
}

fn valid_input() -> impl Strategy<Value = (i32, f64, i32, i32)> {
    (0i32..=5, 1.3f64..5.0, 1i32..=INTERVAL_MAX * 2, 0i32..100)
}

proptest! {
    #[test]
    fn ease_never_below_floor((q, ef, iv, rep) in valid_input()) {
        let r = compute_next_review_in(&Utc, q, ef, iv, rep, NOW).unwrap();
        prop_assert!(r.ease_factor >= EF_MIN);
    }

    #[test]
    fn interval_stays_in_bounds((q, ef, iv, rep) in valid_input()) {
        let r = compute_next_review_in(&Utc, q, ef, iv, rep, NOW).unwrap();
        prop_assert!(r.next_interval >= 1 && r.next_interval <= INTERVAL_MAX);
    }

    #[test]
    fn lapse_always_resets((q, ef, iv, rep) in (0i32..3, 1.3f64..5.0, 1i32..2000, 0i32..100)) {
        let r = compute_next_review_in(&Utc, q, ef, iv, rep, NOW).unwrap();
        prop_assert_eq!(r.repetition, 0);
        prop_assert_eq!(r.next_interval, 1);
    }

    #[test]
    fn bootstrap_steps_are_fixed(q in 3i32..=5, ef in 1.3f64..5.0, iv in 1i32..2000) {
        let first = compute_next_review_in(&Utc, q, ef, iv, 0, NOW).unwrap();
        prop_assert_eq!(first.next_interval, 1);
        let second = compute_next_review_in(&Utc, q, ef, iv, 1, NOW).unwrap();
        prop_assert_eq!(second.next_interval, 6);
    }

    #[test]
    fn perfect_beats_blackout((_, ef, iv, rep) in valid_input()) {
        let best = compute_next_review_in(&Utc, 5, ef, iv, rep, NOW).unwrap();
        let worst = compute_next_review_in(&Utc, 0, ef, iv, rep, NOW).unwrap();
        prop_assert!(best.ease_factor > worst.ease_factor);
    }

    #[test]
    fn calendar_days_keep_hour_in_new_york(
        day in 0i64..730,
        hour in 0u32..24,
        add in 1i64..400,
    ) {
        let start = New_York.with_ymd_and_hms(2024, 1, 1, hour, 15, 0).single().unwrap();
        let start = add_calendar_days(start.timestamp_millis(), day, &New_York);
        let before = to_local(start, &New_York).unwrap();
        let after = to_local(add_calendar_days(start, add, &New_York), &New_York).unwrap();
        let target = before.naive_local() + Days::new(add as u64);
        // Wall-clock times inside a DST gap or overlap have no single answer.
        if before.hour() == hour && New_York.from_local_datetime(&target).single().is_some() {
            prop_assert_eq!(after.hour(), hour);
            prop_assert_eq!(after.minute(), 15);
            prop_assert_eq!((after.date_naive() - before.date_naive()).num_days(), add);
        }
    }

    #[test]
    fn calendar_days_keep_hour_in_berlin(day in 0i64..730, add in 1i64..400) {
        let start = Berlin.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().unwrap();
        let start = add_calendar_days(start.timestamp_millis(), day, &Berlin);
        let after = to_local(add_calendar_days(start, add, &Berlin), &Berlin).unwrap();
        prop_assert_eq!(after.hour(), 9);
        prop_assert_eq!(after.minute(), 0);
    }
}
