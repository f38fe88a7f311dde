use crate::calendar::local_date;
use crate::stage::MasteryLevel;
use crate::{ItemRecord, Quality, ReviewLog};
use chrono::{Days, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct Totals {
    pub total: u32,
    /// Indexed by quality score.
    pub by_quality: [u32; 6],
}

impl Totals {
    pub fn record(&mut self, q: Quality) {
        self.total += 1;
        self.by_quality[q.as_score() as usize] += 1;
    }

    pub fn lapses(&self) -> u32 {
        self.by_quality[..3].iter().sum()
    }

    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.total - self.lapses()) as f32 / self.total as f32
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct StatsSummary {
    pub totals: Totals,
    pub per_day: BTreeMap<NaiveDate, Totals>,
}

/// Review totals overall and per local calendar day in `tz`.
pub fn summarize<Tz: TimeZone>(logs: &[ReviewLog], tz: &Tz) -> StatsSummary {
    let mut summary = StatsSummary::default();
    for r in logs {
        summary.totals.record(r.quality);
        if let Some(d) = local_date(r.reviewed_at, tz) {
            summary.per_day.entry(d).or_default().record(r.quality);
        }
    }
    summary
}

/// Consecutive days, ending at `today`, with at least one review.
pub fn daily_streak<Tz: TimeZone>(logs: &[ReviewLog], today: NaiveDate, tz: &Tz) -> u32 {
    let per_day = summarize(logs, tz).per_day;
    let mut streak = 0u32;
    let mut day = today;
    while per_day.get(&day).map(|t| t.total > 0).unwrap_or(false) {
        streak += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct MasterySummary {
    pub items: u32,
    pub new: u32,
    pub learning: u32,
    pub reviewing: u32,
    pub mastered: u32,
    pub correct: u32,
    pub wrong: u32,
}

impl MasterySummary {
    pub fn mastered_share(&self) -> f64 {
        if self.items == 0 {
            0.0
        } else {
            self.mastered as f64 / self.items as f64
        }
    }
}

pub fn mastery_summary(items: &[ItemRecord]) -> MasterySummary {
    let mut s = MasterySummary::default();
    for item in items {
        s.items += 1;
        match MasteryLevel::of(&item.state) {
            MasteryLevel::New => s.new += 1,
            MasteryLevel::Learning => s.learning += 1,
            MasteryLevel::Reviewing => s.reviewing += 1,
            MasteryLevel::Mastered => s.mastered += 1,
        }
        s.correct += item.state.correct_count;
        s.wrong += item.state.wrong_count;
    }
    s
}
