use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

pub type ItemId = Uuid;
pub type ReviewId = Uuid;

/// Unix epoch milliseconds.
pub type EpochMillis = i64;

pub const MS_PER_DAY: i64 = 86_400_000;

pub const EF_MIN: f64 = 1.3;
pub const EF_DEFAULT: f64 = 2.5;

pub const INTERVAL_INITIAL: i32 = 1;
pub const INTERVAL_SECOND_STEP: i32 = 6;
/// Three years. Keeps repeated perfect reviews from compounding without bound.
pub const INTERVAL_MAX: i32 = 1095;

pub const QUALITY_MAX: i32 = 5;
pub const LAPSE_THRESHOLD: i32 = 3;

/// Self-assessed recall quality, the six SM-2 bands.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i32", into = "i32")]
pub enum Quality {
    Blackout = 0,
    Wrong = 1,
    WrongButRecalled = 2,
    CorrectDifficult = 3,
    CorrectHesitant = 4,
    Perfect = 5,
}

impl Quality {
    pub const ALL: [Quality; 6] = [
        Quality::Blackout,
        Quality::Wrong,
        Quality::WrongButRecalled,
        Quality::CorrectDifficult,
        Quality::CorrectHesitant,
        Quality::Perfect,
    ];

    pub fn as_score(&self) -> i32 {
        *self as i32
    }

    pub fn is_lapse(&self) -> bool {
        self.as_score() < LAPSE_THRESHOLD
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Blackout => "blackout",
            Quality::Wrong => "wrong",
            Quality::WrongButRecalled => "wrong-but-recalled",
            Quality::CorrectDifficult => "correct-difficult",
            Quality::CorrectHesitant => "correct-hesitant",
            Quality::Perfect => "perfect",
        }
    }
}

impl TryFrom<i32> for Quality {
    type Error = CoreError;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Quality::Blackout),
            1 => Ok(Quality::Wrong),
            2 => Ok(Quality::WrongButRecalled),
            3 => Ok(Quality::CorrectDifficult),
            4 => Ok(Quality::CorrectHesitant),
            5 => Ok(Quality::Perfect),
            other => Err(CoreError::InvalidQuality(other)),
        }
    }
}

impl From<Quality> for i32 {
    fn from(q: Quality) -> i32 {
        q.as_score()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    New,
    Due,
    Overdue,
    Future,
}

/// Scheduling fields shared by every learnable item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetition: i32,
    pub next_review_time: EpochMillis,
    pub last_review_time: EpochMillis,
    /// 0 until the first review.
    pub first_learn_date: EpochMillis,
    pub review_stage: u8,
    pub correct_count: u32,
    pub wrong_count: u32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease_factor: EF_DEFAULT,
            interval_days: INTERVAL_INITIAL,
            repetition: 0,
            next_review_time: 0,
            last_review_time: 0,
            first_learn_date: 0,
            review_stage: 0,
            correct_count: 0,
            wrong_count: 0,
        }
    }
}

impl ReviewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self) -> bool {
        self.first_learn_date == 0
    }

    pub fn due_status(&self, now: EpochMillis) -> DueStatus {
        if self.is_new() {
            DueStatus::New
        } else if self.next_review_time > now {
            DueStatus::Future
        } else if now - self.next_review_time >= MS_PER_DAY {
            DueStatus::Overdue
        } else {
            DueStatus::Due
        }
    }

    /// Share of lifetime reviews answered at or above the lapse threshold.
    pub fn accuracy(&self) -> f64 {
        let total = self.correct_count + self.wrong_count;
        if total == 0 {
            0.0
        } else {
            self.correct_count as f64 / total as f64
        }
    }
}

/// Maps an item-specific type onto the generic scheduling fields.
pub trait Reviewable {
    fn review_state(&self) -> &ReviewState;
    fn review_state_mut(&mut self) -> &mut ReviewState;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Vocabulary,
    Question,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Vocabulary => "vocabulary",
            ItemKind::Question => "question",
        }
    }
}

/// What a store persists per item: identity plus scheduling state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    pub id: ItemId,
    pub kind: ItemKind,
    pub label: String,
    pub state: ReviewState,
    pub created_at: DateTime<Utc>,
}

impl ItemRecord {
    pub fn new(kind: ItemKind, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            state: ReviewState::new(),
            created_at: Utc::now(),
        }
    }
}

impl Reviewable for ItemRecord {
    fn review_state(&self) -> &ReviewState {
        &self.state
    }
    fn review_state_mut(&mut self) -> &mut ReviewState {
        &mut self.state
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VocabEntry {
    pub word: String,
    pub translation: String,
    pub example: Option<String>,
    pub review: ReviewState,
}

impl VocabEntry {
    pub fn new(word: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            translation: translation.into(),
            example: None,
            review: ReviewState::new(),
        }
    }
}

impl Reviewable for VocabEntry {
    fn review_state(&self) -> &ReviewState {
        &self.review
    }
    fn review_state_mut(&mut self) -> &mut ReviewState {
        &mut self.review
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    pub explanation: Option<String>,
    pub review: ReviewState,
}

impl Question {
    pub fn new(prompt: impl Into<String>, options: Vec<String>, answer_index: usize) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            answer_index,
            explanation: None,
            review: ReviewState::new(),
        }
    }

    pub fn is_correct(&self, chosen: usize) -> bool {
        chosen == self.answer_index
    }
}

impl Reviewable for Question {
    fn review_state(&self) -> &ReviewState {
        &self.review
    }
    fn review_state_mut(&mut self) -> &mut ReviewState {
        &mut self.review
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewLog {
    pub id: ReviewId,
    pub item_id: ItemId,
    pub quality: Quality,
    pub reviewed_at: EpochMillis,
    pub interval_applied: i32,
    pub ease_after: f64,
}

impl ReviewLog {
    pub fn new(
        item_id: ItemId,
        quality: Quality,
        reviewed_at: EpochMillis,
        interval_applied: i32,
        ease_after: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            quality,
            reviewed_at,
            interval_applied,
            ease_after,
        }
    }
}
