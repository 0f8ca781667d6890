//! # Daily mastery
//! Each word seen today gets a [`DailyProgressEntry`]. Correct answers push a
//! word towards the mastery goal; wrong answers make the day's target bigger
//! until the word is abandoned at the failure threshold. Once a word is done,
//! mastered or abandoned, it no longer moves the progress bar.
//!
//! State is scoped to one `(level, date)` pair and reduced from grading results
//! with [`DailyProgress::process_event`], the same way an event log is folded
//! into an app state.

use chrono::NaiveDate;
use drill_utils::{GradeResult, Level, SessionConfig, StatsPayload};
use serde::{Deserialize, Serialize};

use crate::store::{KeyValueStore, StoreError};

const PROGRESS_KEY_PREFIX: &str = "dailyProgress_";

pub fn progress_key(level: Level, date: NaiveDate) -> String {
    format!("{PROGRESS_KEY_PREFIX}{level}_{date}")
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgressEntry {
    pub consecutive_correct: u32,
    pub total_wrong: u32,
    /// Terminal for the day: set once, never cleared.
    pub is_done: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub id: String,
    pub result: GradeResult,
}

impl From<&StatsPayload> for ProgressEvent {
    fn from(payload: &StatsPayload) -> Self {
        Self {
            id: payload.id.clone(),
            result: payload.result,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub level: Level,
    pub date: NaiveDate,
    /// Mastered units so far.
    pub current: u32,
    /// Target number of units. Grows with mistakes, shrinks when a word is abandoned.
    pub total: u32,
    entries: im::OrdMap<String, DailyProgressEntry>,
}

impl DailyProgress {
    /// A fresh day. Returns `None` until the session configuration is known,
    /// so that a missing config can never masquerade as "0 of 0, all done".
    pub fn start(level: Level, date: NaiveDate, config: Option<&SessionConfig>) -> Option<Self> {
        let config = config?;
        Some(Self {
            level,
            date,
            current: 0,
            total: config
                .effective_word_count()
                .saturating_mul(config.mastery_goal),
            entries: im::OrdMap::new(),
        })
    }

    pub fn entry(&self, id: &str) -> Option<&DailyProgressEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DailyProgressEntry)> {
        self.entries.iter()
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.current as f64 / self.total as f64).clamp(0.0, 1.0)
    }

    pub fn process_event(mut self, event: &ProgressEvent, config: &SessionConfig) -> Self {
        let entry = self.entries.get(&event.id).copied().unwrap_or_default();
        if entry.is_done {
            return self;
        }

        let entry = if event.result.is_perfect() {
            self.current = self.current.saturating_add(1);
            let consecutive_correct = entry.consecutive_correct.saturating_add(1);
            DailyProgressEntry {
                consecutive_correct,
                is_done: consecutive_correct >= config.mastery_goal,
                ..entry
            }
        } else {
            // another repetition will be needed
            self.total = self.total.saturating_add(1);
            let total_wrong = entry.total_wrong.saturating_add(1);
            let abandoned = total_wrong >= config.failure_threshold;
            if abandoned {
                // release the units reserved for mastering this word
                self.total = self.total.saturating_sub(config.mastery_goal);
            }
            DailyProgressEntry {
                consecutive_correct: 0,
                total_wrong,
                is_done: abandoned,
            }
        };

        self.entries.insert(event.id.clone(), entry);
        self
    }

    /// Folds one submission's results in prompt order.
    pub fn apply_results(self, payload: &[StatsPayload], config: &SessionConfig) -> Self {
        payload.iter().fold(self, |progress, item| {
            progress.process_event(&ProgressEvent::from(item), config)
        })
    }

    /// Today's saved progress for `level`, or a fresh start when there is none.
    pub fn load_or_start(
        store: &impl KeyValueStore,
        level: Level,
        date: NaiveDate,
        config: Option<&SessionConfig>,
    ) -> Result<Option<Self>, StoreError> {
        let saved = store
            .get_json::<DailyProgress>(&progress_key(level, date))
            .inspect_err(|e| log::error!("Failed to load daily progress for {level}: {e:?}"))?;
        match saved {
            Some(saved) if saved.level == level && saved.date == date => Ok(Some(saved)),
            Some(_) => {
                log::warn!("Daily progress stored under the wrong key for {level} {date}, ignoring it");
                Ok(Self::start(level, date, config))
            }
            None => Ok(Self::start(level, date, config)),
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), StoreError> {
        store.set_json(&progress_key(self.level, self.date), self)
    }
}
