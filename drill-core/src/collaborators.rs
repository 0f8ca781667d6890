//! Boundaries to the services the drill engine depends on but does not own.

use std::collections::HashMap;

use chrono::NaiveDate;
use drill_utils::{Level, SessionConfig, StatsPayload, WordRecord, WordStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Word provider error: {0}")]
    Provider(String),

    #[error("Statistics service error: {0}")]
    Stats(String),

    #[error("Service unavailable")]
    Unavailable,
}

/// A batch of words to drill plus the day's targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchedBatch {
    #[serde(rename = "quiz_words")]
    pub records: Vec<WordRecord>,
    #[serde(rename = "session_info")]
    pub session_config: SessionConfig,
}

#[allow(async_fn_in_trait)]
pub trait WordProvider {
    async fn fetch_batch(&self, level: Level) -> Result<FetchedBatch, CollaboratorError>;
}

#[allow(async_fn_in_trait)]
pub trait StatsService {
    async fn fetch_stats(
        &self,
        ids: &[String],
        level: Level,
    ) -> Result<HashMap<String, WordStats>, CollaboratorError>;

    /// Reports one graded submission. Only an `Ok` counts as acknowledged.
    async fn post_results(
        &self,
        level: Level,
        payload: &[StatsPayload],
    ) -> Result<(), CollaboratorError>;
}

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Days roll over at UTC midnight.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}
