//! Persisting an in-progress batch so a reload picks up where the learner left off.
//!
//! Accepted answers are never written out. On restore they are derived again
//! from the stored word records, so a stale or edited snapshot cannot change
//! what counts as correct.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use drill_utils::{Direction, Level, SessionConfig, WordRecord, variants_for};
use serde::{Deserialize, Serialize};

use crate::QuizPrompt;
use crate::store::{KeyValueStore, StoreError};

const SESSION_KEY_PREFIX: &str = "vocabularyQuizSession_";

pub fn session_key(level: Level) -> String {
    format!("{SESSION_KEY_PREFIX}{level}")
}

/// A [`QuizPrompt`] without its accepted answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSkeleton {
    pub id: String,
    pub direction: Direction,
    pub question: String,
    pub display_answer: String,
    pub is_noun: bool,
    pub article_wrong: u32,
    pub is_starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rival_group: Option<String>,
}

impl From<&QuizPrompt> for PromptSkeleton {
    fn from(prompt: &QuizPrompt) -> Self {
        Self {
            id: prompt.id.clone(),
            direction: prompt.direction,
            question: prompt.question.clone(),
            display_answer: prompt.display_answer.clone(),
            is_noun: prompt.is_noun,
            article_wrong: prompt.article_wrong,
            is_starred: prompt.is_starred,
            rival_group: prompt.rival_group.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub date: NaiveDate,
    pub level: Level,
    pub prompts: Vec<PromptSkeleton>,
    /// The batch as fetched; the only source of accepted answers on restore.
    pub records: Vec<WordRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_config: Option<SessionConfig>,
    pub feedback: String,
    pub submitted: bool,
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

impl SessionSnapshot {
    /// Prompts with their accepted answers derived again from the stored records.
    ///
    /// The direction stays as persisted. A prompt whose record is missing gets
    /// no accepted answers at all.
    pub fn rehydrate(&self) -> Vec<QuizPrompt> {
        let records = self
            .records
            .iter()
            .map(|record| (record.id.as_str(), record))
            .collect::<HashMap<_, _>>();

        self.prompts
            .iter()
            .map(|skeleton| {
                let variants = match records.get(skeleton.id.as_str()) {
                    Some(record) => variants_for(skeleton.direction, record),
                    None => {
                        log::warn!("Snapshot has no word record for prompt {}", skeleton.id);
                        Default::default()
                    }
                };
                QuizPrompt {
                    id: skeleton.id.clone(),
                    direction: skeleton.direction,
                    question: skeleton.question.clone(),
                    display_answer: skeleton.display_answer.clone(),
                    variants,
                    is_noun: skeleton.is_noun,
                    article_wrong: skeleton.article_wrong,
                    is_starred: skeleton.is_starred,
                    rival_group: skeleton.rival_group.clone(),
                }
            })
            .collect()
    }
}

pub fn save(store: &mut impl KeyValueStore, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
    store.set_json(&session_key(snapshot.level), snapshot)?;
    log::debug!("Saved quiz for level {} to session", snapshot.level);
    Ok(())
}

/// Today's snapshot for `level`, if there is a usable one.
///
/// Anything stale (another day or level) or unreadable is removed and treated as absent.
pub fn restore(
    store: &mut impl KeyValueStore,
    level: Level,
    today: NaiveDate,
) -> Result<Option<SessionSnapshot>, StoreError> {
    let key = session_key(level);
    let snapshot = match store.get_json::<SessionSnapshot>(&key) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return Ok(None),
        Err(StoreError::Serde(e)) => {
            log::warn!("Failed to parse session data for level {level}: {e:?}");
            store.remove(&key)?;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if snapshot.date != today || snapshot.level != level {
        log::info!(
            "Discarding stale session from {} ({}) for level {level}",
            snapshot.date,
            snapshot.level
        );
        store.remove(&key)?;
        return Ok(None);
    }

    log::info!("Restoring quiz for level {level} from session.");
    Ok(Some(snapshot))
}

pub fn invalidate(store: &mut impl KeyValueStore, level: Level) -> Result<(), StoreError> {
    store.remove(&session_key(level))
}
