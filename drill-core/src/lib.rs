#![deny(clippy::string_slice)]

pub mod collaborators;
pub mod direction;
pub mod progress;
pub mod session;
pub mod snapshot;
pub mod store;
mod utils;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use drill_utils::feedback::Feedback;
use drill_utils::grading::normalize_answer;
use drill_utils::{Direction, GradeResult, StatsPayload, WordRecord, WordStats, grade, variants_for};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use collaborators::{Clock, CollaboratorError, FetchedBatch, StatsService, SystemClock, WordProvider};
pub use direction::select_direction;
pub use progress::{DailyProgress, DailyProgressEntry};
pub use session::{DrillSession, LoadOutcome, SessionError};
pub use snapshot::SessionSnapshot;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use utils::init_logging;

/// One question in a batch. The accepted variants are derived from the word
/// record and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct QuizPrompt {
    pub id: String,
    pub direction: Direction,
    /// The side shown to the learner.
    pub question: String,
    /// The other side, shown as the correction.
    pub display_answer: String,
    #[serde(skip)]
    pub variants: BTreeSet<String>,
    pub is_noun: bool,
    pub article_wrong: u32,
    pub is_starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rival_group: Option<String>,
}

impl QuizPrompt {
    pub fn new(record: &WordRecord, direction: Direction, is_starred: bool) -> Self {
        let (question, display_answer) = match direction {
            Direction::WordToMeaning => (&record.word, &record.meaning),
            Direction::MeaningToWord => (&record.meaning, &record.word),
        };
        Self {
            id: record.id.clone(),
            direction,
            question: question.clone(),
            display_answer: display_answer.clone(),
            variants: variants_for(direction, record),
            is_noun: record.is_noun(),
            article_wrong: record.article_wrong.unwrap_or(0),
            is_starred,
            rival_group: record.rival_group.clone(),
        }
    }

    /// Nouns asked meaning→word are graded on the article as well as the noun.
    pub fn is_noun_test(&self) -> bool {
        self.is_noun && self.direction == Direction::MeaningToWord
    }

    pub fn grade(&self, raw_input: &str) -> GradeResult {
        grade(self.direction, raw_input, &self.variants, self.is_noun_test())
    }

    pub fn feedback(&self, result: GradeResult, raw_input: &str) -> Feedback {
        Feedback::new(result, &self.display_answer, raw_input)
    }
}

/// A record with the statistics service's article history folded in.
fn with_stats(record: &WordRecord, stats: Option<&WordStats>) -> WordRecord {
    let mut record = record.clone();
    if let Some(article_wrong) = stats.and_then(|stats| stats.article_wrong) {
        record.article_wrong = Some(article_wrong);
    }
    record
}

/// Builds a fresh batch, choosing each prompt's direction once.
pub fn build_batch(
    records: &[WordRecord],
    stats: &HashMap<String, WordStats>,
    rng: &mut impl Rng,
) -> Vec<QuizPrompt> {
    records
        .iter()
        .map(|record| {
            let word_stats = stats.get(&record.id);
            let record = with_stats(record, word_stats);
            let direction = select_direction(&record, &mut *rng);
            QuizPrompt::new(
                &record,
                direction,
                word_stats.is_some_and(|stats| stats.is_starred),
            )
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GradedBatch {
    pub results: BTreeMap<String, GradeResult>,
    /// What the statistics service is told, in prompt order.
    pub payload: Vec<StatsPayload>,
}

/// Grades every prompt; a prompt with no input counts as an empty answer.
pub fn grade_batch(prompts: &[QuizPrompt], raw_inputs: &BTreeMap<String, String>) -> GradedBatch {
    let mut graded = GradedBatch::default();
    for prompt in prompts {
        let raw_input = raw_inputs.get(&prompt.id).map(String::as_str).unwrap_or("");
        let result = prompt.grade(raw_input);
        graded.results.insert(prompt.id.clone(), result);
        graded.payload.push(StatsPayload {
            id: prompt.id.clone(),
            result,
            user_answer: normalize_answer(prompt.direction, raw_input, prompt.is_noun_test()),
            direction: prompt.direction,
        });
    }
    graded
}

#[cfg(test)]
pub(crate) mod test_utils {
    use drill_utils::{WordRecord, WordType};

    pub fn record(id: &str, word: &str, meaning: &str, word_type: WordType) -> WordRecord {
        WordRecord {
            id: id.to_string(),
            word: word.to_string(),
            meaning: meaning.to_string(),
            word_type,
            article_wrong: None,
            context: None,
            register: None,
            rival_group: None,
        }
    }

    pub fn tisch() -> WordRecord {
        record("tisch", "der Tisch", "table", WordType::Noun)
    }

    pub fn gross() -> WordRecord {
        record("gross", "groß", "big; large (size)", WordType::Adjective)
    }
}
