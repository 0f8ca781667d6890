pub mod feedback;
pub mod grading;
pub mod hint;
pub mod text_cleanup;
pub mod variants;

pub use grading::grade;
pub use variants::variants_for;

/// Grammatical category of a dictionary entry, as labelled in the word datasets.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum WordType {
    Noun,
    Preposition,
    Verb,
    Adjective,
    Adverb,
    Other(String),
}

impl WordType {
    pub fn label(&self) -> &str {
        match self {
            WordType::Noun => "Nomen",
            WordType::Preposition => "Präposition",
            WordType::Verb => "Verb",
            WordType::Adjective => "Adjektiv",
            WordType::Adverb => "Adverb",
            WordType::Other(label) => label,
        }
    }

    pub fn is_noun(&self) -> bool {
        matches!(self, WordType::Noun)
    }
}

impl From<String> for WordType {
    fn from(label: String) -> Self {
        match label.trim() {
            "Nomen" => WordType::Noun,
            "Präposition" => WordType::Preposition,
            "Verb" => WordType::Verb,
            "Adjektiv" => WordType::Adjective,
            "Adverb" => WordType::Adverb,
            _ => WordType::Other(label),
        }
    }
}

impl From<WordType> for String {
    fn from(word_type: WordType) -> Self {
        word_type.label().to_string()
    }
}

impl serde::Serialize for WordType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> serde::Deserialize<'de> for WordType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(WordType::from)
    }
}

impl std::fmt::Display for WordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which side of a word/meaning pair is shown as the prompt.
#[derive(
    Copy,
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Show the written form, ask for a meaning.
    WordToMeaning,
    /// Show the meaning, ask for the written form (with article, for nouns).
    MeaningToWord,
}

/// Outcome of grading one answer.
#[derive(
    Copy,
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeResult {
    PerfectMatch,
    NoMatch,
    /// The noun was right but the learner wrote a different article.
    PartialMatchWrongArticle,
    /// The noun was right but the learner left the article out.
    PartialMatchMissingArticle,
}

impl GradeResult {
    pub fn is_perfect(self) -> bool {
        matches!(self, GradeResult::PerfectMatch)
    }
}

/// CEFR level a word list belongs to.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    tsify::Tsify,
    parse_display::Display,
    parse_display::FromStr,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
#[display(style = "lowercase")]
pub enum Level {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

/// A lexical entry as delivered by the word data provider. Read-only to the drill engine.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct WordRecord {
    #[serde(rename = "item_key")]
    pub id: String,
    /// Written form. May hold several `;`-separated surface forms, e.g. `"der Tisch; die Tische"`.
    pub word: String,
    /// Meaning gloss. May hold several `;`-separated senses.
    pub meaning: String,
    #[serde(rename = "type")]
    #[tsify(type = "string")]
    pub word_type: WordType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_wrong: Option<u32>,
    /// Example sentence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rival_group: Option<String>,
}

impl WordRecord {
    pub fn is_noun(&self) -> bool {
        self.word_type.is_noun()
    }
}

/// Per-word history kept by the statistics service.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct WordStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_wrong: Option<u32>,
    #[serde(default)]
    pub is_starred: bool,
}

/// Daily targets handed out alongside each batch.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SessionConfig {
    /// Consecutive correct answers that mark a word done for the day.
    pub mastery_goal: u32,
    /// Cumulative wrong answers after which a word is abandoned for the day.
    pub failure_threshold: u32,
    pub daily_word_limit: u32,
    pub total_words_in_level: u32,
}

impl SessionConfig {
    pub fn effective_word_count(&self) -> u32 {
        self.daily_word_limit.min(self.total_words_in_level)
    }
}

/// One graded answer, as reported to the statistics service.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    pub id: String,
    pub result: GradeResult,
    pub user_answer: String,
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_type_labels_round_trip_through_json() {
        let noun: WordType = serde_json::from_str("\"Nomen\"").unwrap();
        assert_eq!(noun, WordType::Noun);
        let prep: WordType = serde_json::from_str("\"Präposition\"").unwrap();
        assert_eq!(prep, WordType::Preposition);
        let other: WordType = serde_json::from_str("\"Konjunktion\"").unwrap();
        assert_eq!(other, WordType::Other("Konjunktion".to_string()));
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"Konjunktion\"");
    }

    #[test]
    fn test_word_record_uses_dataset_field_names() {
        let record: WordRecord = serde_json::from_str(
            r#"{"item_key": "tisch_1", "word": "der Tisch", "meaning": "table", "type": "Nomen"}"#,
        )
        .unwrap();
        assert_eq!(record.id, "tisch_1");
        assert!(record.is_noun());
        assert_eq!(record.article_wrong, None);
        assert_eq!(record.rival_group, None);
    }

    #[test]
    fn test_wire_tags() {
        assert_eq!(
            serde_json::to_string(&Direction::MeaningToWord).unwrap(),
            "\"meaningToWord\""
        );
        assert_eq!(
            serde_json::to_string(&GradeResult::PartialMatchMissingArticle).unwrap(),
            "\"PARTIAL_MATCH_MISSING_ARTICLE\""
        );
        assert_eq!(serde_json::to_string(&Level::B2).unwrap(), "\"b2\"");
        assert_eq!(Level::C1.to_string(), "c1");
        assert_eq!("a2".parse::<Level>().unwrap(), Level::A2);
    }

    #[test]
    fn test_payload_field_names() {
        let payload = StatsPayload {
            id: "tisch_1".to_string(),
            result: GradeResult::PerfectMatch,
            user_answer: "der Tisch".to_string(),
            direction: Direction::MeaningToWord,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["userAnswer"], "der Tisch");
        assert_eq!(json["result"], "PERFECT_MATCH");
    }

    #[test]
    fn test_effective_word_count() {
        let config = SessionConfig {
            mastery_goal: 3,
            failure_threshold: 2,
            daily_word_limit: 20,
            total_words_in_level: 7,
        };
        assert_eq!(config.effective_word_count(), 7);
    }
}
