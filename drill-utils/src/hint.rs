use crate::{WordRecord, WordType};

/// Extra context shown on hover: register, category and, for nouns and
/// prepositions, an example sentence.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Hint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,
    pub word_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

pub fn hint_for(record: &WordRecord) -> Option<Hint> {
    let non_blank = |text: &Option<String>| {
        text.as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    };

    let register = non_blank(&record.register);
    let context = match record.word_type {
        WordType::Noun | WordType::Preposition => non_blank(&record.context),
        _ => None,
    };
    let word_type = record.word_type.label().trim().to_string();

    if register.is_none() && context.is_none() && word_type.is_empty() {
        return None;
    }
    Some(Hint {
        register,
        word_type,
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(word_type: WordType, context: Option<&str>, register: Option<&str>) -> WordRecord {
        WordRecord {
            id: "x".to_string(),
            word: "x".to_string(),
            meaning: "x".to_string(),
            word_type,
            article_wrong: None,
            context: context.map(str::to_string),
            register: register.map(str::to_string),
            rival_group: None,
        }
    }

    #[test]
    fn test_context_only_for_nouns_and_prepositions() {
        let verb = hint_for(&record(WordType::Verb, Some("Ich laufe."), None)).unwrap();
        assert_eq!(verb.context, None);
        assert_eq!(verb.word_type, "Verb");

        let prep = hint_for(&record(WordType::Preposition, Some("mit dir"), Some("formal")))
            .unwrap();
        assert_eq!(prep.context.as_deref(), Some("mit dir"));
        assert_eq!(prep.register.as_deref(), Some("formal"));
    }

    #[test]
    fn test_nothing_to_show() {
        assert_eq!(
            hint_for(&record(WordType::Other(String::new()), Some("ignored"), Some(" "))),
            None
        );
    }
}
