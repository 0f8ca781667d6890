//! Answer variants: every input string accepted as correct for a prompt.

use std::collections::BTreeSet;

use crate::text_cleanup::{
    clean, clean_folded, eszett_variant, split_alternatives, split_article, strip_parentheticals,
};
use crate::{Direction, WordRecord};

/// Builds the full set of accepted answers for `record` quizzed in `direction`.
///
/// A record missing the side being asked for yields an empty set, so every
/// answer to that prompt grades as [`crate::GradeResult::NoMatch`].
pub fn variants_for(direction: Direction, record: &WordRecord) -> BTreeSet<String> {
    let variants = match direction {
        Direction::WordToMeaning => meaning_variants(&record.meaning),
        Direction::MeaningToWord => written_form_variants(&record.word, record.is_noun()),
    };
    if variants.is_empty() {
        log::warn!(
            "Record {} has nothing to accept for {direction:?}; every answer will be wrong",
            record.id
        );
    }
    variants
}

/// Answers for word→meaning: any listed sense, with or without its parenthetical.
fn meaning_variants(meaning: &str) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();
    let meaning = clean_folded(meaning);
    if meaning.is_empty() {
        return variants;
    }

    insert_with_stripped(&mut variants, meaning.clone());

    let parts = split_alternatives(&meaning).collect::<Vec<_>>();
    if parts.len() > 1 {
        for part in parts {
            insert_with_stripped(&mut variants, part.to_string());
        }
    }
    variants
}

fn insert_with_stripped(variants: &mut BTreeSet<String>, sense: String) {
    let stripped = strip_parentheticals(&sense);
    if !stripped.is_empty() && stripped != sense {
        variants.insert(stripped);
    }
    variants.insert(sense);
}

/// Answers for meaning→word: each surface form, its ß→ss spelling, and for
/// articled forms the bare noun (used to detect article mistakes).
fn written_form_variants(word: &str, is_noun: bool) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();
    let word = clean(word);
    if word.is_empty() {
        return variants;
    }

    let mut base_answers = BTreeSet::from([word.as_str()]);
    let parts = split_alternatives(&word).collect::<Vec<_>>();
    if parts.len() > 1 {
        base_answers.extend(parts);
    }

    // Articles are case-sensitive markers on nouns, so nouns keep their case.
    let mut add = |variant: &str| {
        if is_noun {
            variants.insert(variant.to_string());
        } else {
            variants.insert(variant.to_lowercase());
        }
    };

    for answer in base_answers {
        add(answer);
        if let Some(regional) = eszett_variant(answer) {
            add(&regional);
        }
        if let Some((_, bare)) = split_article(answer) {
            add(bare);
            if let Some(regional) = eszett_variant(bare) {
                add(&regional);
            }
        }
    }
    variants
}
