use std::collections::BTreeSet;

use crate::text_cleanup::{clean, split_alternatives, split_article};
use crate::{Direction, GradeResult};

/// Whether answers to this prompt are compared with case preserved.
///
/// Only nouns asked meaning→word keep case: the article is part of the answer.
pub fn is_case_sensitive(direction: Direction, is_noun_test: bool) -> bool {
    is_noun_test && direction == Direction::MeaningToWord
}

/// The learner's answer as it is compared and reported: trimmed, NFC, and
/// case-folded unless the prompt is case-sensitive.
pub fn normalize_answer(direction: Direction, raw_input: &str, is_noun_test: bool) -> String {
    let answer = clean(raw_input);
    if is_case_sensitive(direction, is_noun_test) {
        answer
    } else {
        answer.to_lowercase()
    }
}

/// Classifies one raw answer against the accepted variants.
///
/// Any `;`-separated segment matching a variant is a perfect match. For noun
/// tests whose accepted answers carry an article, the segment must carry one
/// too: the bare nouns in the set only exist for partial-match detection.
/// A bare noun that matches after dropping the typed article is a partial
/// match: wrong article if one was typed, missing article otherwise.
pub fn grade(
    direction: Direction,
    raw_input: &str,
    variants: &BTreeSet<String>,
    is_noun_test: bool,
) -> GradeResult {
    let answer = normalize_answer(direction, raw_input, is_noun_test);
    let article_required =
        is_noun_test && variants.iter().any(|variant| split_article(variant).is_some());

    if split_alternatives(&answer).any(|part| {
        variants.contains(part) && (!article_required || split_article(part).is_some())
    }) {
        return GradeResult::PerfectMatch;
    }

    if is_noun_test {
        let (typed_article, noun) = match split_article(&answer) {
            Some((_, noun)) => (true, noun),
            None => (false, answer.as_str()),
        };
        if !noun.is_empty() && variants.contains(noun) {
            return if typed_article {
                GradeResult::PartialMatchWrongArticle
            } else {
                GradeResult::PartialMatchMissingArticle
            };
        }
    }

    GradeResult::NoMatch
}
