use drill_utils::{Direction, WordRecord};
use rand::Rng;

/// Picks the direction a word is quizzed in for a freshly built batch.
///
/// Easily-confused words (rival groups) and nouns whose article has been
/// missed before are always asked meaning→word, so the learner has to
/// produce the word and its article. Everything else is a coin flip.
pub fn select_direction(record: &WordRecord, rng: &mut impl Rng) -> Direction {
    if record.rival_group.is_some() {
        return Direction::MeaningToWord;
    }
    if record.is_noun() && record.article_wrong.unwrap_or(0) > 0 {
        return Direction::MeaningToWord;
    }
    if rng.random_bool(0.5) {
        Direction::WordToMeaning
    } else {
        Direction::MeaningToWord
    }
}
