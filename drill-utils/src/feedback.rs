use crate::GradeResult;
use crate::text_cleanup::{Article, clean, split_article};

/// What to tell the learner about one graded answer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Feedback {
    Correct,
    ShowAnswer {
        display_answer: String,
    },
    WrongArticle {
        correct_article: String,
        your_article: String,
        noun: String,
    },
    MissingArticle {
        correct_article: String,
    },
}

impl Feedback {
    pub fn new(result: GradeResult, display_answer: &str, raw_input: &str) -> Self {
        match result {
            GradeResult::PerfectMatch => Feedback::Correct,
            GradeResult::NoMatch => Feedback::ShowAnswer {
                display_answer: display_answer.to_string(),
            },
            GradeResult::PartialMatchWrongArticle => {
                let input = clean(raw_input);
                let (your_article, noun) = split_article(&input).unwrap_or(("", input.as_str()));
                Feedback::WrongArticle {
                    correct_article: leading_article(display_answer),
                    your_article: your_article.to_string(),
                    noun: noun.to_string(),
                }
            }
            GradeResult::PartialMatchMissingArticle => Feedback::MissingArticle {
                correct_article: leading_article(display_answer),
            },
        }
    }
}

/// The article the display answer starts with, as written there.
fn leading_article(display_answer: &str) -> String {
    display_answer
        .split_whitespace()
        .next()
        .filter(|word| Article::parse(word).is_some())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_article_splits_the_input() {
        assert_eq!(
            Feedback::new(GradeResult::PartialMatchWrongArticle, "der Tisch", " die Tisch"),
            Feedback::WrongArticle {
                correct_article: "der".to_string(),
                your_article: "die".to_string(),
                noun: "Tisch".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_article_names_the_right_one() {
        assert_eq!(
            Feedback::new(GradeResult::PartialMatchMissingArticle, "Das Haus", "Haus"),
            Feedback::MissingArticle {
                correct_article: "Das".to_string()
            }
        );
    }

    #[test]
    fn test_no_match_shows_the_answer() {
        assert_eq!(
            Feedback::new(GradeResult::NoMatch, "der Tisch", "stuhl"),
            Feedback::ShowAnswer {
                display_answer: "der Tisch".to_string()
            }
        );
        assert_eq!(
            Feedback::new(GradeResult::PerfectMatch, "der Tisch", "der Tisch"),
            Feedback::Correct
        );
    }
}
