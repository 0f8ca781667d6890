//! Text normalization shared by answer generation and grading
//!
//! Acceptance is exact set membership, so answer generation and grading must
//! both go through these helpers.

use unicode_normalization::UnicodeNormalization;

/// The three grammatical-gender articles that mark a German noun.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Article {
    Der,
    Die,
    Das,
}

impl Article {
    pub const ALL: [Article; 3] = [Article::Der, Article::Die, Article::Das];

    pub fn as_str(self) -> &'static str {
        match self {
            Article::Der => "der",
            Article::Die => "die",
            Article::Das => "das",
        }
    }

    /// Recognizes an article regardless of case ("Der", "DAS", ...).
    pub fn parse(word: &str) -> Option<Article> {
        Article::ALL
            .into_iter()
            .find(|article| word.eq_ignore_ascii_case(article.as_str()))
    }
}

/// Trim and compose to NFC so that "ü" typed as `u + U+0308` matches the precomposed form.
pub fn clean(text: &str) -> String {
    text.trim().nfc().collect()
}

/// Case-folded form of [`clean`].
pub fn clean_folded(text: &str) -> String {
    clean(text).to_lowercase()
}

/// Splits `;`-separated alternatives, trimming each and dropping empty ones.
pub fn split_alternatives(text: &str) -> impl Iterator<Item = &str> {
    text.split(';').map(str::trim).filter(|part| !part.is_empty())
}

/// Removes every `(...)` annotation and collapses the whitespace around it.
///
/// An unmatched `(` is kept as-is.
pub fn strip_parentheticals(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        result.push_str(&rest[..open]);
        result.push(' ');
        rest = &rest[open + close + 1..];
    }
    result.push_str(rest);

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Regional spelling variant: "ß" written as "ss". Returns `None` when there is no "ß".
pub fn eszett_variant(text: &str) -> Option<String> {
    text.contains('ß').then(|| text.replace('ß', "ss"))
}

/// Splits a leading article (followed by whitespace) off `text`.
///
/// Returns the article exactly as written plus the remainder, or `None` when
/// `text` does not start with an article or nothing follows it.
pub fn split_article(text: &str) -> Option<(&str, &str)> {
    let (first, rest) = text.split_once(char::is_whitespace)?;
    Article::parse(first)?;
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }
    Some((first, rest))
}
