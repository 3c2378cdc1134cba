use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

use crate::stopwords::{is_generic_stopword, DEFAULT_DOMAIN_STOPWORDS};

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[[:punct:]\p{P}]+").expect("static punctuation pattern"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("static digit pattern"));
static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Tokens shorter than this many graphemes carry no topic signal.
pub const MIN_TOKEN_LEN: usize = 3;

/// One string-to-string step of the preprocessing pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Transliterate to ASCII ("café" -> "cafe", "’" -> "'")
    FoldAccents,
    Lowercase,
    /// Punctuation runs, ASCII or Unicode, become a single space
    StripPunctuation,
    CollapseWhitespace,
    StripNumeric,
    GenericStopwords,
    DomainStopwords(Arc<BTreeSet<String>>),
    StripShort(usize),
    Stem,
}

impl Filter {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::FoldAccents => deunicode::deunicode(text),
            Self::Lowercase => text.to_lowercase(),
            Self::StripPunctuation => PUNCTUATION.replace_all(text, " ").into_owned(),
            Self::CollapseWhitespace => WHITESPACE.replace_all(text, " ").into_owned(),
            Self::StripNumeric => DIGITS.replace_all(text, "").into_owned(),
            Self::GenericStopwords => join_words(text, |w| !is_generic_stopword(w)),
            Self::DomainStopwords(words) => {
                join_words(text, |w| !words.contains(&w.to_lowercase()))
            }
            Self::StripShort(min) => join_words(text, |w| w.graphemes(true).count() >= *min),
            Self::Stem => text
                .split_whitespace()
                .map(|w| STEMMER.stem(&w.to_lowercase()).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn join_words(text: &str, keep: impl Fn(&str) -> bool) -> String {
    text.split_whitespace()
        .filter(|w| keep(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deterministic text -> token pipeline used for both model training and
/// query scoring. Training and querying must use the same preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessor {
    filters: Vec<Filter>,
    bigrams: bool,
}

impl Preprocessor {
    /// The nine-step baseline with the default domain stopwords.
    #[must_use]
    pub fn baseline() -> Self {
        Self::baseline_with_stopwords(DEFAULT_DOMAIN_STOPWORDS.iter().copied())
    }

    pub fn baseline_with_stopwords<I, S>(domain_stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domain: BTreeSet<String> = domain_stopwords
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        Self {
            filters: vec![
                Filter::FoldAccents,
                Filter::Lowercase,
                Filter::StripPunctuation,
                Filter::CollapseWhitespace,
                Filter::StripNumeric,
                Filter::GenericStopwords,
                Filter::DomainStopwords(Arc::new(domain)),
                Filter::StripShort(MIN_TOKEN_LEN),
                Filter::Stem,
            ],
            bigrams: false,
        }
    }

    /// Baseline followed by every adjacent-token bigram.
    #[must_use]
    pub fn with_bigrams() -> Self {
        Self::baseline().bigrams()
    }

    /// Append bigrams of the stemmed output.
    #[must_use]
    pub fn bigrams(mut self) -> Self {
        self.bigrams = true;
        self
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub fn emits_bigrams(&self) -> bool {
        self.bigrams
    }

    pub fn preprocess(&self, text: &str) -> Vec<String> {
        let processed = self
            .filters
            .iter()
            .fold(text.to_string(), |acc, filter| filter.apply(&acc));
        let mut tokens: Vec<String> = processed.split_whitespace().map(str::to_string).collect();
        if self.bigrams {
            let pairs = bigrams(&tokens);
            tokens.extend(pairs);
        }
        tokens
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::baseline()
    }
}

/// `["a", "b", "c"]` -> `["a b", "b c"]`
#[must_use]
pub fn bigrams(words: &[String]) -> Vec<String> {
    words
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn folds_accents_and_punctuation() {
        assert_eq!(Filter::FoldAccents.apply("café résumé"), "cafe resume");
        assert_eq!(Filter::StripPunctuation.apply("hi,there!!"), "hi there ");
        assert_eq!(Filter::CollapseWhitespace.apply("a \n\t b"), "a b");
        assert_eq!(Filter::StripNumeric.apply("21st century"), "st century");
    }

    #[test]
    fn curly_quotes_fold_like_straight_ones() {
        let pre = Preprocessor::baseline();
        let curly = pre.preprocess("What\u{2019}s Warren\u{2019}s plan for child care?");
        let straight = pre.preprocess("What's Warren's plan for child care?");
        assert_eq!(curly, straight);
        assert_eq!(curly, vec!["child", "care"]);
    }

    #[test]
    fn unicode_punctuation_is_stripped() {
        assert_eq!(
            Filter::StripPunctuation.apply("\u{201c}hi\u{201d}\u{2014}there"),
            " hi there"
        );
    }

    #[test]
    fn drops_stopwords_short_tokens_and_domain_names() {
        let tokens = Preprocessor::baseline().preprocess("Senator Warren, what is your plan on it?");
        assert!(tokens.is_empty(), "got {tokens:?}");
    }

    #[test]
    fn stems_topic_words() {
        let tokens = Preprocessor::baseline().preprocess("Breaking up big tech companies");
        assert_eq!(tokens, vec!["break", "big", "tech", "compani"]);
    }

    #[test]
    fn bigram_variant_appends_adjacent_pairs() {
        let tokens = Preprocessor::with_bigrams().preprocess("student debt cancellation");
        assert_eq!(
            tokens,
            vec!["student", "debt", "cancel", "student debt", "debt cancel"]
        );
    }

    #[test]
    fn single_token_has_no_bigrams() {
        assert!(bigrams(&["solo".to_string()]).is_empty());
        assert!(bigrams(&[]).is_empty());
    }

    #[test]
    fn custom_domain_stopwords_are_case_insensitive() {
        let pre = Preprocessor::baseline_with_stopwords(["Medicare"]);
        assert_eq!(pre.preprocess("medicare housing"), vec!["hous"]);
    }

    #[test]
    fn pipeline_is_deterministic() {
        let pre = Preprocessor::with_bigrams();
        let text = "Green New Deal & climate change, 2030!";
        assert_eq!(pre.preprocess(text), pre.preprocess(text));
    }
}
