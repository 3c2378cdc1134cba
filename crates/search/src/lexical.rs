use planbot_protocol::{Document, MatchResult};

/// Default acceptance threshold for [`token_sort_ratio`] matches.
pub const DEFAULT_TOKEN_SORT_THRESHOLD: f64 = 50.0;

/// Lowercase, turn everything that is not alphanumeric into spaces, sort the
/// words and join them back with single spaces.
fn sorted_tokens(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Length of the longest common subsequence of two char sequences.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Indel similarity: `2 * lcs / (len_a + len_b)`, in `0.0..=1.0`.
fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Word-order-insensitive similarity on a 0-100 integer scale: the indel
/// ratio of the sorted token strings.
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (sorted_tokens(a), sorted_tokens(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    (indel_ratio(&a, &b) * 100.0).round()
}

/// Best [`token_sort_ratio`] of `text` against each document's topic.
///
/// Only a strictly higher score replaces the current best, so among equal
/// scores the earliest document wins.
pub fn match_topics(documents: &[Document], text: &str, threshold: f64) -> MatchResult {
    let mut best: Option<(&Document, f64)> = None;
    for document in documents {
        let confidence = token_sort_ratio(text, &document.topic);
        if confidence > best.map_or(0.0, |(_, c)| c) {
            best = Some((document, confidence));
        }
    }

    match best {
        Some((document, confidence)) => MatchResult {
            match_id: (confidence > threshold).then(|| document.id.clone()),
            confidence: Some(confidence),
            document: Some(document.clone()),
            ..MatchResult::default()
        },
        None => MatchResult {
            confidence: Some(0.0),
            ..MatchResult::default()
        },
    }
}
