use planbot_protocol::{Flag, Options};
use regex::Regex;

use crate::error::{Result, TextError};

/// Finds the summon keyword in a message and pulls out the request after it.
#[derive(Debug, Clone)]
pub struct TriggerExtractor {
    trigger_word: String,
    presence: Regex,
    span: Regex,
}

impl TriggerExtractor {
    pub fn new(trigger_word: &str) -> Result<Self> {
        let trigger_word = trigger_word.trim();
        if trigger_word.is_empty() {
            return Err(TextError::EmptyTrigger);
        }
        let escaped = regex::escape(trigger_word);
        let presence = Regex::new(&format!("(?i){escaped}"))?;
        // At least one separator that is neither a word char nor '-', so
        // "!bot,--flag" keeps the flag; the span stops at the first
        // terminator or newline.
        let span = Regex::new(&format!(r"(?i){escaped}[^-\w]+([^!?.\n]*[!?.]?)"))?;
        Ok(Self {
            trigger_word: trigger_word.to_string(),
            presence,
            span,
        })
    }

    #[must_use]
    pub fn trigger_word(&self) -> &str {
        &self.trigger_word
    }

    /// Case-insensitive presence test over the full message.
    #[must_use]
    pub fn contains_trigger(&self, text: &str) -> bool {
        self.presence.is_match(text)
    }

    /// Span after the last trigger occurrence, up to and including the next
    /// `!`, `?` or `.`, or to the end of the line. Empty when absent.
    #[must_use]
    pub fn extract_span(&self, text: &str) -> String {
        self.span
            .captures_iter(text)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

/// One-shot form of [`TriggerExtractor::extract_span`].
pub fn extract_trigger_span(text: &str, trigger_word: &str) -> Result<String> {
    Ok(TriggerExtractor::new(trigger_word)?.extract_span(text))
}

/// Split recognized flags out of `text`.
///
/// Returns the remaining words in their original order and the set of flags
/// seen. Flag-shaped tokens that are not a known alias are dropped silently.
#[must_use]
pub fn extract_flags(text: &str) -> (String, Options) {
    let mut options = Options::new();
    let mut rest = Vec::new();

    for token in text.split_whitespace() {
        if is_flag_shaped(token) {
            if let Some(flag) = Flag::from_alias(token) {
                options.insert(flag);
            } else {
                log::debug!("Dropping unknown flag {token:?}");
            }
            continue;
        }
        rest.push(token);
    }

    (rest.join(" "), options)
}

fn is_flag_shaped(token: &str) -> bool {
    token.starts_with('-')
        && token
            .trim_start_matches('-')
            .chars()
            .next()
            .is_some_and(char::is_alphabetic)
}
