//! Deterministic rules. Each returns an empty [`MatchResult`] when it does
//! not fire; none of them ever guesses.

use once_cell::sync::Lazy;
use planbot_protocol::{Document, Flag, MatchResult, Operation, Options, Verbatim};
use planbot_text::Preprocessor;
use regex::Regex;

pub const WHY_WARREN_VERBATIM: &str = "why_warren";
pub const BASIC_HELP_VERBATIM: &str = "basic_help";
pub const ADVANCED_HELP_VERBATIM: &str = "advanced_help";

static WHY_WARREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\Awhy warren\W*\z").expect("static why-warren pattern"));
static HELP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\A(advanced\s+)?help\W*\z").expect("static help pattern"));
static PLAN_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)show me the plans\W*$").expect("static plan-list pattern"));
static STATE_OF_RACE: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        r"(?im)state of (?:the )?(?:race|primary)\W*$",
        r"(?im)is the (?:race|primary) over\W*$",
        r"(?im)status check\W*$",
    ]
    .map(|pattern| Regex::new(pattern).expect("static state-of-race pattern"))
});

/// Scripted replies: "why warren" (or its flag), "help" and "advanced help".
/// Fires only when the chosen verbatim exists.
pub fn match_verbatim(verbatims: &[Verbatim], text: &str, options: &Options) -> MatchResult {
    let wanted = if options.contains(&Flag::WhyWarren) || WHY_WARREN.is_match(text) {
        Some(WHY_WARREN_VERBATIM)
    } else {
        HELP.captures(text).map(|caps| {
            if caps.get(1).is_some() {
                ADVANCED_HELP_VERBATIM
            } else {
                BASIC_HELP_VERBATIM
            }
        })
    };

    wanted
        .and_then(|id| verbatims.iter().find(|v| v.id == id))
        .map_or_else(MatchResult::none, |v| MatchResult::verbatim(v.clone()))
}

/// "... show me the plans" at the end of the span.
pub fn request_plan_list(text: &str) -> MatchResult {
    if PLAN_LIST.is_match(text) {
        MatchResult::operation(Operation::AllThePlans)
    } else {
        MatchResult::none()
    }
}

/// "state of the race", "is the primary over", "status check", or the flag.
pub fn request_state_of_race(text: &str, options: &Options) -> MatchResult {
    if options.contains(&Flag::StateOfRace) || STATE_OF_RACE.iter().any(|re| re.is_match(text)) {
        MatchResult::operation(Operation::StateOfRace)
    } else {
        MatchResult::none()
    }
}

/// Exact display-title match after preprocessing both sides, so
/// punctuation and stopwords may differ. Confidence is always 100.
pub fn match_display_title(
    documents: &[Document],
    text: &str,
    preprocessor: &Preprocessor,
) -> MatchResult {
    let query = preprocessor.preprocess(text);
    if query.is_empty() {
        return MatchResult::none();
    }
    documents
        .iter()
        .find(|doc| preprocessor.preprocess(&doc.display_title) == query)
        .map_or_else(MatchResult::none, |doc| MatchResult::matched(doc.clone(), 100.0))
}
