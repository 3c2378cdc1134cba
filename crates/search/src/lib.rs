//! # Plan Bot Search
//!
//! Turns a trigger span into a [`MatchResult`](planbot_protocol::MatchResult).
//!
//! ```text
//! span + Options
//!     │
//!     └──> Strategy::Composite (first affirmative result wins)
//!            ├─> Verbatim        "help", "advanced help", "why warren"
//!            ├─> PlanList        "... show me the plans"
//!            ├─> StateOfRace     "... state of the race", --status-check
//!            ├─> DisplayTitle    exact preprocessed title, confidence 100
//!            └─> fallback        TokenSortRatio | Semantic(lsa | tfidf)
//!                                    │
//!                                    └─> SemanticEngine (LRU of loaded models)
//! ```
//!
//! When nothing fires the composite returns the fallback's result, so its
//! confidence and `potential_matches` remain available for suggestions.

mod error;
mod eval;
mod lexical;
mod rules;
mod semantic;
mod strategy;

pub use error::{Result, SearchError};
pub use eval::{
    evaluate, LabelledPost, ScoredPost, StrategyScore, Verdict, ALTERNATE_MATCH, CORRECT_MATCH,
    NO_MATCH, WRONG_MATCH,
};
pub use lexical::{match_topics, token_sort_ratio, DEFAULT_TOKEN_SORT_THRESHOLD};
pub use rules::{
    match_display_title, match_verbatim, request_plan_list, request_state_of_race,
    ADVANCED_HELP_VERBATIM, BASIC_HELP_VERBATIM, WHY_WARREN_VERBATIM,
};
pub use semantic::{
    rank, SemanticEngine, SemanticStrategy, DEFAULT_MODEL_CACHE_CAPACITY,
    DEFAULT_POTENTIAL_THRESHOLD, LSA_THRESHOLD, TFIDF_THRESHOLD,
};
pub use strategy::{MatchContext, Strategy};
