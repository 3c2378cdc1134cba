use std::path::Path;

use planbot_protocol::{Document, MatchResult, Options, Verbatim};
use planbot_text::Preprocessor;

use crate::error::{Result, SearchError};
use crate::lexical::{match_topics, DEFAULT_TOKEN_SORT_THRESHOLD};
use crate::rules;
use crate::semantic::{SemanticEngine, SemanticStrategy};

/// Everything a strategy may consult besides the query text.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub documents: &'a [Document],
    pub verbatims: &'a [Verbatim],
    pub options: &'a Options,
    pub engine: &'a SemanticEngine,
}

/// A matching strategy.
///
/// Rule variants (`Verbatim`, `PlanList`, `StateOfRace`, `DisplayTitle`)
/// either fire or return an empty result. Statistical variants
/// (`TokenSortRatio`, `Semantic`) always return a best guess with a
/// confidence. `Composite` runs its members in order and stops at the
/// first affirmative result.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Verbatim,
    PlanList,
    StateOfRace,
    /// Title comparison runs both sides through this pipeline.
    DisplayTitle(Preprocessor),
    TokenSortRatio { threshold: f64 },
    Semantic(SemanticStrategy),
    Composite(Vec<Strategy>),
}

impl Strategy {
    /// Exact rules first, then `fallback`.
    #[must_use]
    pub fn default_chain(fallback: Strategy) -> Self {
        Self::rule_chain(Preprocessor::baseline(), fallback)
    }

    /// Exact rules first, with titles compared under `title_preprocessor`,
    /// then `fallback`.
    #[must_use]
    pub fn rule_chain(title_preprocessor: Preprocessor, fallback: Strategy) -> Self {
        Self::Composite(vec![
            Self::Verbatim,
            Self::PlanList,
            Self::StateOfRace,
            Self::DisplayTitle(title_preprocessor),
            fallback,
        ])
    }

    #[must_use]
    pub fn token_sort_ratio() -> Self {
        Self::TokenSortRatio {
            threshold: DEFAULT_TOKEN_SORT_THRESHOLD,
        }
    }

    /// Statistical strategy by name: `lsa`, `tfidf` or `token_sort_ratio`.
    pub fn statistical(name: &str, model_dir: &Path) -> Result<Self> {
        match name {
            "lsa" => Ok(Self::Semantic(SemanticStrategy::lsa(model_dir))),
            "tfidf" => Ok(Self::Semantic(SemanticStrategy::tfidf(model_dir))),
            "token_sort_ratio" => Ok(Self::token_sort_ratio()),
            other => Err(SearchError::Other(format!("unknown strategy '{other}'"))),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Verbatim => "verbatim",
            Self::PlanList => "plan_list",
            Self::StateOfRace => "state_of_race",
            Self::DisplayTitle(_) => "display_title",
            Self::TokenSortRatio { .. } => "token_sort_ratio",
            Self::Semantic(semantic) => &semantic.model.name,
            Self::Composite(_) => "composite",
        }
    }

    pub fn run(&self, ctx: &MatchContext<'_>, text: &str) -> Result<MatchResult> {
        match self {
            Self::Verbatim => Ok(rules::match_verbatim(ctx.verbatims, text, ctx.options)),
            Self::PlanList => Ok(rules::request_plan_list(text)),
            Self::StateOfRace => Ok(rules::request_state_of_race(text, ctx.options)),
            Self::DisplayTitle(preprocessor) => Ok(rules::match_display_title(
                ctx.documents,
                text,
                preprocessor,
            )),
            Self::TokenSortRatio { threshold } => {
                Ok(match_topics(ctx.documents, text, *threshold))
            }
            Self::Semantic(semantic) => semantic.run(ctx.engine, ctx.documents, text),
            Self::Composite(strategies) => {
                let mut last = None;
                for strategy in strategies {
                    let result = strategy.run(ctx, text)?;
                    if result.is_affirmative() {
                        log::debug!("Strategy '{}' matched", strategy.name());
                        return Ok(result);
                    }
                    last = Some(result);
                }
                last.ok_or(SearchError::EmptyChain)
            }
        }
    }
}
