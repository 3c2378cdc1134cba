use planbot_protocol::{DocumentId, MatchResult};
use planbot_text::{extract_flags, TriggerExtractor};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::strategy::{MatchContext, Strategy};

pub const CORRECT_MATCH: f64 = 1.0;
pub const ALTERNATE_MATCH: f64 = 0.5;
pub const NO_MATCH: f64 = 0.0;
pub const WRONG_MATCH: f64 = -2.0;

/// A real message with the document a human decided it was asking about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelledPost {
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
    /// `None` when no document should match
    #[serde(rename = "match")]
    pub expected: Option<DocumentId>,
    #[serde(default)]
    pub alternate_matches: Vec<DocumentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Alternate,
    NoMatch,
    Wrong,
}

impl Verdict {
    #[must_use]
    pub const fn score(self) -> f64 {
        match self {
            Self::Correct => CORRECT_MATCH,
            Self::Alternate => ALTERNATE_MATCH,
            Self::NoMatch => NO_MATCH,
            Self::Wrong => WRONG_MATCH,
        }
    }

    /// An expected "no match" that gets none counts as correct.
    #[must_use]
    pub fn judge(post: &LabelledPost, result: &MatchResult) -> Self {
        let got = result.match_id.as_ref();
        if got == post.expected.as_ref() {
            Self::Correct
        } else if got.is_some_and(|id| post.alternate_matches.contains(id)) {
            Self::Alternate
        } else if got.is_none() {
            Self::NoMatch
        } else {
            Self::Wrong
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPost {
    pub post_text: String,
    pub post_source: Option<String>,
    pub verdict: Verdict,
    pub score: f64,
    #[serde(rename = "match")]
    pub match_id: Option<DocumentId>,
    pub match_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyScore {
    pub name: String,
    /// Mean per-post score times 100
    pub total_score: f64,
    pub posts: Vec<ScoredPost>,
}

impl StrategyScore {
    pub fn with_verdict(&self, verdict: Verdict) -> impl Iterator<Item = &ScoredPost> {
        self.posts.iter().filter(move |p| p.verdict == verdict)
    }
}

/// Run `strategy` over every labelled post's trigger span and score it.
pub fn evaluate(
    strategy: &Strategy,
    ctx: &MatchContext<'_>,
    trigger: &TriggerExtractor,
    posts: &[LabelledPost],
) -> Result<StrategyScore> {
    let mut scored = Vec::with_capacity(posts.len());
    for post in posts {
        let (span, options) = extract_flags(&trigger.extract_span(&post.text));
        let post_ctx = MatchContext {
            options: &options,
            ..*ctx
        };
        let result = strategy.run(&post_ctx, &span)?;
        let verdict = Verdict::judge(post, &result);
        scored.push(ScoredPost {
            post_text: post.text.clone(),
            post_source: post.source.clone(),
            verdict,
            score: verdict.score(),
            match_id: result.match_id,
            match_confidence: result.confidence,
        });
    }

    let total_score = if scored.is_empty() {
        0.0
    } else {
        scored.iter().map(|p| p.score).sum::<f64>() / scored.len() as f64 * 100.0
    };
    log::info!("Strategy '{}' scored {total_score:.1}", strategy.name());

    Ok(StrategyScore {
        name: strategy.name().to_string(),
        total_score,
        posts: scored,
    })
}
