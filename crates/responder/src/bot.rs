use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use planbot_protocol::{
    AuditRecord, AuditUpdate, Document, Flag, MatchResult, Operation, Post, ReplyType,
    ServerTimestamp, SkipReason, Verbatim,
};
use planbot_search::{MatchContext, SemanticEngine, Strategy};
use planbot_text::{extract_flags, TriggerExtractor};
use planbot_vector_store::Corpus;
use serde::{Deserialize, Serialize};

use crate::audit::AuditStore;
use crate::config::{BotConfig, ReplyMode};
use crate::enrich::{Enricher, NoEnrichment};
use crate::error::{ReplyError, ResponderError, Result};
use crate::replies;
use crate::source::MessageSource;

/// State for one run: which posts have already been seen.
#[derive(Debug, Default)]
pub struct RunContext {
    processed: HashSet<String>,
}

impl RunContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_processed(&self, id: &str) -> bool {
        self.processed.contains(id)
    }

    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Seen earlier in this run; nothing was written or sent
    AlreadyProcessed,
    Skipped { reason: SkipReason },
    Handled { reply_type: ReplyType, replied: bool },
}

/// Drives one post at a time through skip checks, matching, the decision
/// write, the reply, and the outcome write.
pub struct Bot {
    trigger: TriggerExtractor,
    bot_name: String,
    chain: Strategy,
    corpus: Corpus,
    engine: SemanticEngine,
    source: Arc<dyn MessageSource>,
    audit: Arc<dyn AuditStore>,
    enricher: Arc<dyn Enricher>,
    reply_mode: ReplyMode,
    skip_tracking: bool,
    today: Option<NaiveDate>,
}

impl Bot {
    pub fn new(
        config: &BotConfig,
        corpus: Corpus,
        source: Arc<dyn MessageSource>,
        audit: Arc<dyn AuditStore>,
    ) -> Result<Self> {
        Ok(Self {
            trigger: TriggerExtractor::new(&config.trigger_word)?,
            bot_name: config.bot_name.to_lowercase(),
            chain: config.chain(),
            corpus,
            engine: SemanticEngine::default(),
            source,
            audit,
            enricher: Arc::new(NoEnrichment),
            reply_mode: config.reply_mode,
            skip_tracking: config.skip_tracking,
            today: None,
        })
    }

    #[must_use]
    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = enricher;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, chain: Strategy) -> Self {
        self.chain = chain;
        self
    }

    #[must_use]
    pub fn with_reply_mode(mut self, reply_mode: ReplyMode) -> Self {
        self.reply_mode = reply_mode;
        self
    }

    /// Pin the date used by the state-of-race reply.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Run the chain over a post's trigger span without any side effects.
    pub fn match_text(&self, text: &str) -> Result<MatchResult> {
        let (span, options) = extract_flags(&self.trigger.extract_span(text));
        let ctx = MatchContext {
            documents: self.corpus.documents(),
            verbatims: self.corpus.verbatims(),
            options: &options,
            engine: &self.engine,
        };
        Ok(self.chain.run(&ctx, &span)?)
    }

    fn skip_reason(&self, post: &Post) -> Option<SkipReason> {
        if post.locked {
            return Some(SkipReason::PostLocked);
        }
        let Some(author) = &post.author else {
            return Some(SkipReason::NoAuthor);
        };
        if author.to_lowercase().contains(&self.bot_name) {
            return Some(SkipReason::OwnPost);
        }
        if !self.trigger.contains_trigger(&post.text) {
            return Some(SkipReason::TriggerNotFound);
        }
        None
    }

    async fn persist(&self, id: &str, record: AuditRecord) -> Result<()> {
        if self.skip_tracking {
            return Ok(());
        }
        self.audit.set(id, record).await
    }

    async fn persist_update(&self, id: &str, update: AuditUpdate) -> Result<()> {
        if self.skip_tracking {
            return Ok(());
        }
        self.audit.update(id, update).await
    }

    /// Handle one post. Any error other than a deleted reply target must
    /// abort the run: the decision may already be recorded.
    pub async fn process(&self, ctx: &mut RunContext, post: &Post) -> Result<ProcessOutcome> {
        if !ctx.processed.insert(post.id.clone()) {
            return Ok(ProcessOutcome::AlreadyProcessed);
        }
        log::info!("Processing post {}: {}", post.kind.as_str(), post.id);

        if let Some(reason) = self.skip_reason(post) {
            log::info!("Skipping {} ({})", post.id, reason.as_str());
            self.persist(&post.id, AuditRecord::skipped(post, reason))
                .await?;
            return Ok(ProcessOutcome::Skipped { reason });
        }

        let (span, options) = extract_flags(&self.trigger.extract_span(&post.text));
        let match_ctx = MatchContext {
            documents: self.corpus.documents(),
            verbatims: self.corpus.verbatims(),
            options: &options,
            engine: &self.engine,
        };
        let result = self.chain.run(&match_ctx, &span)?;

        let mut record = AuditRecord::for_post(post);
        record.processed = true;
        record.plan_match = result.match_id.clone();
        record.top_plan_confidence = result.confidence;
        record.top_plan = result.document.as_ref().map(|doc| doc.id.clone());
        record.verbatim_id = result.verbatim.as_ref().map(|v| v.id.clone());
        self.persist(&post.id, record).await?;

        let mut update = AuditUpdate::default();
        let (mut text, reply_type) = self.build_reply(post, &result, &mut update).await;
        update.reply_type = Some(reply_type);

        let mut target = post.clone();
        if options.contains(&Flag::Parent) {
            if let Some(parent) = self.source.parent(post).await? {
                let requester = post.author.as_deref().unwrap_or_default();
                text = format!("{}{text}", replies::parent_reply_prefix(requester));
                target = parent;
            }
        }

        let mut target_deleted = false;
        let replied = match self.send(&target, &text).await {
            Ok(replied) => replied,
            Err(ReplyError::TargetDeleted) => {
                target_deleted = true;
                log::warn!("Reply target {} was deleted", target.id);
                update.skipped = true;
                update.skip_reason = Some(SkipReason::DeletedComment);
                false
            }
            Err(err) => return Err(ResponderError::Reply(err)),
        };
        update.replied = replied;
        if replied {
            update.reply_timestamp = Some(ServerTimestamp);
        }
        self.persist_update(&post.id, update).await?;

        if target_deleted {
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::DeletedComment,
            });
        }
        Ok(ProcessOutcome::Handled {
            reply_type,
            replied,
        })
    }

    /// Process `posts` in order, stopping at the first fatal error.
    pub async fn process_all(
        &self,
        ctx: &mut RunContext,
        posts: &[Post],
    ) -> Result<Vec<(String, ProcessOutcome)>> {
        let mut outcomes = Vec::with_capacity(posts.len());
        for post in posts {
            let outcome = self.process(ctx, post).await?;
            outcomes.push((post.id.clone(), outcome));
        }
        Ok(outcomes)
    }

    async fn build_reply(
        &self,
        post: &Post,
        result: &MatchResult,
        update: &mut AuditUpdate,
    ) -> (String, ReplyType) {
        if let Some(plan) = self.accepted_document(result) {
            log::info!(
                "plan match: {} {} {:?}",
                plan.id,
                post.id,
                result.confidence
            );
            if plan.is_cluster {
                return (replies::plan_cluster_reply(plan), ReplyType::PlanCluster);
            }
            if let Some(generated) = self.enricher.enrich(plan, &post.text).await {
                return (replies::enriched_reply(&generated), ReplyType::PlanLlm);
            }
            return (replies::plan_reply(plan), ReplyType::Plan);
        }

        if let Some(text) = result
            .operation
            .and_then(|op| self.operation_reply(op, result.verbatim.as_ref()))
        {
            let operation = result.operation;
            log::info!(
                "{} requested: {}",
                operation.map_or("operation", Operation::as_str),
                post.id
            );
            update.operation = operation;
            return (text, ReplyType::Operation);
        }

        log::info!(
            "topic mismatch: {:?} {} {:?}",
            result.document.as_ref().map(|doc| &doc.id),
            post.id,
            result.confidence
        );
        (
            replies::no_match_reply(result.potential_matches()),
            ReplyType::NoMatch,
        )
    }

    fn accepted_document<'a>(&'a self, result: &'a MatchResult) -> Option<&'a Document> {
        let id = result.match_id.as_ref()?;
        let document = result
            .document
            .as_ref()
            .filter(|doc| &doc.id == id)
            .or_else(|| self.corpus.get(id));
        if document.is_none() {
            log::warn!("Matched id {id} is not in the corpus");
        }
        document
    }

    fn operation_reply(&self, operation: Operation, verbatim: Option<&Verbatim>) -> Option<String> {
        match operation {
            Operation::Verbatim => verbatim.map(replies::verbatim_reply),
            Operation::AllThePlans => Some(replies::all_plans_reply(self.corpus.documents())),
            Operation::StateOfRace => {
                let today = self
                    .today
                    .unwrap_or_else(|| chrono::Local::now().date_naive());
                Some(replies::state_of_race_reply(today))
            }
        }
    }

    /// `Ok(true)` when a reply was made or simulated.
    async fn send(&self, target: &Post, text: &str) -> std::result::Result<bool, ReplyError> {
        log::debug!("{text}");
        match self.reply_mode {
            ReplyMode::Simulate => {
                log::info!(
                    "[simulated] Bot replying to {}: {}",
                    target.kind.as_str(),
                    target.id
                );
                Ok(true)
            }
            ReplyMode::Send => {
                log::info!("Bot replying to {}: {}", target.kind.as_str(), target.id);
                self.source.reply(target, text).await?;
                Ok(true)
            }
            ReplyMode::DryRun => {
                log::info!(
                    "Bot would have replied to {}: {}",
                    target.kind.as_str(),
                    target.id
                );
                Ok(false)
            }
        }
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("trigger", &self.trigger.trigger_word())
            .field("chain", &self.chain.name())
            .field("reply_mode", &self.reply_mode)
            .field("skip_tracking", &self.skip_tracking)
            .finish_non_exhaustive()
    }
}
