//! # Plan Bot Responder
//!
//! Everything between an incoming message and the reply that goes back out.
//!
//! ```text
//! MessageSource ──> Post
//!                     │
//!                     ▼
//!   Bot::process ── skip checks (locked, no author, own post, no trigger)
//!                     │
//!                     ├─> trigger span + flags ──> Strategy chain ──> MatchResult
//!                     ├─> AuditStore::set     (decision, before any reply)
//!                     ├─> reply text          plan | cluster | enriched | operation | no match
//!                     ├─> MessageSource::reply (or dry run / simulation)
//!                     └─> AuditStore::update  (reply outcome)
//! ```
//!
//! The two audit writes are not atomic with the reply. A crash between
//! them leaves a record that says what was decided but not whether it was
//! sent; a reply failure other than a deleted target aborts the run at
//! exactly that point.

mod audit;
mod bot;
mod config;
mod enrich;
mod error;
mod replies;
mod source;

pub use audit::{AuditStore, AuditWrite, JsonDirAuditStore, MemoryAuditStore};
pub use bot::{Bot, ProcessOutcome, RunContext};
pub use config::{
    BotConfig, EnrichmentConfig, FallbackStrategy, ReplyMode, Thresholds, DEFAULT_BOT_NAME,
    DEFAULT_CORPUS_DIR, DEFAULT_MODEL_DIR, DEFAULT_TRIGGER_WORD,
};
pub use enrich::{plan_context_prompt, ChatCompletionEnricher, Enricher, NoEnrichment};
pub use error::{ReplyError, ResponderError, Result};
pub use replies::{
    all_plans_reply, enriched_reply, footer, no_match_reply, parent_reply_prefix,
    plan_cluster_reply, plan_reply, state_of_race_reply, verbatim_reply, MAX_SUGGESTIONS,
};
pub use source::{LocalSource, MessageSource, SentReply};
