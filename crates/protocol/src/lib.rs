//! Shared data model for the plan bot.
//!
//! Every crate in the workspace speaks these types: the corpus records
//! ([`Document`], [`Verbatim`]), the value every matching strategy returns
//! ([`MatchResult`]), the flags parsed out of a message ([`Options`]), the
//! message itself ([`Post`]) and the durable per-message trace
//! ([`AuditRecord`] / [`AuditUpdate`]).

mod audit;
mod document;
mod matching;
mod options;
mod post;

pub use audit::{AuditRecord, AuditUpdate, ReplyType, ServerTimestamp, SkipReason};
pub use document::{Document, DocumentId, Verbatim};
pub use matching::{MatchResult, Operation, PotentialMatch};
pub use options::{Flag, Options};
pub use post::{Post, PostKind};
