use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::matching::Operation;
use crate::post::{Post, PostKind};

/// Why a message was recorded without being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    PostLocked,
    NoAuthor,
    OwnPost,
    TriggerNotFound,
    /// Reply target vanished between decision and reply
    DeletedComment,
}

impl SkipReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PostLocked => "post_locked",
            Self::NoAuthor => "no_author",
            Self::OwnPost => "own_post",
            Self::TriggerNotFound => "trigger_not_found",
            Self::DeletedComment => "deleted_comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyType {
    PlanCluster,
    PlanLlm,
    Plan,
    Operation,
    NoMatch,
}

impl ReplyType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlanCluster => "plan_cluster",
            Self::PlanLlm => "plan_llm",
            Self::Plan => "plan",
            Self::Operation => "operation",
            Self::NoMatch => "no_match",
        }
    }
}

/// Marker asking the audit store to stamp a field with its own clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTimestamp;

/// Durable trace of one processed message.
///
/// Written once when the decision is made (before any reply) and updated
/// once with the reply outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub processed: bool,
    /// Unix millis, assigned by the store
    pub processed_timestamp: Option<u64>,
    pub replied: bool,
    pub skipped: bool,
    pub skip_reason: Option<SkipReason>,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub post_id: String,
    pub post_author: Option<String>,
    pub post_text: String,
    pub post_parent_id: Option<String>,
    pub post_url: String,
    pub post_subreddit_id: String,
    pub post_subreddit_display_name: String,
    pub post_title: Option<String>,
    pub post_top_level_parent_id: Option<String>,
    pub post_locked: bool,
    pub plan_match: Option<DocumentId>,
    pub top_plan_confidence: Option<f64>,
    pub top_plan: Option<DocumentId>,
    pub verbatim_id: Option<String>,
    pub reply_type: Option<ReplyType>,
    pub operation: Option<Operation>,
    /// Unix millis, assigned by the store
    pub reply_timestamp: Option<u64>,
}

impl AuditRecord {
    /// Record for `post` with every decision field empty.
    pub fn for_post(post: &Post) -> Self {
        let is_comment = post.kind == PostKind::Comment;
        Self {
            processed: false,
            processed_timestamp: None,
            replied: false,
            skipped: false,
            skip_reason: None,
            kind: post.kind,
            post_id: post.id.clone(),
            post_author: post.author.as_ref().map(|name| format!("/u/{name}")),
            post_text: post.text.clone(),
            post_parent_id: if is_comment { post.parent_id.clone() } else { None },
            post_url: post.permalink.clone(),
            post_subreddit_id: post.container_id.clone(),
            post_subreddit_display_name: post.container_name.clone(),
            post_title: if is_comment { None } else { post.title.clone() },
            post_top_level_parent_id: if is_comment {
                post.top_level_parent_id.clone()
            } else {
                None
            },
            post_locked: post.locked,
            plan_match: None,
            top_plan_confidence: None,
            top_plan: None,
            verbatim_id: None,
            reply_type: None,
            operation: None,
            reply_timestamp: None,
        }
    }

    /// Processed-and-skipped record; nothing else will be written for it.
    pub fn skipped(post: &Post, reason: SkipReason) -> Self {
        Self {
            processed: true,
            skipped: true,
            skip_reason: Some(reason),
            ..Self::for_post(post)
        }
    }

    /// Merge a post-reply update; `now_millis` resolves [`ServerTimestamp`].
    pub fn apply(&mut self, update: &AuditUpdate, now_millis: u64) {
        if let Some(reply_type) = update.reply_type {
            self.reply_type = Some(reply_type);
        }
        if let Some(operation) = update.operation {
            self.operation = Some(operation);
        }
        if update.skipped {
            self.skipped = true;
            self.skip_reason = update.skip_reason;
        }
        self.replied = update.replied;
        if update.reply_timestamp.is_some() {
            self.reply_timestamp = Some(now_millis);
        }
    }
}

/// Second-phase write: the outcome of the reply attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditUpdate {
    pub reply_type: Option<ReplyType>,
    pub operation: Option<Operation>,
    pub replied: bool,
    pub skipped: bool,
    pub skip_reason: Option<SkipReason>,
    pub reply_timestamp: Option<ServerTimestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn comment_records_keep_thread_ids_and_drop_title() {
        let post = Post::comment("c1", Some("someone"), "hi", "p1");
        let record = AuditRecord::for_post(&post);
        assert_eq!(record.post_parent_id.as_deref(), Some("p1"));
        assert_eq!(record.post_top_level_parent_id.as_deref(), Some("p1"));
        assert_eq!(record.post_title, None);
        assert_eq!(record.post_author.as_deref(), Some("/u/someone"));
    }

    #[test]
    fn deleted_authors_are_recorded_as_missing() {
        let post = Post::submission("p1", None, "text");
        let record = AuditRecord::skipped(&post, SkipReason::NoAuthor);
        assert!(record.processed);
        assert_eq!(record.post_author, None);
        assert_eq!(record.skip_reason, Some(SkipReason::NoAuthor));
    }

    #[test]
    fn update_stamps_reply_time_only_when_requested() {
        let post = Post::submission("p1", Some("a"), "text");
        let mut record = AuditRecord::for_post(&post);
        record.apply(
            &AuditUpdate {
                reply_type: Some(ReplyType::Plan),
                replied: false,
                ..AuditUpdate::default()
            },
            10,
        );
        assert_eq!(record.reply_timestamp, None);

        record.apply(
            &AuditUpdate {
                replied: true,
                reply_timestamp: Some(ServerTimestamp),
                ..AuditUpdate::default()
            },
            20,
        );
        assert!(record.replied);
        assert_eq!(record.reply_timestamp, Some(20));
        assert_eq!(record.reply_type, Some(ReplyType::Plan));
    }

    #[test]
    fn skip_reasons_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(SkipReason::TriggerNotFound).unwrap(),
            "trigger_not_found"
        );
        assert_eq!(SkipReason::PostLocked.as_str(), "post_locked");
    }
}
