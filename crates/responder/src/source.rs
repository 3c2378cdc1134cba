use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use planbot_protocol::Post;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{ReplyError, Result};

/// Where posts come from and where replies go.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// The post `post` replies to, if it still exists.
    async fn parent(&self, post: &Post) -> Result<Option<Post>>;

    async fn reply(&self, target: &Post, text: &str) -> std::result::Result<(), ReplyError>;
}

/// One reply that left the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentReply {
    pub target_id: String,
    pub text: String,
}

/// Posts held in memory. Replies are recorded and, when an outbox path is
/// set, appended to it as JSON lines.
#[derive(Debug, Default)]
pub struct LocalSource {
    posts: HashMap<String, Post>,
    deleted: HashSet<String>,
    outbox: Option<PathBuf>,
    sent: Mutex<Vec<SentReply>>,
}

impl LocalSource {
    pub fn new(posts: impl IntoIterator<Item = Post>) -> Self {
        Self {
            posts: posts.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_outbox(mut self, path: impl Into<PathBuf>) -> Self {
        self.outbox = Some(path.into());
        self
    }

    /// Replies to `id` will fail as if the post had been deleted.
    #[must_use]
    pub fn with_deleted(mut self, id: impl Into<String>) -> Self {
        self.deleted.insert(id.into());
        self
    }

    #[must_use]
    pub fn sent(&self) -> Vec<SentReply> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    async fn append_outbox(path: &Path, reply: &SentReply) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(reply)?;
        line.push(b'\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await
    }
}

#[async_trait]
impl MessageSource for LocalSource {
    async fn parent(&self, post: &Post) -> Result<Option<Post>> {
        Ok(post
            .parent_id
            .as_ref()
            .and_then(|id| self.posts.get(id))
            .cloned())
    }

    async fn reply(&self, target: &Post, text: &str) -> std::result::Result<(), ReplyError> {
        if self.deleted.contains(&target.id) {
            return Err(ReplyError::TargetDeleted);
        }
        let reply = SentReply {
            target_id: target.id.clone(),
            text: text.to_string(),
        };
        if let Some(path) = &self.outbox {
            Self::append_outbox(path, &reply).await.map_err(|err| {
                ReplyError::Other(format!("failed to write {}: {err}", path.display()))
            })?;
        }
        self.sent
            .lock()
            .map_err(|_| ReplyError::Other("reply log poisoned".to_string()))?
            .push(reply);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn resolves_parents_and_records_replies() {
        let parent = Post::submission("p1", Some("op"), "original");
        let child = Post::comment("c1", Some("asker"), "!warrenplanbot --parent", "p1");
        let orphan = Post::comment("c2", Some("asker"), "hi", "gone");
        let source = LocalSource::new([parent.clone(), child.clone(), orphan.clone()]);

        assert_eq!(source.parent(&child).await.unwrap(), Some(parent.clone()));
        assert_eq!(source.parent(&orphan).await.unwrap(), None);
        assert_eq!(source.parent(&parent).await.unwrap(), None);

        source.reply(&parent, "hello").await.unwrap();
        assert_eq!(
            source.sent(),
            vec![SentReply {
                target_id: "p1".to_string(),
                text: "hello".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn deleted_targets_fail_with_target_deleted() {
        let post = Post::submission("p1", Some("op"), "text");
        let source = LocalSource::new([post.clone()]).with_deleted("p1");
        assert!(matches!(
            source.reply(&post, "x").await,
            Err(ReplyError::TargetDeleted)
        ));
        assert!(source.sent().is_empty());
    }

    #[tokio::test]
    async fn outbox_gets_one_json_line_per_reply() {
        let temp = TempDir::new().unwrap();
        let outbox = temp.path().join("outbox.jsonl");
        let post = Post::submission("p1", Some("op"), "text");
        let source = LocalSource::new([post.clone()]).with_outbox(&outbox);
        source.reply(&post, "one").await.unwrap();
        source.reply(&post, "two").await.unwrap();

        let written = std::fs::read_to_string(&outbox).unwrap();
        let lines: Vec<SentReply> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "two");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unwritable_outbox_fails_the_reply() {
        let temp = TempDir::new().unwrap();
        let outbox = temp.path().join("missing").join("outbox.jsonl");
        let post = Post::submission("p1", Some("op"), "text");
        let source = LocalSource::new([post.clone()]).with_outbox(&outbox);

        let err = source.reply(&post, "one").await.unwrap_err();
        assert!(matches!(err, ReplyError::Other(ref msg) if msg.contains("outbox.jsonl")));
        assert!(source.sent().is_empty());
    }
}
