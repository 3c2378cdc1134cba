use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    /// Top-level post
    Submission,
    /// Reply inside a thread
    Comment,
}

impl PostKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Comment => "comment",
        }
    }
}

/// One incoming message as supplied by the message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub kind: PostKind,
    /// `None` once the author account or the message was deleted
    #[serde(default)]
    pub author: Option<String>,
    pub text: String,
    /// Submissions only
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub locked: bool,
    /// Comments only: the direct parent (post or comment)
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Comments only: the submission the thread hangs off
    #[serde(default)]
    pub top_level_parent_id: Option<String>,
    #[serde(default)]
    pub container_id: String,
    #[serde(default)]
    pub container_name: String,
}

impl Post {
    pub fn submission(id: impl Into<String>, author: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: PostKind::Submission,
            author: author.map(str::to_string),
            text: text.into(),
            title: Some(String::new()),
            permalink: String::new(),
            locked: false,
            parent_id: None,
            top_level_parent_id: None,
            container_id: String::new(),
            container_name: String::new(),
        }
    }

    pub fn comment(
        id: impl Into<String>,
        author: Option<&str>,
        text: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        let parent_id = parent_id.into();
        Self {
            id: id.into(),
            kind: PostKind::Comment,
            author: author.map(str::to_string),
            text: text.into(),
            title: None,
            permalink: String::new(),
            locked: false,
            top_level_parent_id: Some(parent_id.clone()),
            parent_id: Some(parent_id),
            container_id: String::new(),
            container_name: String::new(),
        }
    }

    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}
