use serde::{Deserialize, Deserializer, Serialize};

/// Corpus ids arrive as JSON strings or integers; both normalize to a string.
pub type DocumentId = String;

/// A matchable plan, or a cluster grouping several plans under one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(deserialize_with = "id_from_string_or_int")]
    pub id: DocumentId,
    /// Hand-picked human-readable topic used for lexical matching
    pub topic: String,
    pub display_title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: String,
    /// Full scraped plan text; only pure plans carry it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    /// Extra text folded into model training but never shown to users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_training_text: Option<String>,
    #[serde(default)]
    pub is_cluster: bool,
    /// Resolved member plans of a cluster (empty for pure plans)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Document>,
}

impl Document {
    /// Build a pure (non-cluster) plan.
    pub fn plan(
        id: impl Into<String>,
        topic: impl Into<String>,
        display_title: impl Into<String>,
        url: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            display_title: display_title.into(),
            url: url.into(),
            summary: summary.into(),
            full_text: None,
            additional_training_text: None,
            is_cluster: false,
            members: Vec::new(),
        }
    }

    /// Build a cluster whose payload is `members`.
    pub fn cluster(
        id: impl Into<String>,
        topic: impl Into<String>,
        display_title: impl Into<String>,
        members: Vec<Document>,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            display_title: display_title.into(),
            url: String::new(),
            summary: String::new(),
            full_text: None,
            additional_training_text: None,
            is_cluster: true,
            members,
        }
    }

    #[must_use]
    pub fn with_full_text(mut self, text: impl Into<String>) -> Self {
        self.full_text = Some(text.into());
        self
    }
}

/// A fixed scripted reply, chosen by id rather than by similarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verbatim {
    pub id: String,
    pub text: String,
}

impl Verbatim {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

fn id_from_string_or_int<'de, D>(deserializer: D) -> Result<DocumentId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ids_become_strings() {
        let doc: Document = serde_json::from_str(
            r#"{"id": 42, "topic": "t", "display_title": "T", "url": "u", "summary": "s"}"#,
        )
        .unwrap();
        assert_eq!(doc.id, "42");
        assert!(!doc.is_cluster);
        assert!(doc.members.is_empty());
    }

    #[test]
    fn string_ids_are_kept() {
        let doc: Document =
            serde_json::from_str(r#"{"id": "medicare_for_all", "topic": "t", "display_title": "T"}"#)
                .unwrap();
        assert_eq!(doc.id, "medicare_for_all");
        assert_eq!(doc.summary, "");
    }
}
