//! Document records shared by the chunker, ranker and evaluator

use crate::chunk::{Chunk, Metadata};
use serde::{Deserialize, Serialize};

/// A retrieved or reference document as seen by the evaluator
///
/// Only `id` and `content` carry meaning for scoring; anything else a
/// collaborator sends along is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(flatten)]
    pub extra: Metadata,
}

impl DocumentRef {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// A reference carrying only an id (ground-truth sets)
    pub fn id_only(id: impl Into<String>) -> Self {
        Self::new(id, "")
    }
}

impl From<&Chunk> for DocumentRef {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            content: chunk.content.clone(),
            document_id: Some(chunk.document_id.clone()),
            score: None,
            extra: Metadata::new(),
        }
    }
}

/// One element of a pre-parsed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// Body text
    Text { text: String },
    /// Key-value pairs attached to every chunk of the document
    Metadata { values: Metadata },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_ref_keeps_extra_fields() {
        let doc: DocumentRef = serde_json::from_value(json!({
            "id": "a",
            "content": "text",
            "source": "wiki"
        }))
        .unwrap();

        assert_eq!(doc.id, "a");
        assert_eq!(doc.extra["source"], "wiki");
        assert_eq!(doc.score, None);
    }

    #[test]
    fn test_document_ref_id_only() {
        let doc: DocumentRef = serde_json::from_value(json!({"id": "b"})).unwrap();
        assert_eq!(doc, DocumentRef::id_only("b"));
    }

    #[test]
    fn test_element_tagging() {
        let element: Element =
            serde_json::from_value(json!({"type": "text", "text": "hello"})).unwrap();
        assert_eq!(element, Element::Text { text: "hello".to_string() });

        let element: Element =
            serde_json::from_value(json!({"type": "metadata", "values": {"k": 1}})).unwrap();
        assert!(matches!(element, Element::Metadata { values } if values["k"] == 1));
    }
}
