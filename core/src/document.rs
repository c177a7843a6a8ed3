use crate::DocId;
use serde::{Deserialize, Deserializer, Serialize};

/// A record as handed over by the collector. Missing fields read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, alias = "article_description", deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, alias = "article_content", deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(d).map(Option::unwrap_or_default)
}

/// An ingested document. `id` is its position in ingestion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: Option<String>,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, description: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            content: content.into(),
            url: None,
        }
    }

    pub fn from_record(id: DocId, record: DocumentRecord) -> Self {
        Self {
            id,
            title: record.title,
            description: record.description,
            content: record.content,
            url: record.url,
        }
    }

    /// Number records in the order they were received.
    pub fn from_records<I>(records: I) -> Vec<Self>
    where
        I: IntoIterator<Item = DocumentRecord>,
    {
        records
            .into_iter()
            .enumerate()
            .map(|(i, r)| Self::from_record(i as DocId, r))
            .collect()
    }

    /// Indexed text: title, description and content joined by newlines.
    pub fn text(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.description, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let rec: DocumentRecord = serde_json::from_str(r#"{"title": "Seul"}"#).unwrap();
        assert_eq!(rec.description, "");
        assert_eq!(rec.content, "");
        assert!(rec.url.is_none());

        let rec: DocumentRecord = serde_json::from_str(r#"{"title": null, "content": "x"}"#).unwrap();
        assert_eq!(rec.title, "");
        assert_eq!(rec.content, "x");
    }

    #[test]
    fn accepts_article_field_names() {
        let rec: DocumentRecord = serde_json::from_str(
            r#"{"title": "T", "article_description": "D", "article_content": "C", "url": "https://x"}"#,
        )
        .unwrap();
        let doc = Document::from_record(3, rec);
        assert_eq!(doc.text(), "T\nD\nC");
        assert_eq!(doc.url.as_deref(), Some("https://x"));
    }

    #[test]
    fn ids_follow_ingestion_order() {
        let docs = Document::from_records(vec![DocumentRecord::default(), DocumentRecord::default()]);
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![0, 1]);
    }
}
