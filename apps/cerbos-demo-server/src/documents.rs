//! In-memory document store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

pub type Content = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub owner: String,
    pub content: Content,
}

/// Body of `POST /documents`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateDocument {
    /// Requested id; a fresh UUID is generated when absent or blank.
    pub document_id: Option<String>,
    pub content: Content,
}

impl CreateDocument {
    /// The requested id, if it carries text.
    #[must_use]
    pub fn requested_id(&self) -> Option<&str> {
        self.document_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Default)]
pub struct DocumentRepository {
    documents: RwLock<HashMap<String, Document>>,
}

impl DocumentRepository {
    /// Repository holding the two demo documents.
    #[must_use]
    pub fn seeded() -> Self {
        let seed = [
            ("alpha", "alice", "Quarterly plan"),
            ("beta", "bob", "Draft budget"),
        ];
        let documents = seed
            .into_iter()
            .map(|(id, owner, title)| {
                let mut content = Content::new();
                content.insert("title".to_owned(), Value::from(title));
                (
                    id.to_owned(),
                    Document {
                        id: id.to_owned(),
                        owner: owner.to_owned(),
                        content,
                    },
                )
            })
            .collect();
        Self {
            documents: RwLock::new(documents),
        }
    }

    pub async fn find(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }

    /// Store `document`, replacing any previous one with the same id.
    pub async fn save(&self, document: Document) -> Document {
        self.documents
            .write()
            .await
            .insert(document.id.clone(), document.clone());
        document
    }

    /// All documents ordered by id.
    pub async fn list(&self) -> Vec<Document> {
        let mut documents: Vec<Document> = self.documents.read().await.values().cloned().collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        documents
    }
}
