//! Persistent, embedding-indexed fact store.
//!
//! Records live in a JSON-lines file, one `FactRecord` per line, loaded once
//! on open and appended to on every insert. Memory is append-only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::embedding::Embedder;
use super::fact::{fact_id, Fact, FactCategory, FactRecord};
use super::vector::rank;
use crate::error::AideError;

/// Metadata-filtered semantic query.
#[derive(Debug, Clone, PartialEq)]
pub struct FactQuery {
    pub text: String,
    pub k: usize,
    pub category: Option<FactCategory>,
    pub subject: Option<String>,
    pub fact_type: Option<String>,
}

impl FactQuery {
    pub const DEFAULT_K: usize = 3;

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            k: Self::DEFAULT_K,
            category: None,
            subject: None,
            fact_type: None,
        }
    }

    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn category(mut self, category: FactCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn fact_type(mut self, fact_type: impl Into<String>) -> Self {
        self.fact_type = Some(fact_type.into());
        self
    }

    fn matches(&self, record: &FactRecord) -> bool {
        self.category.map_or(true, |c| record.category == c)
            && self
                .subject
                .as_deref()
                .map_or(true, |s| record.subject.as_deref() == Some(s))
            && self
                .fact_type
                .as_deref()
                .map_or(true, |t| record.fact_type.as_deref() == Some(t))
    }
}

/// Result of [`FactStore::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub id: String,
    /// `false` when a record with identical content already existed.
    pub inserted: bool,
}

pub struct FactStore {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
    records: RwLock<Vec<FactRecord>>,
}

impl FactStore {
    /// Open the store at `path`, loading any existing records.
    ///
    /// A missing file is an empty store. A malformed line or a record whose
    /// embedding does not match the embedder's dimension makes the store
    /// unavailable.
    pub async fn open(path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Result<Self, AideError> {
        let path = path.into();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(AideError::FactStoreUnavailable(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: FactRecord = serde_json::from_str(line).map_err(|e| {
                AideError::FactStoreUnavailable(format!(
                    "{} line {}: {e}",
                    path.display(),
                    idx + 1
                ))
            })?;
            if record.embedding.len() != embedder.dimensions() {
                return Err(AideError::FactStoreUnavailable(format!(
                    "{} line {}: embedding has {} dimensions, expected {}",
                    path.display(),
                    idx + 1,
                    record.embedding.len(),
                    embedder.dimensions()
                )));
            }
            records.push(record);
        }

        tracing::debug!(path = %path.display(), count = records.len(), "fact store loaded");
        Ok(Self {
            path,
            embedder,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Embed and persist a fact.
    ///
    /// Identical content maps to the same id; a second add is a no-op that
    /// reports `inserted: false`.
    pub async fn add(&self, fact: Fact) -> Result<AddOutcome, AideError> {
        let id = fact_id(&fact.content);
        if self.records.read().await.iter().any(|r| r.id == id) {
            tracing::debug!(id = %id, "fact already stored");
            return Ok(AddOutcome { id, inserted: false });
        }

        let embedding = self.embed(&fact.content).await?;
        let record = FactRecord {
            id: id.clone(),
            content: fact.content,
            category: fact.category,
            subject: fact.subject,
            fact_type: fact.fact_type,
            embedding,
            created_at: chrono::Utc::now(),
        };

        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == id) {
            return Ok(AddOutcome { id, inserted: false });
        }
        self.append(&record).await?;
        tracing::debug!(id = %id, category = %record.category, "fact stored");
        records.push(record);
        Ok(AddOutcome { id, inserted: true })
    }

    /// Up to `k` fact contents matching every filter, most similar first.
    /// No match is an empty list.
    pub async fn query(&self, query: &FactQuery) -> Result<Vec<String>, AideError> {
        let embedding = self.embed(&query.text).await?;
        if query.k == 0 {
            return Ok(Vec::new());
        }
        let records = self.records.read().await;
        let candidates = records.iter().filter(|r| query.matches(r));
        Ok(rank(candidates, &embedding, query.k)
            .into_iter()
            .map(|(_, record)| record.content.clone())
            .collect())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AideError> {
        let embedding = self.embedder.embed(text).await.map_err(|e| match e {
            AideError::FactStoreUnavailable(_) => e,
            other => AideError::FactStoreUnavailable(other.to_string()),
        })?;
        if embedding.len() != self.embedder.dimensions() {
            return Err(AideError::FactStoreUnavailable(format!(
                "embedder returned {} dimensions, expected {}",
                embedding.len(),
                self.embedder.dimensions()
            )));
        }
        Ok(embedding)
    }

    async fn append(&self, record: &FactRecord) -> Result<(), AideError> {
        let unavailable =
            |e: std::io::Error| AideError::FactStoreUnavailable(format!("failed to write {}: {e}", self.path.display()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(unavailable)?;
        file.write_all(line.as_bytes()).await.map_err(unavailable)?;
        file.flush().await.map_err(unavailable)?;
        Ok(())
    }
}

impl std::fmt::Debug for FactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactStore").field("path", &self.path).finish()
    }
}
