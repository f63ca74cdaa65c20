//! Fact records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

/// What kind of statement a fact is.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FactCategory {
    /// Identity details such as name or birth year.
    Profile,
    /// Likes and dislikes.
    Preference,
    Goal,
    /// Short-lived conversational context.
    Conversation,
    #[default]
    General,
}

/// A fact to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub content: String,
    pub category: FactCategory,
    pub subject: Option<String>,
    pub fact_type: Option<String>,
}

impl Fact {
    pub fn new(content: impl Into<String>, category: FactCategory) -> Self {
        Self {
            content: content.into(),
            category,
            subject: None,
            fact_type: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_fact_type(mut self, fact_type: impl Into<String>) -> Self {
        self.fact_type = Some(fact_type.into());
        self
    }
}

/// A persisted fact with its embedding. One JSON line on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    pub id: String,
    pub content: String,
    pub category: FactCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_type: Option<String>,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// Content-derived identifier: hex SHA-256 of the content bytes.
pub fn fact_id(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}
