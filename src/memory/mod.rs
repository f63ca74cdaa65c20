//! Long-term fact memory.

pub mod embedding;
pub mod fact;
pub mod store;
pub mod vector;

pub use embedding::{Embedder, HashEmbedder, HttpEmbedder};
pub use fact::{fact_id, Fact, FactCategory, FactRecord};
pub use store::{AddOutcome, FactQuery, FactStore};
pub use vector::cosine_similarity;
