//! Assembles the per-turn system prompt from the three instruction tiers.

use std::sync::Arc;

use super::sources::InstructionSources;
use crate::error::AideError;
use crate::mcp::ToolSchema;
use crate::memory::{FactCategory, FactQuery, FactStore};

pub const SYSTEM_HEADER: &str = "### System Instructions:";
pub const DOMAIN_HEADER: &str = "### Domain Instructions:";
pub const USER_HEADER: &str = "### User Instructions:";

/// Query used to pull preference facts into the user tier.
pub const DEFAULT_PREFERENCE_QUERY: &str = "sở thích";

pub struct InstructionCompiler {
    sources: InstructionSources,
    facts: Option<Arc<FactStore>>,
    preference_query: String,
    preference_limit: usize,
}

impl InstructionCompiler {
    pub fn new(sources: InstructionSources) -> Self {
        Self {
            sources,
            facts: None,
            preference_query: DEFAULT_PREFERENCE_QUERY.to_string(),
            preference_limit: FactQuery::DEFAULT_K,
        }
    }

    /// Fold preference facts from `store` into the user tier.
    pub fn with_fact_store(mut self, store: Arc<FactStore>) -> Self {
        self.facts = Some(store);
        self
    }

    pub fn with_preference_query(mut self, query: impl Into<String>, limit: usize) -> Self {
        self.preference_query = query.into();
        self.preference_limit = limit;
        self
    }

    pub fn sources(&self) -> &InstructionSources {
        &self.sources
    }

    /// Build the prompt for this turn.
    ///
    /// Tier files are re-read on every call so preference writes show up on
    /// the next model call. A fact store failure is returned, not hidden.
    pub async fn compile(&self, domain_instructions: &[String]) -> Result<String, AideError> {
        let system = self.sources.system_tier().await;
        let mut domain = self.sources.domain_tier().await;
        domain.extend_from_slice(domain_instructions);

        let mut user = self.sources.user_tier().await;
        if let Some(store) = &self.facts {
            let query = FactQuery::new(self.preference_query.clone())
                .k(self.preference_limit)
                .category(FactCategory::Preference);
            user.extend(store.query(&query).await?);
        }

        Ok(render(&system, &domain, &user))
    }
}

impl std::fmt::Debug for InstructionCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionCompiler")
            .field("sources", &self.sources)
            .field("facts", &self.facts.is_some())
            .finish()
    }
}

/// Render the three tiers in fixed order.
pub fn render(system: &[String], domain: &[String], user: &[String]) -> String {
    let mut prompt = String::new();
    push_section(&mut prompt, SYSTEM_HEADER, system);
    prompt.push('\n');
    push_section(&mut prompt, DOMAIN_HEADER, domain);
    prompt.push('\n');
    push_section(&mut prompt, USER_HEADER, user);
    prompt
}

fn push_section(prompt: &mut String, header: &str, lines: &[String]) {
    prompt.push_str(header);
    prompt.push('\n');
    for line in lines {
        prompt.push_str("- ");
        prompt.push_str(line);
        prompt.push('\n');
    }
}

/// One usage line for a tool.
pub fn domain_line(name: &str, description: &str) -> String {
    format!("Use tool `{name}` when: {description}")
}

/// One line per tool, input order preserved.
pub fn derive_domain_instructions(schemas: &[ToolSchema]) -> Vec<String> {
    schemas
        .iter()
        .map(|s| domain_line(&s.name, &s.description))
        .collect()
}
