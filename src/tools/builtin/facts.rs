use std::sync::Arc;

use crate::error::AideError;
use crate::memory::{Fact, FactCategory, FactQuery, FactStore};
use crate::tools::arguments::ToolArguments;
use crate::tools::result::ToolResult;
use crate::tools::shape::ArgumentShape;
use crate::tools::tool::{NativeTool, Tool, ToolExecutionContext};

const CATEGORY_HELP: &str = "One of: profile (identity such as name or birth year), \
preference (likes or dislikes), goal (plans), conversation (short-term context), \
general (anything else the user asked to remember)";

fn parse_category(args: &ToolArguments) -> Result<Option<FactCategory>, AideError> {
    args.get_str_opt("category")
        .map(|raw| {
            raw.trim().to_lowercase().parse::<FactCategory>().map_err(|_| {
                AideError::InvalidArgument(format!("unknown fact category '{raw}'"))
            })
        })
        .transpose()
}

/// `update_user_fact`: persist one fact about the user.
pub fn update_user_fact_tool(store: Arc<FactStore>) -> Arc<dyn Tool> {
    Arc::new(NativeTool::new(
        "update_user_fact",
        "Store a fact about the user in persistent memory",
        ArgumentShape::new()
            .string("fact", "The content of the fact to store", true)
            .string("category", CATEGORY_HELP, false)
            .string("name", "A subject or entity name the fact is about", false)
            .string("fact_type", "Type of fact, for example email, phone or address", false),
        move |args, _ctx: ToolExecutionContext| {
            let store = Arc::clone(&store);
            async move {
                let category = parse_category(&args)?.unwrap_or_default();
                let mut fact = Fact::new(args.get_str("fact")?, category);
                if let Some(name) = args.get_str_opt("name") {
                    fact = fact.with_subject(name);
                }
                if let Some(fact_type) = args.get_str_opt("fact_type") {
                    fact = fact.with_fact_type(fact_type);
                }
                store.add(fact).await?;
                Ok(ToolResult::text(format!("Fact saved under category '{category}'.")))
            }
        },
    ))
}

/// `query_user_fact`: retrieve up to three stored facts.
pub fn query_user_fact_tool(store: Arc<FactStore>) -> Arc<dyn Tool> {
    Arc::new(NativeTool::new(
        "query_user_fact",
        "Retrieve stored facts about the user. Call when a question refers to past user facts \
         or a decision depends on stored preferences",
        ArgumentShape::new()
            .string("query", "Semantic query about user facts", true)
            .string("category", "Filter by category", false)
            .string("name", "Filter by subject name", false)
            .string("fact_type", "Filter by fact type", false),
        move |args, _ctx: ToolExecutionContext| {
            let store = Arc::clone(&store);
            async move {
                let mut query = FactQuery::new(args.get_str("query")?);
                if let Some(category) = parse_category(&args)? {
                    query = query.category(category);
                }
                if let Some(name) = args.get_str_opt("name") {
                    query = query.subject(name);
                }
                if let Some(fact_type) = args.get_str_opt("fact_type") {
                    query = query.fact_type(fact_type);
                }
                let facts = store.query(&query).await?;
                Ok(ToolResult::from_value(serde_json::json!(facts)))
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::HashEmbedder;
    use serde_json::json;

    async fn store(dir: &tempfile::TempDir) -> Arc<FactStore> {
        Arc::new(
            FactStore::open(dir.path().join("facts.jsonl"), Arc::new(HashEmbedder::new(64)))
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn update_then_query_through_tools() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let update = update_user_fact_tool(Arc::clone(&store));
        let query = query_user_fact_tool(Arc::clone(&store));
        let ctx = ToolExecutionContext::default();

        let saved = update
            .call(&json!({"fact": "thích sushi", "category": "preference"}), &ctx)
            .await
            .unwrap();
        assert_eq!(saved.to_json(), json!("Fact saved under category 'preference'."));

        let found = query
            .call(&json!({"query": "sushi", "category": "preference"}), &ctx)
            .await
            .unwrap();
        assert_eq!(found.to_json(), json!(["thích sushi"]));
    }

    #[tokio::test]
    async fn category_defaults_to_general_and_rejects_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let update = update_user_fact_tool(store(&dir).await);
        let ctx = ToolExecutionContext::default();

        let saved = update.call(&json!({"fact": "có con mèo"}), &ctx).await.unwrap();
        assert_eq!(saved.to_json(), json!("Fact saved under category 'general'."));

        let err = update
            .call(&json!({"fact": "x", "category": "hobby"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AideError::InvalidArgument(m) if m.contains("hobby")));
    }
}
