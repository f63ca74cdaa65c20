use std::sync::Arc;

use crate::instructions::InstructionSources;
use crate::tools::result::ToolResult;
use crate::tools::shape::ArgumentShape;
use crate::tools::tool::{NativeTool, Tool, ToolExecutionContext};

/// `update_user_preferences`: overwrite the user instruction tier.
pub fn update_user_preferences_tool(sources: InstructionSources) -> Arc<dyn Tool> {
    let sources = Arc::new(sources);
    Arc::new(NativeTool::new(
        "update_user_preferences",
        "Use whenever the user explicitly sets or changes a persistent preference, such as \
         response language, tone, the assistant's name or output format. Pass the complete \
         list of preferences; it replaces the stored one",
        ArgumentShape::new().string_array("preferences", "Full list of user preferences", true),
        move |args, _ctx: ToolExecutionContext| {
            let sources = Arc::clone(&sources);
            async move {
                let preferences = args.get_string_array("preferences")?;
                sources.write_user_tier(&preferences).await?;
                Ok(ToolResult::text(format!(
                    "Preferences for {} updated: {}",
                    sources.user_id(),
                    preferences.join("; ")
                )))
            }
        },
    ))
}
