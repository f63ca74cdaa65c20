//! Native tools for user memory.
//!
//! These run in-process and never touch the tool transport:
//! `update_user_fact` and `query_user_fact` over the fact store, and
//! `update_user_preferences` over the user instruction tier.

mod facts;
mod preferences;

use std::sync::Arc;

pub use facts::{query_user_fact_tool, update_user_fact_tool};
pub use preferences::update_user_preferences_tool;

use crate::instructions::InstructionSources;
use crate::memory::FactStore;
use crate::tools::tool::Tool;

/// All memory tools, in registration order.
pub fn memory_tools(store: Arc<FactStore>, sources: InstructionSources) -> Vec<Arc<dyn Tool>> {
    vec![
        update_user_fact_tool(Arc::clone(&store)),
        query_user_fact_tool(store),
        update_user_preferences_tool(sources),
    ]
}
