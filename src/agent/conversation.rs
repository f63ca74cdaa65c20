//! Conversation history for one session.

use std::collections::HashSet;

use crate::types::Message;

/// Ordered message history. System messages never live here; the prompt is
/// recompiled for every model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub(crate) fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything after the first `len` messages.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The most recent AI message, if any.
    pub fn last_reply(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| matches!(m, Message::Ai { .. }))
    }
}

/// Check that every tool call request is answered by exactly one Tool
/// message before the next AI message, and that no Tool message is orphaned.
pub fn validate_tool_pairing(messages: &[Message]) -> Result<(), String> {
    let mut open: HashSet<&str> = HashSet::new();
    for (index, message) in messages.iter().enumerate() {
        match message {
            Message::Ai { tool_calls, .. } => {
                if !open.is_empty() {
                    return Err(format!(
                        "message {index}: AI message while {} tool call(s) unanswered",
                        open.len()
                    ));
                }
                for call in tool_calls {
                    if !open.insert(call.id.as_str()) {
                        return Err(format!("message {index}: duplicate tool call id {}", call.id));
                    }
                }
            }
            Message::Tool { tool_call_id, .. } => {
                if !open.remove(tool_call_id.as_str()) {
                    return Err(format!(
                        "message {index}: tool result {tool_call_id} has no pending request"
                    ));
                }
            }
            Message::Human { .. } | Message::System { .. } => {
                if !open.is_empty() {
                    return Err(format!(
                        "message {index}: {} message while tool calls unanswered",
                        message.role()
                    ));
                }
            }
        }
    }
    if open.is_empty() {
        Ok(())
    } else {
        Err(format!("{} tool call(s) never answered", open.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCallRequest;
    use serde_json::json;

    #[test]
    fn paired_history_is_valid() {
        let history = vec![
            Message::human("mail bob"),
            Message::ai_with_tool_calls(
                "",
                vec![
                    ToolCallRequest::new("a", "send_email", json!({})),
                    ToolCallRequest::new("b", "get_docs", json!({})),
                ],
            ),
            Message::tool_result("a", "send_email", json!("ok"), false),
            Message::tool_result("b", "get_docs", json!([]), false),
            Message::ai("done"),
        ];
        assert_eq!(validate_tool_pairing(&history), Ok(()));
    }

    #[test]
    fn unanswered_call_is_rejected() {
        let history = vec![
            Message::human("x"),
            Message::ai_with_tool_calls("", vec![ToolCallRequest::new("a", "t", json!({}))]),
            Message::ai("done"),
        ];
        assert!(validate_tool_pairing(&history).is_err());
    }

    #[test]
    fn orphan_result_is_rejected() {
        let history = vec![Message::tool_result("z", "t", json!(null), false)];
        assert!(validate_tool_pairing(&history).is_err());
    }

    #[test]
    fn truncate_and_last_reply() {
        let mut conversation = Conversation::new();
        conversation.messages_mut().push(Message::human("hi"));
        conversation.messages_mut().push(Message::ai("hello"));
        assert_eq!(conversation.last_reply().map(Message::text), Some("hello".to_string()));
        conversation.truncate(1);
        assert_eq!(conversation.len(), 1);
        assert!(conversation.last_reply().is_none());
    }
}
