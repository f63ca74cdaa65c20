mod common;

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use aide::agent::{validate_tool_pairing, AgentSession};
use aide::config::AideConfig;
use aide::error::AideError;
use aide::instructions::{InstructionCompiler, InstructionSources};
use aide::memory::{FactStore, HashEmbedder};
use aide::tools::builtin::memory_tools;
use aide::tools::ToolRegistry;
use aide::types::{Message, Role};

use common::{string_schema, tool_calls, ScriptedModel, ScriptedTransport};

struct Fixture {
    _dir: tempfile::TempDir,
    model: Arc<ScriptedModel>,
    transport: Arc<ScriptedTransport>,
    session: AgentSession,
}

async fn fixture(responses: Vec<Message>, transport: ScriptedTransport) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        FactStore::open(dir.path().join("facts.jsonl"), Arc::new(HashEmbedder::default()))
            .await
            .unwrap(),
    );
    let sources = InstructionSources::new(dir.path().join("instruction"), "user1");

    let mut registry = ToolRegistry::new();
    for tool in memory_tools(Arc::clone(&store), sources.clone()) {
        registry.register_native(tool).unwrap();
    }
    let transport = Arc::new(transport);
    registry
        .load_remote(transport.schemas(), transport.clone())
        .unwrap();

    let model = Arc::new(ScriptedModel::new(responses));
    let compiler = InstructionCompiler::new(sources).with_fact_store(store);
    let session = AgentSession::from_parts(model.clone(), registry, compiler, Some(transport.clone()));
    Fixture {
        _dir: dir,
        model,
        transport,
        session,
    }
}

fn mail_transport() -> ScriptedTransport {
    ScriptedTransport::new(vec![
        string_schema("send_email", "the user wants to send an email", &["to", "body"]),
        // Shadowed by the native tool of the same name.
        string_schema("update_user_fact", "remote copy", &["fact"]),
    ])
}

#[tokio::test]
async fn domain_section_lists_native_and_remote_tools() {
    let mut fx = fixture(vec![Message::ai("hi")], mail_transport()).await;
    fx.session
        .run_turn("hello", &CancellationToken::new())
        .await
        .unwrap();

    let prompt = fx.model.system_prompt(0);
    assert!(prompt.contains("- Use tool `update_user_fact` when: Store a fact about the user in persistent memory\n"));
    assert!(prompt.contains("- Use tool `send_email` when: the user wants to send an email\n"));
    assert!(!prompt.contains("remote copy"));

    let names: Vec<String> = fx.model.tools_seen()[0].iter().map(|d| d.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            "update_user_fact",
            "query_user_fact",
            "update_user_preferences",
            "send_email",
        ]
    );
    fx.session.shutdown().await.unwrap();
}

#[tokio::test]
async fn facts_saved_in_one_turn_are_recalled_in_the_next() {
    let mut fx = fixture(
        vec![
            tool_calls(&[(
                "c1",
                "update_user_fact",
                json!({"fact": "thích sushi", "category": "preference"}),
            )]),
            Message::ai("Noted!"),
            tool_calls(&[(
                "c2",
                "query_user_fact",
                json!({"query": "sushi", "category": "preference"}),
            )]),
            Message::ai("You like sushi."),
        ],
        mail_transport(),
    )
    .await;
    let cancel = CancellationToken::new();

    fx.session.run_turn("I like sushi", &cancel).await.unwrap();
    assert_eq!(
        fx.session.history()[2],
        Message::tool_result(
            "c1",
            "update_user_fact",
            json!("Fact saved under category 'preference'."),
            false
        )
    );

    // The preference now shows up in the user tier of the next prompt.
    let outcome = fx.session.run_turn("what do I like?", &cancel).await.unwrap();
    assert_eq!(outcome.reply.text(), "You like sushi.");
    assert!(fx.model.system_prompt(2).ends_with("### User Instructions:\n- thích sushi\n"));

    let recalled = &fx.session.history()[6];
    assert_eq!(recalled.role(), Role::Tool);
    assert_eq!(recalled.text(), r#"["thích sushi"]"#);
    assert_eq!(validate_tool_pairing(fx.session.history()), Ok(()));
    assert!(fx.transport.calls().is_empty());
}

#[tokio::test]
async fn failed_turn_leaves_history_untouched() {
    // Script runs dry on the second model call of the second turn.
    let mut fx = fixture(
        vec![
            Message::ai("first answer"),
            tool_calls(&[("c1", "send_email", json!({"to": "a@b.c", "body": "x"}))]),
        ],
        mail_transport(),
    )
    .await;
    let cancel = CancellationToken::new();

    fx.session.run_turn("one", &cancel).await.unwrap();
    let err = fx.session.run_turn("two", &cancel).await.unwrap_err();

    assert!(matches!(err, AideError::InvalidState(_)));
    assert_eq!(fx.session.history().len(), 2);
    assert_eq!(fx.session.history()[1], Message::ai("first answer"));
    assert_eq!(fx.transport.call_names(), vec!["send_email"]);
}

#[tokio::test]
async fn shutdown_closes_transport_once_and_blocks_turns() {
    let mut fx = fixture(vec![Message::ai("hi")], mail_transport()).await;

    fx.session.shutdown().await.unwrap();
    fx.session.shutdown().await.unwrap();
    assert_eq!(fx.transport.close_count(), 1);
    assert!(fx.session.is_closed());

    let err = fx
        .session
        .run_turn("hello?", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AideError::InvalidState(_)));
    assert!(fx.session.history().is_empty());
    assert_eq!(fx.model.call_count(), 0);
}

fn local_config(dir: &std::path::Path) -> AideConfig {
    AideConfig {
        instruction_dir: dir.join("instruction"),
        fact_store_path: dir.join("facts.jsonl"),
        ..AideConfig::default()
    }
}

#[tokio::test]
async fn start_without_server_registers_memory_tools() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(ScriptedModel::new(vec![Message::ai("ready")]));
    let mut session = AgentSession::start(&local_config(dir.path()), model.clone())
        .await
        .unwrap();

    assert_eq!(
        session.tools().names(),
        vec!["update_user_fact", "query_user_fact", "update_user_preferences"]
    );
    let outcome = session
        .run_turn("hi", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.reply.text(), "ready");
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn start_rejects_unsupported_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let config = AideConfig {
        server: Some("ftp://tools.example.com".into()),
        ..local_config(dir.path())
    };
    let model = Arc::new(ScriptedModel::new(vec![]));

    let err = AgentSession::start(&config, model).await.unwrap_err();
    assert!(matches!(err, AideError::Connection(_)));
}
