//! CLI entry point for aide: argument model and the read-eval-print loop.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agent::AgentSession;
use crate::agent_loop::{LoopEvent, LoopEventSink};
use crate::config::AideConfig;
use crate::error::AideError;

/// Words that end the session.
pub const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

/// aide: a tool-calling assistant with long-term memory
#[derive(Parser, Debug, Default)]
#[command(name = "aide", version, about = "aide: tool-calling assistant with long-term memory")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tool server: a .py or .js script, or an http(s):// URL
    #[arg(short, long)]
    pub server: Option<String>,

    /// Directory holding the instruction tiers
    #[arg(short, long)]
    pub instructions: Option<PathBuf>,

    /// User whose preference tier is loaded
    #[arg(short, long)]
    pub user: Option<String>,

    /// Gemini model name
    #[arg(short, long)]
    pub model: Option<String>,
}

impl Cli {
    /// Flags take precedence over file and environment values.
    pub fn apply(&self, config: &mut AideConfig) {
        if let Some(server) = &self.server {
            config.server = Some(server.clone());
        }
        if let Some(dir) = &self.instructions {
            config.instruction_dir = dir.clone();
        }
        if let Some(user) = &self.user {
            config.user_id = user.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
    }
}

pub fn is_exit_word(input: &str) -> bool {
    EXIT_WORDS.contains(&input.trim().to_lowercase().as_str())
}

/// Shorten `text` to at most `max` bytes on a char boundary.
pub fn truncate_for_display(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Tool activity goes to stderr so replies on stdout stay clean.
pub fn console_sink() -> LoopEventSink {
    Arc::new(|event: LoopEvent| match event {
        LoopEvent::ToolStarted { call } => {
            eprintln!("⚡ {} {}", call.name, truncate_for_display(&call.arguments.to_string(), 200));
        }
        LoopEvent::ToolFinished {
            content, is_error, ..
        } => {
            let output = truncate_for_display(&content.to_string(), 200);
            if is_error {
                eprintln!("  ❌ {output}");
            } else {
                eprintln!("  ✅ {output}");
            }
        }
        _ => {}
    })
}

/// Read lines from `reader` on a detached thread.
///
/// A blocked stdin read would otherwise hold the runtime open after the user
/// leaves with Ctrl-C. The channel closes at EOF or after the first error.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Load configuration, start a session and chat until the user leaves.
pub async fn run(cli: Cli) -> Result<(), AideError> {
    let mut config = AideConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let model = Arc::new(config.gemini_model()?);
    let mut session = AgentSession::start(&config, model)
        .await?
        .with_event_sink(console_sink());
    tracing::debug!(tools = ?session.tools().names(), "session started");

    let outcome = repl(&mut session).await;
    let closed = session.shutdown().await;
    outcome.and(closed)
}

async fn repl(session: &mut AgentSession) -> Result<(), AideError> {
    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    loop {
        print!("You: ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            line = lines.recv() => line.transpose()?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!("\nBye!");
            return Ok(());
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_word(input) {
            println!("Bye!");
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });
        let result = session.run_turn(input, &cancel).await;
        watcher.abort();

        match result {
            Ok(outcome) => println!("AI: {}", outcome.reply.text()),
            Err(AideError::Cancelled(_)) => eprintln!("(cancelled)"),
            Err(e) if is_fatal(&e) => return Err(e),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
}

// Errors after which the session cannot usefully continue.
fn is_fatal(err: &AideError) -> bool {
    matches!(
        err,
        AideError::NotConnected(_) | AideError::Authentication(_) | AideError::Configuration(_)
    )
}
