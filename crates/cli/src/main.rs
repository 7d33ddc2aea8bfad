//! `ao-cli` — interactive REPL and one-shot driver for `handle_turn`, used
//! for local smoke testing against a tool registry and LLM providers
//! configured in `config.toml`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ao_core::telemetry::LocalFileSink;
use ao_core::{handle_turn, TurnContext};
use ao_domain::config::Config;

#[derive(Parser)]
#[command(name = "ao-cli", version, about = "Travel-assistant agent CLI")]
struct Cli {
    /// Path to a config.toml overlay. Missing file falls back to defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Directory telemetry (node enter/exit, interactions) is written to.
    #[arg(long, global = true, default_value = "ao-logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive REPL (default when no subcommand is given).
    Chat {
        #[arg(long, default_value = "cli-user@example.com")]
        user: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// Run exactly one turn and print the response.
    Turn {
        message: String,
        #[arg(long, default_value = "cli-user@example.com")]
        user: String,
        #[arg(long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load_from_path(&cli.config).unwrap_or_default();
    let telemetry = Arc::new(LocalFileSink::new(cli.log_dir));
    let ctx = TurnContext::new(config, telemetry)?;

    match cli.command.unwrap_or(Command::Chat { user: "cli-user@example.com".into(), session: None }) {
        Command::Chat { user, session } => chat(&ctx, &user, session.unwrap_or_else(new_session_id)).await,
        Command::Turn { message, user, session } => {
            let session = session.unwrap_or_else(new_session_id);
            let result = handle_turn(&ctx, &user, &session, &message).await?;
            println!("{}", result.response);
            Ok(())
        }
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn chat(ctx: &TurnContext, user: &str, session: String) -> anyhow::Result<()> {
    let mut rl = rustyline::DefaultEditor::new()?;
    eprintln!("travel-assistant chat — session {session}, Ctrl+D to exit");

    loop {
        let readline = rl.readline("you> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                match handle_turn(ctx, user, &session, trimmed).await {
                    Ok(result) => println!("{}\n", result.response),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Ctrl+D to exit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    eprintln!("Goodbye!");
    Ok(())
}
