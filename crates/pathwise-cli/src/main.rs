mod config;

use crate::config::PathwiseConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use pathwise_agent::ModelConfig;
use pathwise_core::Record;
use pathwise_orchestrator::{CreateSessionRequest, NextResponse, Orchestrator};
use pathwise_session::FileSessionStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pathwise", about = "Pathwise: guided learning from your own study records")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "pathwise.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a new session from a JSON array of records
    Create {
        #[arg(long)]
        records: PathBuf,
        #[arg(long)]
        notebook_id: Option<String>,
        #[arg(long)]
        notebook_name: Option<String>,
    },
    /// Show the first knowledge point
    Start { session_id: String },
    /// Ask about the current knowledge point
    Chat { session_id: String, message: String },
    /// Regenerate the current page from a problem description
    FixHtml {
        session_id: String,
        description: String,
    },
    /// Move to the next knowledge point, or finish
    Next { session_id: String },
    /// Print the stored session
    Show { session_id: String },
    /// Print or write the current page
    Html {
        session_id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored sessions
    List,
    /// Walk through a sample session offline
    Demo,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_records(path: &Path) -> anyhow::Result<Vec<Record>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read records file '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| {
        format!(
            "Records file '{}' is not a JSON array of records",
            path.display()
        )
    })
}

async fn build_orchestrator(config: PathwiseConfig) -> anyhow::Result<Orchestrator> {
    config.model.validate()?;
    let store = FileSessionStore::new(config.sessions_dir()).await?;
    info!(
        dir = %store.dir().display(),
        provider = ?config.model.provider,
        model = %config.model.model_id,
        "Session store ready"
    );
    Ok(Orchestrator::with_model(Arc::new(store), config.model, config.guide))
}

const DEMO_RECORDS: &str = r#"[
  {"id": "r1", "type": "question", "title": "Vectors",
   "user_query": "What does it mean to add two vectors?",
   "output": "Add them component by component; geometrically, place them tip to tail."},
  {"id": "r2", "type": "solve", "title": "Dot product",
   "user_query": "Compute (1,2)·(3,4) and explain what the number means.",
   "output": "1*3 + 2*4 = 11. It measures how much the vectors point the same way."},
  {"id": "r3", "type": "research", "title": "Projection",
   "user_query": "How do I project one vector onto another?",
   "output": "proj_b(a) = (a·b / b·b) b, which uses the dot product from before."}
]"#;

/// Full create → start → chat → next walk with the demo provider in a
/// throwaway directory.
async fn run_demo(guide: pathwise_orchestrator::GuideConfig) -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileSessionStore::new(dir.path().join("sessions")).await?;
    let orchestrator = Orchestrator::with_model(Arc::new(store), ModelConfig::demo(), guide);

    let records: Vec<Record> = serde_json::from_str(DEMO_RECORDS)?;
    let request =
        CreateSessionRequest::new(records).with_notebook("demo", "Linear algebra basics");
    let created = orchestrator.create_session(request).await?;
    print_json(&created)?;
    let id = created.session_id;

    let started = orchestrator.start(&id).await?;
    println!("{}", started.message);
    print_json(&orchestrator.chat(&id, "Can you give me one more example?").await?)?;

    loop {
        match orchestrator.next(&id).await? {
            NextResponse::Learning { message, .. } => {
                println!("{message}");
                let answer = orchestrator
                    .chat(&id, "How does this connect to the previous point?")
                    .await?;
                print_json(&answer)?;
            }
            completed @ NextResponse::Completed { .. } => {
                print_json(&completed)?;
                break;
            }
        }
    }

    let session = orchestrator.get_session(&id).await?;
    info!(
        session_id = %id,
        messages = session.chat_history.len(),
        "Demo finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = PathwiseConfig::load(&cli.config).await?;

    match cli.command {
        Commands::Demo => run_demo(config.guide).await?,
        Commands::Create {
            records,
            notebook_id,
            notebook_name,
        } => {
            let records = read_records(&records).await?;
            let orchestrator = build_orchestrator(config).await?;
            let request = CreateSessionRequest {
                records,
                notebook_id,
                notebook_name,
            };
            print_json(&orchestrator.create_session(request).await?)?;
        }
        Commands::Start { session_id } => {
            let orchestrator = build_orchestrator(config).await?;
            print_json(&orchestrator.start(&session_id).await?)?;
        }
        Commands::Chat {
            session_id,
            message,
        } => {
            let orchestrator = build_orchestrator(config).await?;
            print_json(&orchestrator.chat(&session_id, &message).await?)?;
        }
        Commands::FixHtml {
            session_id,
            description,
        } => {
            let orchestrator = build_orchestrator(config).await?;
            print_json(&orchestrator.fix_html(&session_id, &description).await?)?;
        }
        Commands::Next { session_id } => {
            let orchestrator = build_orchestrator(config).await?;
            print_json(&orchestrator.next(&session_id).await?)?;
        }
        Commands::Show { session_id } => {
            let orchestrator = build_orchestrator(config).await?;
            print_json(&orchestrator.get_session(&session_id).await?)?;
        }
        Commands::Html { session_id, out } => {
            let orchestrator = build_orchestrator(config).await?;
            let html = orchestrator.current_html(&session_id).await?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, html)
                        .await
                        .with_context(|| format!("Failed to write '{}'", path.display()))?;
                    info!(path = %path.display(), "Page written");
                }
                None => println!("{html}"),
            }
        }
        Commands::List => {
            let orchestrator = build_orchestrator(config).await?;
            print_json(&orchestrator.list_sessions().await?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["pathwise", "chat", "abc-123", "what is a basis?"]);
        match cli.command {
            Commands::Chat {
                session_id,
                message,
            } => {
                assert_eq!(session_id, "abc-123");
                assert_eq!(message, "what is a basis?");
            }
            _ => panic!("expected chat"),
        }
        assert_eq!(cli.config, PathBuf::from("pathwise.toml"));

        let cli = Cli::parse_from(["pathwise", "--json-logs", "fix-html", "id", "button broken"]);
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::FixHtml { .. }));
    }

    #[test]
    fn test_demo_records_parse() {
        let records: Vec<Record> = serde_json::from_str(DEMO_RECORDS).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].kind_label(), "solve");
    }

    #[tokio::test]
    async fn test_demo_runs_offline() {
        run_demo(pathwise_orchestrator::GuideConfig::default())
            .await
            .unwrap();
    }
}
