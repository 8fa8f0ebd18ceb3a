use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::Result;
use solance_chat::clock::SystemClock;
use solance_chat::orchestrator::{ChatOrchestrator, SubmitOutcome};
use solance_cli::commands::{Command, HELP, Input, next_input};
use solance_cli::config::{self, ConfigInfo};
use solance_cli::secrets;
use solance_core::models::conversation::ConversationId;
use solance_core::models::mode::Mode;
use solance_llm::failover::FailoverClient;
use solance_llm::gemini::{DEFAULT_TIMEOUT, GeminiProvider};
use solance_llm::notify::Notifier;
use solance_storage::LocalStore;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "solance")]
#[command(about = "Terminal chat client with model and API key failover", long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for conversations and usage; overrides the config file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Mode for new conversations
    #[arg(long, default_value_t = Mode::Solance)]
    mode: Mode,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long)]
    in_memory: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // A missing .env file is normal.
    let dotenv = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let config_path = match args.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let cfg = config::load_or_init_config(&config_path)?;
    let table = secrets::endpoint_table_from_env()?;

    let data_dir = if args.in_memory {
        None
    } else {
        match args.data_dir {
            Some(dir) => Some(dir),
            None => Some(cfg.resolve_data_dir()?),
        }
    };
    let info = config::config_info(&cfg, &config_path, data_dir.as_deref(), &table);

    let store = match &data_dir {
        Some(dir) => LocalStore::open(dir),
        None => LocalStore::in_memory(),
    };

    let provider = GeminiProvider::new(&cfg.api_base_url, DEFAULT_TIMEOUT)?;
    let client = FailoverClient::new(Arc::new(provider), table);

    let (notifier, mut notices) = Notifier::channel();
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            eprintln!("  · {notice}");
        }
    });

    let orchestrator = ChatOrchestrator::new(
        Arc::new(store),
        Arc::new(SystemClock),
        client,
        notifier,
        cfg.chat_settings(),
    );

    run(&orchestrator, args.mode, &info).await
}

async fn run(orchestrator: &ChatOrchestrator, default_mode: Mode, info: &ConfigInfo) -> Result<()> {
    let conversations = orchestrator.conversations();
    let mut current = match conversations.active() {
        Some(conversation) => conversation,
        None => orchestrator.create_conversation(default_mode),
    };
    let mut mode = current.mode;
    let mut active: ConversationId = current.id;

    println!("solance · {} · /help for commands", current.title);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("[{}] > ", mode.label());
        std::io::stdout().flush()?;

        let line = match next_input(&mut lines, tokio::signal::ctrl_c()).await? {
            Input::Line(line) => line,
            Input::Eof | Input::Interrupted => {
                println!();
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match command {
            Command::Message(text) => {
                let outcome = tokio::select! {
                    outcome = orchestrator.submit(active, &text, mode) => outcome,
                    _ = tokio::signal::ctrl_c() => {
                        orchestrator.cancel(active);
                        println!("(cancelled)");
                        continue;
                    }
                };
                match outcome {
                    Ok(SubmitOutcome::Replied(message)) => {
                        let model = message.model_used.as_deref().unwrap_or("?");
                        println!("\n{}\n  [{model}]\n", message.text);
                    }
                    Ok(SubmitOutcome::Failed { message, .. }) => println!("\n! {}\n", message.text),
                    Ok(SubmitOutcome::Cancelled) => println!("(cancelled)"),
                    // The notice printer already explained why.
                    Ok(SubmitOutcome::Rejected(_)) => {}
                    Err(e) => eprintln!("{e}"),
                }
            }
            Command::New(requested) => {
                let chosen = requested.unwrap_or(mode);
                current = orchestrator.create_conversation(chosen);
                active = current.id;
                mode = chosen;
                println!("started a new {} conversation", mode.label());
            }
            Command::List => {
                for (i, conversation) in conversations.list().iter().enumerate() {
                    let marker = if conversation.id == active { '*' } else { ' ' };
                    println!(
                        "{marker}{:>3}. {} [{}] {} messages",
                        i + 1,
                        conversation.title,
                        conversation.mode.label(),
                        conversation.messages.len()
                    );
                }
            }
            Command::Switch(position) => match conversations.list().into_iter().nth(position - 1) {
                Some(conversation) => {
                    conversations.set_active(conversation.id)?;
                    active = conversation.id;
                    mode = conversation.mode;
                    println!("switched to {}", conversation.title);
                    for message in &conversation.messages {
                        println!("  {:?}: {}", message.role, message.text);
                    }
                    current = conversation;
                }
                None => eprintln!("no conversation #{position}"),
            },
            Command::Delete(position) => match conversations.list().into_iter().nth(position - 1) {
                Some(conversation) => {
                    orchestrator.delete_conversation(conversation.id);
                    println!("deleted {}", conversation.title);
                    if conversation.id == active {
                        current = match conversations.active() {
                            Some(next) => next,
                            None => orchestrator.create_conversation(mode),
                        };
                        active = current.id;
                        mode = current.mode;
                        println!("now in {}", current.title);
                    }
                }
                None => eprintln!("no conversation #{position}"),
            },
            Command::Mode(next) => {
                mode = next;
                println!("mode set to {}", mode.label());
            }
            Command::Rename(title) => match conversations.rename(active, &title) {
                Ok(renamed) => {
                    println!("renamed to {}", renamed.title);
                    current = renamed;
                }
                Err(e) => eprintln!("{e}"),
            },
            Command::Usage => {
                let usage = orchestrator.usage();
                let minutes = usage.resets_in.as_secs().max(0) / 60;
                println!(
                    "{}/{} messages today, {} left, resets in {}h {:02}m",
                    usage.count,
                    usage.limit,
                    usage.remaining,
                    minutes / 60,
                    minutes % 60
                );
            }
            Command::Config => println!("{}", serde_json::to_string_pretty(info)?),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    tracing::debug!(conversation = %current.id, "exiting");
    Ok(())
}
