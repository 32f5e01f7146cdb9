use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use meshcall::client::{ChatHandle, MeshHandle, Session, SessionConfig, SyntheticDevices};
use meshcall::model::{ChatMessage, Participant};
use meshcall::RoomId;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshcall", version, about = "Headless mesh video call client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Join(JoinArgs),
}

#[derive(clap::Args)]
struct JoinArgs {
    #[arg(long)]
    room: String,

    #[arg(short, long)]
    username: Option<String>,

    #[arg(long, env = "MESHCALL_SIGNALING_URL")]
    signaling_url: Option<String>,

    #[arg(long, env = "MESHCALL_CHAT_URL")]
    chat_url: Option<String>,

    /// JSON file with a full session config.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Commands::Join(args) = Cli::parse().command;

    init_tracing(args.verbose);

    let config = build_config(args).await?;
    println!(
        "{}",
        format!("📞 Joining room {} as {}...", config.room_id, config.username)
            .green()
            .bold()
    );

    let session = Session::connect(config, Arc::new(SyntheticDevices::default()))
        .await
        .context("Failed to join the room")?;

    let roster = spawn_roster_printer(session.mesh().clone());
    let chat = spawn_chat_printer(session.chat().clone());

    println!(
        "{}",
        "Type to chat. Commands: /mic /cam /share /unshare /peers /leave".cyan()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&session, line.trim()).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received");
                break;
            }
        }
    }

    session.leave().await;
    roster.abort();
    chat.abort();
    println!("{}", "👋 Left the room".green().bold());
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn build_config(args: JoinArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<SessionConfig>(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };

    config.room_id = RoomId::from(args.room);
    if let Some(url) = args.signaling_url {
        config.signaling_url = url;
    }
    if let Some(url) = args.chat_url {
        config.chat_url = url;
    }
    if let Some(username) = args.username {
        config.username = username;
    }
    if config.username.trim().is_empty() {
        config.username = tokio::task::spawn_blocking(prompt_username)
            .await
            .context("Username prompt panicked")??;
    }

    Ok(config)
}

fn prompt_username() -> Result<String> {
    let username: String = Input::new()
        .with_prompt("Your name")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Name must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(username)
}

/// Returns `false` when the user asked to leave.
async fn handle_line(session: &Session, line: &str) -> bool {
    match line {
        "" => {}
        "/leave" => return false,
        "/mic" => {
            let on = session.toggle_audio();
            println!("🎙  Microphone {}", on_off(on));
        }
        "/cam" => {
            let on = session.toggle_video();
            println!("📷 Camera {}", on_off(on));
        }
        "/share" => match session.start_screen_share().await {
            Ok(stream) => println!("🖥  Sharing screen ({})", stream.id()),
            Err(e) => println!("{} {}", "Screen share failed:".red(), e),
        },
        "/unshare" => {
            session.stop_screen_share().await;
            println!("🖥  Screen share stopped");
        }
        "/peers" => print_peers(session.mesh()),
        text if text.starts_with('/') => {
            println!("{} {}", "Unknown command:".yellow(), text);
        }
        text => {
            if let Err(e) = session.send_message(text).await {
                println!("{} {}", "Message not sent:".red(), e);
            }
        }
    }
    true
}

fn on_off(on: bool) -> ColoredString {
    if on {
        "on".green()
    } else {
        "off".red()
    }
}

fn print_peers(mesh: &MeshHandle) {
    let snapshot = mesh.snapshot();
    if snapshot.participants.is_empty() {
        println!("{}", "Nobody else is here".dimmed());
        return;
    }
    for p in &snapshot.participants {
        let state = snapshot
            .link_state(&p.id)
            .map(|s| format!("{:?}", s))
            .unwrap_or_else(|| "no link".to_owned());
        println!("  {} ({}) {}", p.username.bold(), p.id, state.dimmed());
    }
}

fn spawn_roster_printer(mesh: MeshHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut rx = mesh.subscribe();
        let mut known: Vec<Participant> = Vec::new();
        let mut relay_up = false;

        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();

            if snapshot.signaling_connected != relay_up {
                relay_up = snapshot.signaling_connected;
                if !relay_up && !snapshot.left {
                    warn!("Signaling relay disconnected, reconnecting");
                    println!("{}", "⚠ Signaling relay lost, reconnecting...".yellow());
                }
            }

            for p in &snapshot.participants {
                if !known.iter().any(|k| k.id == p.id) {
                    println!("{} {} joined", "+".green().bold(), p.username.bold());
                }
            }
            for k in &known {
                if !snapshot.participants.iter().any(|p| p.id == k.id) {
                    println!("{} {} left", "-".red().bold(), k.username.bold());
                }
            }
            known = snapshot.participants;

            if snapshot.left {
                break;
            }
        }
    })
}

fn spawn_chat_printer(chat: ChatHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut rx = chat.subscribe();
        let mut printed: HashSet<String> = HashSet::new();

        while rx.changed().await.is_ok() {
            let history = rx.borrow_and_update().history.clone();
            for msg in history {
                if printed.insert(msg.id.clone()) {
                    print_message(&msg);
                }
            }
        }
    })
}

fn print_message(msg: &ChatMessage) {
    let time = msg.timestamp.format("%H:%M");
    if msg.is_system() {
        println!("{} {}", time.to_string().dimmed(), msg.text.italic().dimmed());
    } else {
        println!(
            "{} {}: {}",
            time.to_string().dimmed(),
            msg.author.cyan().bold(),
            msg.text
        );
    }
}
