use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jonda_chat::config::DeviceKind;
use jonda_chat::{
    create_router, reply, AppState, Config, ConversationRuntime, ConversationSession,
    DeviceEvent, ManualCaptureDevice, ManualDeviceHandle, MessageId, MessageKind,
    NatsCaptureDevice, Sender, SessionHandle, SpeechCaptureDevice,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jonda-chat")]
#[command(about = "Chatbot conversation service with voice capture")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/jonda-chat")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the chat HTTP API
    Serve,
    /// Chat in the terminal
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Jonda Chat v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    match args.command {
        Command::Serve => serve(cfg).await,
        Command::Chat => chat(cfg).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let reply_source = reply::from_config(&cfg.reply)?;
    let state = AppState::new(
        reply_source,
        cfg.chat.welcome_message.clone(),
        cfg.speech.capture_options(),
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")
}

async fn chat(cfg: Config) -> Result<()> {
    let reply_source = reply::from_config(&cfg.reply)?;
    let chat_id = format!("chat-{}", uuid::Uuid::new_v4());

    let (device, events, manual): (
        Box<dyn SpeechCaptureDevice>,
        mpsc::Receiver<DeviceEvent>,
        Option<ManualDeviceHandle>,
    ) = match cfg.speech.device {
        DeviceKind::Manual => {
            let (device, handle, events) = ManualCaptureDevice::new(32);
            (Box::new(device) as Box<dyn SpeechCaptureDevice>, events, Some(handle))
        }
        DeviceKind::Nats => {
            let (device, events) =
                NatsCaptureDevice::connect(&cfg.speech.nats_url, chat_id.clone())
                    .await
                    .context("Failed to connect capture device")?;
            (Box::new(device) as Box<dyn SpeechCaptureDevice>, events, None)
        }
    };

    let session = ConversationRuntime::spawn(
        ConversationSession::new(cfg.chat.welcome_message.clone()),
        reply_source,
        device,
        events,
        cfg.speech.capture_options(),
    );

    info!("Chat {} started", chat_id);
    println!("Type a message, or /listen /stop /say <text> /end /quit");

    let printer = tokio::spawn(print_updates(session.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/listen", _) => session.start_capture().await?,
            ("/stop", _) => session.stop_capture().await?,
            ("/say", text) => match &manual {
                Some(device) => {
                    device
                        .emit(DeviceEvent::Result {
                            transcript: text.to_string(),
                            is_final: false,
                        })
                        .await?
                }
                None => warn!("/say needs the manual capture device"),
            },
            ("/end", _) => match &manual {
                Some(device) => device.emit(DeviceEvent::End).await?,
                None => warn!("/end needs the manual capture device"),
            },
            _ => session.submit_text(line).await?,
        }
    }

    session.close().await?;
    printer.abort();

    Ok(())
}

/// Print new messages and voice transcript edits as they happen
async fn print_updates(session: SessionHandle) {
    let mut seen: HashMap<MessageId, String> = HashMap::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        ticker.tick().await;

        let Ok(snapshot) = session.snapshot().await else {
            break;
        };

        for msg in &snapshot.messages {
            if seen.get(&msg.id()).map(String::as_str) == Some(msg.body()) {
                continue;
            }

            let who = match msg.sender() {
                Sender::Local => "you",
                Sender::Remote => "bot",
            };
            let mic = if msg.kind() == MessageKind::Voice { " [mic]" } else { "" };
            let edited = if seen.contains_key(&msg.id()) { " (edited)" } else { "" };

            println!(
                "[{}] {}{}{}: {}",
                msg.created_at().format("%H:%M"),
                who,
                mic,
                edited,
                msg.body()
            );
            seen.insert(msg.id(), msg.body().to_string());
        }
    }
}
