//! chatrelay terminal chat.
//!
//! - Config: `CHATRELAY_CONFIG` (default `chatrelay.yaml`), falls back to built-in defaults
//! - stdin lines are parsed by `input::parse_line` on their own task
//! - Events are printed as they arrive; received media is saved under `media/`

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use chatrelay_client::config::{self, ChatConfig, UpstreamConfig};
use chatrelay_client::input::{parse_line, Command};
use chatrelay_client::{ClientEvent, RelayClient};
use chatrelay_core::error::Result;
use chatrelay_core::protocol::Value;

const MEDIA_DIR: &str = "media";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), error = %e, "chat exited");
        std::process::exit(1);
    }
}

fn load_config() -> Result<ChatConfig> {
    let path = std::env::var("CHATRELAY_CONFIG").unwrap_or_else(|_| "chatrelay.yaml".into());
    if Path::new(&path).exists() {
        return config::load_from_file(&path);
    }
    tracing::info!(%path, "no config file, using defaults");
    let cfg = ChatConfig { version: 1, upstream: UpstreamConfig::default() };
    cfg.validate()?;
    Ok(cfg)
}

async fn run() -> Result<()> {
    let cfg = load_config()?;
    let client = RelayClient::with_options(cfg.upstream.username.clone(), cfg.upstream.client_options());
    let mut events = client.connect(&cfg.upstream.url).await?;

    println!("Chat started. Type 'dest:message' to send (e.g. SERVER:hello)");
    println!("'img:dest:path', 'audio:dest:path' or 'video:dest:path' to send media");
    println!("'file:dest:path' to send media typed by its extension");
    println!("'disconnect' to quit.");

    tokio::spawn(input_loop(client.clone()));

    while let Some(ev) = events.recv().await {
        match ev {
            ClientEvent::Opened => println!("[open] connected as {}", client.username()),
            ClientEvent::Message(env) => {
                let shown = match &env.value {
                    Value::Text(s) => s.clone(),
                    Value::Record(v) => v.to_string(),
                };
                println!("[{}] {}", env.emitter, shown);
            }
            ClientEvent::Media { tag, emitter, data, extension } => {
                match save_media(tag.label(), extension, &data).await {
                    Ok(path) => println!("[{emitter}] {} saved to {}", tag.label(), path.display()),
                    Err(e) => tracing::warn!(error = %e, "saving media failed"),
                }
            }
            ClientEvent::Error(e) => println!("[error] {e}"),
            ClientEvent::Closed { code, reason } => {
                println!("[close] code={code:?} msg={reason}");
                break;
            }
        }
    }
    Ok(())
}

async fn input_loop(client: RelayClient) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while client.is_connected() {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };

        let res = match parse_line(&line) {
            None => continue,
            Some(Command::Disconnect) => {
                let _ = client.disconnect().await;
                break;
            }
            Some(Command::Usage(usage)) => {
                println!("Format: {usage}");
                continue;
            }
            Some(Command::Text { dest, body }) => client.send_text(&dest, &body).await,
            Some(Command::File { dest, path }) => match client.send_file(&dest, &path).await {
                Ok(tag) => {
                    println!("{} sent to {dest}", tag.label());
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Some(Command::Media { tag, dest, path }) => {
                let sent = client.send_file_as(tag, &dest, &path).await;
                if sent.is_ok() {
                    println!("{} sent to {dest}", tag.label());
                }
                sent
            }
        };

        if let Err(e) = res {
            println!("[error] {e}");
        }
    }
}

async fn save_media(label: &str, extension: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(MEDIA_DIR).await?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let path = Path::new(MEDIA_DIR).join(format!("{label}_{stamp}.{extension}"));
    tokio::fs::write(&path, data).await?;
    Ok(path)
}
