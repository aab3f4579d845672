mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{eyre, Context, Result};
use tracing_subscriber::EnvFilter;

use config::Config;
use wren_db::WrenDb;
use wren_ipc::{SidecarConfig, SidecarNetwork};
use wren_media::MediaSettings;
use wren_mcp::{McpServer, ToolContext};
use wren_service::{ChatService, MessageService};
use wren_wa::{ChatNetwork, Messenger, QrEvent, SyncEngine};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cfg = Config::load();

    let mut filter = EnvFilter::builder().from_env_lossy();
    for directive in cfg.log_directives() {
        filter = filter.add_directive(directive.parse().unwrap());
    }
    // stdout carries the RPC stream; everything else goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        db_dir = %cfg.db_dir.display(),
        log_level = cfg.log_level,
        ffmpeg = %cfg.ffmpeg_path,
        "startup"
    );

    let db = Arc::new(
        WrenDb::open(&cfg.db_dir)
            .await
            .wrap_err("failed to open message store")?,
    );

    let sidecar_dir = cfg
        .sidecar_dir
        .clone()
        .or_else(find_sidecar_dir)
        .ok_or_else(|| eyre!("could not find the sidecar directory; set SIDECAR_DIR"))?;
    let sidecar_cfg = SidecarConfig::new(sidecar_dir, cfg.db_dir.clone());
    let (network, events) = SidecarNetwork::spawn(&sidecar_cfg)
        .await
        .wrap_err("failed to start the chat-network sidecar")?;

    let engine = SyncEngine::new(Arc::clone(&db), network.clone());
    tokio::spawn(engine.run(events));

    {
        let network = Arc::clone(&network);
        let qr_timeout = cfg.qr_timeout;
        tokio::spawn(async move {
            pair(network, qr_timeout).await;
        });
    }

    let messenger = Messenger::new(
        Arc::clone(&db),
        network.clone(),
        MediaSettings {
            ffmpeg_path: cfg.ffmpeg_path.clone(),
        },
        cfg.db_dir.clone(),
    );
    let server = McpServer::new(ToolContext {
        chats: ChatService::new(Arc::clone(&db)),
        messages: MessageService::new(Arc::clone(&db), messenger, network.clone()),
    });

    tokio::select! {
        result = server.run() => {
            if let Err(err) = result {
                tracing::error!(%err, "RPC loop failed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("signal received");
        }
    }

    // Shutdown order: RPC is already stopped; network, then sidecar, then store.
    network.disconnect().await;
    network.stop().await;
    db.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Connects and, for an unpaired session, streams QR codes to stderr until
/// pairing succeeds or the deadline passes.
async fn pair(network: Arc<SidecarNetwork>, timeout: Duration) {
    if let Err(err) = network.connect().await {
        tracing::error!(%err, "connect failed");
        return;
    }
    if network.is_logged_in() {
        return;
    }

    let channel = match network.qr_channel().await {
        Ok(rx) => rx,
        Err(err) => {
            tracing::warn!(%err, "could not start pairing");
            return;
        }
    };

    let mut rx = channel;
    let outcome = tokio::time::timeout(timeout, async {
        while let Some(event) = rx.recv().await {
            match event {
                QrEvent::Code(code) => print_qr(&code),
                QrEvent::Success => {
                    tracing::info!("device paired");
                    break;
                }
            }
        }
    })
    .await;

    if outcome.is_err() {
        tracing::warn!("QR pairing timed out; restart the process to pair");
    }
}

fn print_qr(code: &str) {
    match qr2term::generate_qr_string(code) {
        Ok(rendered) => eprintln!("{rendered}"),
        Err(err) => {
            tracing::warn!(%err, "failed to render QR code");
            eprintln!("QR data: {code}");
        }
    }
}

/// Walks up from the executable looking for `sidecar/package.json`, then
/// tries the working directory.
fn find_sidecar_dir() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        let mut current = exe.parent();
        while let Some(dir) = current {
            let candidate = dir.join("sidecar");
            if candidate.join("package.json").exists() {
                return Some(candidate);
            }
            current = dir.parent();
        }
    }
    let cwd = std::env::current_dir().ok()?;
    let candidate = cwd.join("sidecar");
    candidate.join("package.json").exists().then_some(candidate)
}
