use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use wren_core::{Jid, MediaKind, NetworkEvent};
use wren_wa::{
    ChatNetwork, ContactNames, DownloadDescriptor, OutgoingMessage, QrEvent, SendReceipt,
    UploadDescriptor, WaError,
};

use crate::error::IpcError;
use crate::process::ProcessHandle;
use crate::protocol::{CommandResult, SidecarCommand, SidecarEvent, WireContent, WireMessage};

/// Uploads and downloads can take a while on slow links.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// How to launch the chat-network sidecar process.
#[derive(Debug, Clone)]
pub struct SidecarConfig {
    /// Directory holding the sidecar project.
    pub dir: PathBuf,
    pub command: String,
    pub args: Vec<String>,
    /// Where the sidecar keeps its own session store (`whatsapp.db`).
    pub data_dir: PathBuf,
}

impl SidecarConfig {
    pub fn new(dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            dir,
            command: "bun".to_string(),
            args: vec!["run".to_string(), "index.ts".to_string()],
            data_dir,
        }
    }
}

/// ChatNetwork implementation backed by a sidecar process speaking
/// JSON-lines over stdio. Commands are correlated with their results by id;
/// unsolicited events are translated onto the engine's event channel.
pub struct SidecarNetwork {
    writer: mpsc::Sender<String>,
    event_tx: mpsc::Sender<NetworkEvent>,
    process: tokio::sync::Mutex<Option<ProcessHandle>>,
    pending: Mutex<HashMap<String, oneshot::Sender<CommandResult>>>,
    next_id: AtomicU64,
    connected: AtomicBool,
    logged_in: AtomicBool,
    device_user: Mutex<Option<String>>,
    qr_tx: Mutex<Option<mpsc::Sender<QrEvent>>>,
}

impl SidecarNetwork {
    /// Spawns the sidecar and starts the event pump. Returns the network
    /// handle plus the stream the sync engine consumes.
    pub async fn spawn(
        config: &SidecarConfig,
    ) -> crate::Result<(Arc<Self>, mpsc::Receiver<NetworkEvent>)> {
        let (line_tx, line_rx) = mpsc::channel::<String>(1024);
        let envs = vec![(
            "WREN_DATA_DIR".to_string(),
            config.data_dir.display().to_string(),
        )];
        let handle = ProcessHandle::spawn(
            &config.dir,
            &config.command,
            &config.args,
            &envs,
            line_tx,
        )
        .await?;

        let (network, event_rx) = Self::build(handle.stdin_sender(), Some(handle));
        network.clone().start_pump(line_rx);
        tracing::info!(dir = %config.dir.display(), "sidecar started");
        Ok((network, event_rx))
    }

    fn build(
        writer: mpsc::Sender<String>,
        process: Option<ProcessHandle>,
    ) -> (Arc<Self>, mpsc::Receiver<NetworkEvent>) {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let network = Arc::new(Self {
            writer,
            event_tx,
            process: tokio::sync::Mutex::new(process),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            connected: AtomicBool::new(false),
            logged_in: AtomicBool::new(false),
            device_user: Mutex::new(None),
            qr_tx: Mutex::new(None),
        });
        (network, event_rx)
    }

    fn start_pump(self: Arc<Self>, mut line_rx: mpsc::Receiver<String>) {
        tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                self.handle_line(&line).await;
            }
            tracing::debug!("sidecar stdout closed");
        });
    }

    async fn handle_line(&self, line: &str) {
        let Some(message) = WireMessage::from_line(line) else {
            if !line.trim().is_empty() {
                tracing::debug!(%line, "unparsable sidecar line");
            }
            return;
        };
        let WireContent::Event(event) = message.content else {
            tracing::debug!("ignoring command echoed by sidecar");
            return;
        };

        match event {
            SidecarEvent::Ready => tracing::debug!("sidecar ready"),
            SidecarEvent::QrCode { code } => {
                let tx = self.qr_tx.lock().unwrap().clone();
                if let Some(tx) = tx {
                    let _ = tx.send(QrEvent::Code(code)).await;
                }
            }
            SidecarEvent::PairingSuccess => {
                self.logged_in.store(true, Ordering::SeqCst);
                let tx = self.qr_tx.lock().unwrap().take();
                if let Some(tx) = tx {
                    let _ = tx.send(QrEvent::Success).await;
                }
            }
            SidecarEvent::Connected { device_user } => {
                self.connected.store(true, Ordering::SeqCst);
                if device_user.is_some() {
                    self.logged_in.store(true, Ordering::SeqCst);
                }
                *self.device_user.lock().unwrap() = device_user;
                self.forward(NetworkEvent::Connected).await;
            }
            SidecarEvent::Disconnected { reason } => {
                self.connected.store(false, Ordering::SeqCst);
                tracing::warn!(%reason, "sidecar disconnected");
            }
            SidecarEvent::LoggedOut => {
                self.logged_in.store(false, Ordering::SeqCst);
                self.forward(NetworkEvent::LoggedOut).await;
            }
            SidecarEvent::Message(ev) => self.forward(NetworkEvent::Message(ev)).await,
            SidecarEvent::HistorySync(ev) => self.forward(NetworkEvent::HistorySync(ev)).await,
            SidecarEvent::CommandResult(result) => {
                let waiter = self.pending.lock().unwrap().remove(&result.command_id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(result);
                    }
                    None => tracing::debug!(id = %result.command_id, "result for unknown command"),
                }
            }
        }
    }

    async fn forward(&self, event: NetworkEvent) {
        if self.event_tx.send(event).await.is_err() {
            tracing::debug!("engine event channel closed");
        }
    }

    async fn request(&self, command: SidecarCommand) -> crate::Result<CommandResult> {
        let id = format!("c{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id.clone(), tx);

        let line = WireMessage::command(id.clone(), command).to_line();
        if self.writer.send(line).await.is_err() {
            self.pending.lock().unwrap().remove(&id);
            return Err(IpcError::ProcessNotRunning);
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(IpcError::ChannelClosed),
            Err(_) => {
                self.pending.lock().unwrap().remove(&id);
                Err(IpcError::Timeout)
            }
        }
    }

    async fn expect_ok(&self, command: SidecarCommand) -> Result<CommandResult, WaError> {
        let result = self.request(command).await?;
        if !result.success {
            return Err(WaError::Network(
                result.error.unwrap_or_else(|| "sidecar command failed".to_string()),
            ));
        }
        Ok(result)
    }

    async fn expect_data(&self, command: SidecarCommand) -> Result<serde_json::Value, WaError> {
        let result = self.expect_ok(command).await?;
        result
            .data
            .ok_or_else(|| WaError::Network("sidecar result carried no data".to_string()))
    }

    /// Stops the sidecar: best-effort Shutdown command, then kill.
    pub async fn stop(&self) {
        let _ = self.request(SidecarCommand::Shutdown).await;
        if let Some(mut process) = self.process.lock().await.take() {
            let _ = process.kill().await;
        }
    }
}

#[async_trait]
impl ChatNetwork for SidecarNetwork {
    async fn connect(&self) -> Result<(), WaError> {
        self.expect_ok(SidecarCommand::Connect).await?;
        Ok(())
    }

    async fn disconnect(&self) {
        let _ = self.request(SidecarCommand::Disconnect).await;
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    fn device_user(&self) -> Option<String> {
        self.device_user.lock().unwrap().clone()
    }

    async fn qr_channel(&self) -> Result<mpsc::Receiver<QrEvent>, WaError> {
        let (tx, rx) = mpsc::channel(16);
        *self.qr_tx.lock().unwrap() = Some(tx);
        self.expect_ok(SidecarCommand::StartPairing).await?;
        Ok(rx)
    }

    async fn group_name(&self, jid: &Jid) -> Option<String> {
        let data = self
            .expect_data(SidecarCommand::GetGroupInfo {
                jid: jid.to_string(),
            })
            .await
            .ok()?;
        data.get("name")
            .and_then(|v| v.as_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }

    async fn contact_names(&self, jid: &Jid) -> Option<ContactNames> {
        let data = self
            .expect_data(SidecarCommand::GetContact {
                jid: jid.to_string(),
            })
            .await
            .ok()?;
        serde_json::from_value(data).ok()
    }

    async fn upload(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<UploadDescriptor, WaError> {
        let data = self
            .expect_data(SidecarCommand::Upload { data: bytes, kind })
            .await?;
        serde_json::from_value(data)
            .map_err(|e| WaError::Network(format!("bad upload descriptor: {e}")))
    }

    async fn download(&self, descriptor: &DownloadDescriptor) -> Result<Vec<u8>, WaError> {
        let data = self
            .expect_data(SidecarCommand::Download {
                descriptor: descriptor.clone(),
            })
            .await?;
        let bytes = data
            .get("data")
            .cloned()
            .ok_or_else(|| WaError::Network("download result carried no bytes".to_string()))?;
        serde_json::from_value(bytes)
            .map_err(|e| WaError::Network(format!("bad download payload: {e}")))
    }

    async fn send(&self, to: &Jid, message: OutgoingMessage) -> Result<SendReceipt, WaError> {
        let data = self
            .expect_data(SidecarCommand::Send {
                to: to.to_string(),
                message,
            })
            .await?;
        serde_json::from_value(data)
            .map_err(|e| WaError::Network(format!("bad send receipt: {e}")))
    }
}
