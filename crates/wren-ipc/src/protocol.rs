use serde::{Deserialize, Serialize};
use wren_core::{HistorySyncEvent, MediaKind, MessageEvent};
use wren_wa::{DownloadDescriptor, OutgoingMessage};

/// One JSON line on the sidecar's stdio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub id: String,
    #[serde(flatten)]
    pub content: WireContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireContent {
    Command(SidecarCommand),
    Event(SidecarEvent),
}

impl WireMessage {
    pub fn command(id: String, command: SidecarCommand) -> Self {
        Self {
            id,
            content: WireContent::Command(command),
        }
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default() + "\n"
    }

    pub fn from_line(line: &str) -> Option<Self> {
        serde_json::from_str(line.trim()).ok()
    }
}

/// Commands the core issues to the sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SidecarCommand {
    Connect,
    Disconnect,
    StartPairing,
    GetGroupInfo { jid: String },
    GetContact { jid: String },
    Upload { data: Vec<u8>, kind: MediaKind },
    Download { descriptor: DownloadDescriptor },
    Send { to: String, message: OutgoingMessage },
    Shutdown,
}

/// Events the sidecar emits. `CommandResult` answers a prior command by id;
/// everything else is unsolicited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SidecarEvent {
    Ready,
    QrCode { code: String },
    PairingSuccess,
    Connected { device_user: Option<String> },
    Disconnected { reason: String },
    LoggedOut,
    Message(MessageEvent),
    HistorySync(HistorySyncEvent),
    CommandResult(CommandResult),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub command_id: String,
    pub success: bool,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_round_trips() {
        let msg = WireMessage::command(
            "c1".to_string(),
            SidecarCommand::GetGroupInfo {
                jid: "A@g.us".to_string(),
            },
        );
        let line = msg.to_line();
        assert!(line.ends_with('\n'));

        let parsed = WireMessage::from_line(&line).unwrap();
        assert_eq!(parsed.id, "c1");
        match parsed.content {
            WireContent::Command(SidecarCommand::GetGroupInfo { jid }) => {
                assert_eq!(jid, "A@g.us");
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn event_lines_parse() {
        let line = r#"{"id":"e1","type":"QrCode","payload":{"code":"2@abcdef"}}"#;
        let parsed = WireMessage::from_line(line).unwrap();
        match parsed.content {
            WireContent::Event(SidecarEvent::QrCode { code }) => assert_eq!(code, "2@abcdef"),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn command_result_parses_with_optional_fields() {
        let line = r#"{"id":"e2","type":"CommandResult","payload":{"command_id":"c7","success":false,"error":"upload failed"}}"#;
        let parsed = WireMessage::from_line(line).unwrap();
        match parsed.content {
            WireContent::Event(SidecarEvent::CommandResult(result)) => {
                assert_eq!(result.command_id, "c7");
                assert!(!result.success);
                assert!(result.data.is_none());
                assert_eq!(result.error.as_deref(), Some("upload failed"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn garbage_lines_are_rejected() {
        assert!(WireMessage::from_line("not json").is_none());
        assert!(WireMessage::from_line("").is_none());
    }
}
