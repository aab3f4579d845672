use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use wren_core::{Jid, MediaKind};

use crate::network::{
    ChatNetwork, ContactNames, DownloadDescriptor, OutgoingMessage, QrEvent, SendReceipt,
    UploadDescriptor,
};
use crate::Result;

/// In-memory ChatNetwork for handler and messaging tests.
pub struct StubNetwork {
    pub connected: AtomicBool,
    pub logged_in: AtomicBool,
    pub device: Option<String>,
    pub groups: Mutex<HashMap<String, String>>,
    pub contacts: Mutex<HashMap<String, ContactNames>>,
    pub sent: Mutex<Vec<(Jid, OutgoingMessage)>>,
    pub uploads: Mutex<Vec<(usize, MediaKind)>>,
    pub downloads: Mutex<Vec<DownloadDescriptor>>,
    pub download_payload: Vec<u8>,
}

impl Default for StubNetwork {
    fn default() -> Self {
        Self {
            connected: AtomicBool::new(true),
            logged_in: AtomicBool::new(true),
            device: Some("me".to_string()),
            groups: Mutex::new(HashMap::new()),
            contacts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            download_payload: b"downloaded-bytes".to_vec(),
        }
    }
}

impl StubNetwork {
    pub fn set_group(&self, jid: &str, name: &str) {
        self.groups
            .lock()
            .unwrap()
            .insert(jid.to_string(), name.to_string());
    }

    pub fn set_contact(&self, jid: &str, names: ContactNames) {
        self.contacts.lock().unwrap().insert(jid.to_string(), names);
    }

    pub fn sent_messages(&self) -> Vec<(Jid, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatNetwork for StubNetwork {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    fn device_user(&self) -> Option<String> {
        self.device.clone()
    }

    async fn qr_channel(&self) -> Result<mpsc::Receiver<QrEvent>> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn group_name(&self, jid: &Jid) -> Option<String> {
        self.groups.lock().unwrap().get(&jid.to_string()).cloned()
    }

    async fn contact_names(&self, jid: &Jid) -> Option<ContactNames> {
        self.contacts.lock().unwrap().get(&jid.to_string()).cloned()
    }

    async fn upload(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<UploadDescriptor> {
        self.uploads.lock().unwrap().push((bytes.len(), kind));
        Ok(UploadDescriptor {
            url: "https://mmg.whatsapp.net/d/f/uploaded.enc?auth=1".to_string(),
            direct_path: "/d/f/uploaded.enc".to_string(),
            media_key: vec![9, 9, 9],
            file_sha256: vec![1, 1],
            file_enc_sha256: vec![2, 2],
            file_length: bytes.len() as u64,
        })
    }

    async fn download(&self, descriptor: &DownloadDescriptor) -> Result<Vec<u8>> {
        self.downloads.lock().unwrap().push(descriptor.clone());
        Ok(self.download_payload.clone())
    }

    async fn send(&self, to: &Jid, message: OutgoingMessage) -> Result<SendReceipt> {
        self.sent.lock().unwrap().push((to.clone(), message));
        Ok(SendReceipt {
            message_id: "3EB0SENT".to_string(),
            timestamp: 1_700_000_500,
        })
    }
}
