#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::ChatId;

use introlink::bot::{BridgeContext, Inbound, Messenger, Sender};
use introlink::config::FlowSettings;
use introlink::dialogue::{LoginDialogue, LoginState};
use introlink::rpc::{RpcClient, RpcError, Transport};
use introlink::session_store::SessionStore;

/// One request seen by the fake transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub dc_id: u32,
    pub method: String,
    pub params: Value,
}

/// Transport that answers from per-method scripts and records every call
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, VecDeque<Result<Value, RpcError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    installed: Mutex<Vec<Value>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, method: &str, response: Result<Value, RpcError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.method == method).collect()
    }

    pub fn installed_sessions(&self) -> Vec<Value> {
        self.installed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn invoke(&self, dc_id: u32, method: &str, params: &Value) -> Result<Value, RpcError> {
        self.calls.lock().unwrap().push(RecordedCall {
            dc_id,
            method: method.to_string(),
            params: params.clone(),
        });
        self.scripts
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(RpcError::remote(500, "NO_SCRIPTED_RESPONSE")))
    }

    async fn install_session(&self, session: &Value) {
        self.installed.lock().unwrap().push(session.clone());
    }
}

/// One outbound reply, with the session file contents at the moment it was sent
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub session_snapshot: Option<String>,
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    probe: Option<PathBuf>,
}

impl RecordingMessenger {
    pub fn with_probe(path: PathBuf) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            probe: Some(path),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }

    /// Poll until at least `count` replies were sent
    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        for _ in 0..200 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.texts()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: ChatId, text: String) -> anyhow::Result<()> {
        let session_snapshot = self
            .probe
            .as_ref()
            .and_then(|path| std::fs::read_to_string(path).ok());
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text,
            session_snapshot,
        });
        Ok(())
    }
}

pub struct Harness {
    pub ctx: Arc<BridgeContext>,
    pub transport: Arc<FakeTransport>,
    pub messenger: Arc<RecordingMessenger>,
    pub storage: Arc<InMemStorage<LoginState>>,
    pub session_path: PathBuf,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(FlowSettings {
            code_wait: Duration::from_secs(5),
            promo_text: None,
        })
    }

    pub fn with_settings(settings: FlowSettings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let session_path = dir.path().join("session_data.json");
        let transport = FakeTransport::new();
        let messenger = Arc::new(RecordingMessenger::with_probe(session_path.clone()));
        let rpc = Arc::new(RpcClient::new(transport.clone(), 2));
        let ctx = Arc::new(BridgeContext::new(
            rpc,
            SessionStore::new(&session_path),
            settings,
            messenger.clone(),
        ));

        Self {
            ctx,
            transport,
            messenger,
            storage: InMemStorage::new(),
            session_path,
            _dir: dir,
        }
    }

    pub fn dialogue(&self, chat_id: i64) -> LoginDialogue {
        LoginDialogue::new(self.storage.clone(), ChatId(chat_id))
    }

    pub async fn state(&self, chat_id: i64) -> LoginState {
        self.dialogue(chat_id).get().await.unwrap().unwrap_or_default()
    }

    /// Send plain text from user 100 in `chat_id`
    pub async fn say(&self, chat_id: i64, text: &str) {
        self.deliver(text_message(chat_id, text)).await;
    }

    pub async fn deliver(&self, inbound: Inbound) {
        let dialogue = self.dialogue(inbound.chat_id.0);
        introlink::bot::handle_inbound(self.ctx.clone(), dialogue, inbound)
            .await
            .unwrap();
    }
}

pub fn text_message(chat_id: i64, text: &str) -> Inbound {
    Inbound {
        chat_id: ChatId(chat_id),
        text: text.to_string(),
        sender: Some(Sender {
            id: 100,
            first_name: "Alice".to_string(),
        }),
        reply_target: None,
    }
}
