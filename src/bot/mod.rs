//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Routes incoming chat text by per-chat login state
//! - `login_flow`: Phone number, verification code and sign-in steps
//! - `group_flow`: Group creation and invite links
//! - `messenger`: Outbound replies

pub mod group_flow;
pub mod login_flow;
pub mod message_handler;
pub mod messenger;

use std::sync::Arc;

use teloxide::utils::command::BotCommands;

use crate::code_relay::CodeRelay;
use crate::config::FlowSettings;
use crate::rpc::RpcClient;
use crate::session_store::SessionStore;

pub use message_handler::{handle_inbound, message_handler, Inbound, Sender};
pub use messenger::{Messenger, TelegramMessenger};

/// Commands shown in the bot's command menu
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "sign in to your Telegram account")]
    Login,
    #[command(description = "reply to someone's message to create a group with them")]
    Group(String),
    #[command(description = "abandon a login in progress")]
    Cancel,
    #[command(description = "show this text")]
    Help,
}

/// Shared state for every handler invocation
pub struct BridgeContext {
    pub rpc: Arc<RpcClient>,
    pub store: SessionStore,
    pub relay: CodeRelay,
    pub settings: FlowSettings,
    pub messenger: Arc<dyn Messenger>,
}

impl BridgeContext {
    pub fn new(
        rpc: Arc<RpcClient>,
        store: SessionStore,
        settings: FlowSettings,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            rpc,
            store,
            relay: CodeRelay::new(),
            settings,
            messenger,
        }
    }
}
