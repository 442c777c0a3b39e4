//! Message Handler module: the single entry point for inbound chat text

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use crate::dialogue::{classify, Input, LoginDialogue};
use crate::localization::t;

use super::group_flow::handle_group_command;
use super::login_flow::{accept_code, cancel_login, request_code, start_login};
use super::BridgeContext;

/// Sender of an inbound message
#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
}

/// The parts of a Telegram message the bridge routes on
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub chat_id: ChatId,
    pub text: String,
    pub sender: Option<Sender>,
    /// Author of the message this one replies to
    pub reply_target: Option<i64>,
}

impl Inbound {
    pub fn from_message(msg: &Message) -> Self {
        let sender = msg.from.as_ref().map(|user| Sender {
            id: user.id.0 as i64,
            first_name: user.first_name.clone(),
        });
        let reply_target = msg
            .reply_to_message()
            .and_then(|replied| replied.from.as_ref())
            .map(|user| user.id.0 as i64);

        Self {
            chat_id: msg.chat.id,
            text: msg.text().unwrap_or_default().to_string(),
            sender,
            reply_target,
        }
    }
}

fn help_text() -> String {
    [t("help-title"), t("help-login"), t("help-group"), t("help-cancel")].join("\n")
}

/// Route one inbound message according to the chat's login state
pub async fn handle_inbound(
    ctx: Arc<BridgeContext>,
    dialogue: LoginDialogue,
    inbound: Inbound,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();
    let input = classify(&inbound.text, &state);
    debug!(chat_id = %inbound.chat_id, state = ?state, input = ?input, "Routing inbound message");

    match input {
        Input::Login => start_login(&ctx, &dialogue).await,
        Input::VerificationCode(code) => accept_code(&ctx, &dialogue, &code).await,
        Input::PhoneNumber(digits) => request_code(Arc::clone(&ctx), dialogue, &digits).await,
        Input::Group { title } => handle_group_command(&ctx, &inbound, title).await,
        Input::Start => {
            let welcome = format!("{}\n\n{}", t("welcome"), help_text());
            ctx.messenger.send_text(inbound.chat_id, welcome).await
        }
        Input::Help => ctx.messenger.send_text(inbound.chat_id, help_text()).await,
        Input::Cancel => cancel_login(&ctx, &dialogue).await,
        Input::Invalid => {
            ctx.messenger
                .send_text(inbound.chat_id, t("invalid-input"))
                .await
        }
    }
}

pub async fn message_handler(
    msg: Message,
    dialogue: LoginDialogue,
    ctx: Arc<BridgeContext>,
) -> Result<()> {
    handle_inbound(ctx, dialogue, Inbound::from_message(&msg)).await
}
