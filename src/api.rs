//! Typed wrappers over the raw user-account methods used by the bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rpc::{RpcClient, RpcError};

pub const SEND_CODE: &str = "auth.sendCode";
pub const SIGN_IN: &str = "auth.signIn";
pub const CREATE_CHAT: &str = "messages.createChat";
pub const EXPORT_CHAT_INVITE: &str = "messages.exportChatInvite";

#[derive(Serialize)]
#[serde(tag = "_", rename = "codeSettings")]
struct CodeSettings {}

#[derive(Serialize)]
struct SendCodeParams<'a> {
    phone_number: &'a str,
    settings: CodeSettings,
}

#[derive(Serialize)]
struct SignInParams<'a> {
    phone_number: &'a str,
    phone_code_hash: &'a str,
    phone_code: &'a str,
}

#[derive(Serialize)]
struct CreateChatParams<'a> {
    users: &'a [i64],
    title: &'a str,
}

#[derive(Serialize)]
struct ExportChatInviteParams {
    chat_id: i64,
}

/// Result of `auth.sendCode`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SentCode {
    pub phone_code_hash: String,
}

#[derive(Deserialize)]
struct ExportedInvite {
    link: String,
}

/// Prefix a bare digit string with `+` the way the API expects
pub fn normalize_phone(digits: &str) -> String {
    format!("+{}", digits.trim_start_matches('+'))
}

fn encode<T: Serialize>(method: &str, params: &T) -> Result<Value, RpcError> {
    serde_json::to_value(params).map_err(|e| RpcError::Decode {
        method: method.to_string(),
        detail: e.to_string(),
    })
}

fn decode<T: for<'de> Deserialize<'de>>(method: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::Decode {
        method: method.to_string(),
        detail: e.to_string(),
    })
}

/// Ask the server to send a login code to `phone_number` (already `+`-prefixed)
pub async fn send_code(rpc: &RpcClient, phone_number: &str) -> Result<SentCode, RpcError> {
    let params = encode(
        SEND_CODE,
        &SendCodeParams {
            phone_number,
            settings: CodeSettings {},
        },
    )?;
    decode(SEND_CODE, rpc.call(SEND_CODE, params).await?)
}

/// Complete sign-in; the authorization is returned untouched for persistence
pub async fn sign_in(
    rpc: &RpcClient,
    phone_number: &str,
    phone_code_hash: &str,
    phone_code: &str,
) -> Result<Value, RpcError> {
    let params = encode(
        SIGN_IN,
        &SignInParams {
            phone_number,
            phone_code_hash,
            phone_code,
        },
    )?;
    rpc.call(SIGN_IN, params).await
}

/// Create a basic group and return its chat id
pub async fn create_chat(rpc: &RpcClient, users: &[i64], title: &str) -> Result<i64, RpcError> {
    let params = encode(CREATE_CHAT, &CreateChatParams { users, title })?;
    let result = rpc.call(CREATE_CHAT, params).await?;
    created_chat_id(&result).ok_or_else(|| RpcError::Decode {
        method: CREATE_CHAT.to_string(),
        detail: "no chat in result".to_string(),
    })
}

/// Export an invite link for `chat_id`
pub async fn export_chat_invite(rpc: &RpcClient, chat_id: i64) -> Result<String, RpcError> {
    let params = encode(EXPORT_CHAT_INVITE, &ExportChatInviteParams { chat_id })?;
    let invite: ExportedInvite = decode(EXPORT_CHAT_INVITE, rpc.call(EXPORT_CHAT_INVITE, params).await?)?;
    Ok(invite.link)
}

// Older layers answer createChat with `updates`, newer ones wrap it in
// `messages.invitedUsers { updates }`.
fn created_chat_id(result: &Value) -> Option<i64> {
    let chats = result
        .get("chats")
        .or_else(|| result.get("updates").and_then(|u| u.get("chats")))?;
    chats.get(0)?.get("id")?.as_i64()
}
