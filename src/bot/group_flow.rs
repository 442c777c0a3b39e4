//! Group flow: create a basic group for two users and export its invite link.

use anyhow::Result;
use tracing::{error, info};

use crate::api;
use crate::localization::{t, t_args};
use crate::rpc::RpcClient;

use super::message_handler::Inbound;
use super::BridgeContext;

/// Create a group with exactly `user_ids` and return its invite link
///
/// Failures are logged and yield `None`. A group created before a failed
/// invite export is left in place.
pub async fn create_group(rpc: &RpcClient, user_ids: &[i64], title: &str) -> Option<String> {
    let chat_id = match api::create_chat(rpc, user_ids, title).await {
        Ok(chat_id) => {
            info!(chat_id, title, "Group created");
            chat_id
        }
        Err(e) => {
            error!(title, error = %e, "Failed to create group");
            return None;
        }
    };

    match api::export_chat_invite(rpc, chat_id).await {
        Ok(link) => {
            info!(chat_id, link = %link, "Group invite link exported");
            Some(link)
        }
        Err(e) => {
            error!(chat_id, error = %e, "Failed to export group invite link");
            None
        }
    }
}

/// Handle `/group [title]`, which must reply to the other member's message
pub async fn handle_group_command(
    ctx: &BridgeContext,
    inbound: &Inbound,
    title: Option<String>,
) -> Result<()> {
    let (sender, target_id) = match (&inbound.sender, inbound.reply_target) {
        (Some(sender), Some(target_id)) => (sender, target_id),
        _ => {
            return ctx
                .messenger
                .send_text(inbound.chat_id, t("group-needs-reply"))
                .await;
        }
    };

    let title = title.unwrap_or_else(|| {
        t_args(
            "group-default-title",
            &[
                ("first_name", &sender.first_name),
                ("target_id", &target_id.to_string()),
            ],
        )
    });

    let reply = match create_group(&ctx.rpc, &[sender.id, target_id], &title).await {
        Some(link) => match &ctx.settings.promo_text {
            Some(promo) => t_args("group-created-promo", &[("link", &link), ("promo", promo)]),
            None => t_args("group-created", &[("link", &link)]),
        },
        None => t("group-failed"),
    };

    ctx.messenger.send_text(inbound.chat_id, reply).await
}
