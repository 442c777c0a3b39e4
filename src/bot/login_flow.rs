//! Login flow: phone number → code request → code → sign-in → persisted session.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::api::{self, normalize_phone};
use crate::code_relay::{CodeRelay, CodeWait};
use crate::dialogue::{LoginDialogue, LoginState};
use crate::localization::{t, t_args};

use super::BridgeContext;

/// Handle `/login`: ask for the phone number, abandoning any pending login
pub async fn start_login(ctx: &BridgeContext, dialogue: &LoginDialogue) -> Result<()> {
    let chat_id = dialogue.chat_id();
    if ctx.relay.cancel(chat_id).await {
        info!(chat_id = %chat_id, "Restarting login, pending code wait abandoned");
    }

    dialogue.update(LoginState::AwaitingPhoneNumber).await?;
    ctx.messenger.send_text(chat_id, t("login-prompt")).await?;
    info!(chat_id = %chat_id, "Login started, awaiting phone number");
    Ok(())
}

/// Handle a phone number: request a code, then wait for it in the background
pub async fn request_code(ctx: Arc<BridgeContext>, dialogue: LoginDialogue, digits: &str) -> Result<()> {
    let chat_id = dialogue.chat_id();
    let phone_number = normalize_phone(digits);

    dialogue
        .update(LoginState::CodeRequested {
            phone_number: phone_number.clone(),
        })
        .await?;

    let sent = match api::send_code(&ctx.rpc, &phone_number).await {
        Ok(sent) => sent,
        Err(e) => {
            error!(chat_id = %chat_id, error = %e, "Failed to request login code");
            dialogue.update(LoginState::Failed).await?;
            ctx.messenger
                .send_text(chat_id, t_args("signin-error", &[("error", &e.to_string())]))
                .await?;
            return Ok(());
        }
    };

    // Waiter must exist before the user sees the prompt
    let receiver = ctx.relay.register(chat_id).await;
    dialogue
        .update(LoginState::AwaitingCode {
            phone_number: phone_number.clone(),
        })
        .await?;
    ctx.messenger.send_text(chat_id, t("code-sent")).await?;
    info!(chat_id = %chat_id, "Login code sent, awaiting verification code");

    tokio::spawn(async move {
        if let Err(e) =
            complete_sign_in(ctx, dialogue, phone_number, sent.phone_code_hash, receiver).await
        {
            error!(chat_id = %chat_id, error = %e, "Login flow aborted");
        }
    });
    Ok(())
}

/// Handle a verification code typed while the chat awaits one
pub async fn accept_code(ctx: &BridgeContext, dialogue: &LoginDialogue, code: &str) -> Result<()> {
    let chat_id = dialogue.chat_id();
    let phone_number = match dialogue.get().await?.unwrap_or_default() {
        LoginState::AwaitingCode { phone_number } => phone_number,
        _ => return Ok(()),
    };

    // Must read SigningIn before the waiting task can see the code
    dialogue.update(LoginState::SigningIn { phone_number }).await?;
    if ctx.relay.submit(chat_id, code).await {
        debug!(chat_id = %chat_id, "Verification code handed to login flow");
    } else {
        // The wait expired between classification and hand-off
        warn!(chat_id = %chat_id, "Verification code arrived with no login waiting");
        dialogue.exit().await?;
        ctx.messenger.send_text(chat_id, t("invalid-input")).await?;
    }
    Ok(())
}

/// Handle `/cancel`
pub async fn cancel_login(ctx: &BridgeContext, dialogue: &LoginDialogue) -> Result<()> {
    let chat_id = dialogue.chat_id();
    let state = dialogue.get().await?.unwrap_or_default();
    let had_waiter = ctx.relay.cancel(chat_id).await;

    if state.is_pending() || had_waiter {
        dialogue.exit().await?;
        info!(chat_id = %chat_id, "Login cancelled by user");
        ctx.messenger.send_text(chat_id, t("login-cancelled")).await
    } else {
        ctx.messenger.send_text(chat_id, t("nothing-to-cancel")).await
    }
}

async fn complete_sign_in(
    ctx: Arc<BridgeContext>,
    dialogue: LoginDialogue,
    phone_number: String,
    phone_code_hash: String,
    receiver: tokio::sync::oneshot::Receiver<String>,
) -> Result<()> {
    let chat_id = dialogue.chat_id();

    let code = match CodeRelay::wait(receiver, ctx.settings.code_wait).await {
        CodeWait::Received(code) => code,
        CodeWait::TimedOut => {
            ctx.relay.release_closed(chat_id).await;
            warn!(chat_id = %chat_id, "No verification code received in time");
            if dialogue.get().await?.is_some_and(|s| s.expects_code()) {
                dialogue.exit().await?;
            }
            ctx.messenger.send_text(chat_id, t("login-failed")).await?;
            return Ok(());
        }
        CodeWait::Abandoned => {
            debug!(chat_id = %chat_id, "Code wait abandoned");
            return Ok(());
        }
    };

    let outcome = match api::sign_in(&ctx.rpc, &phone_number, &phone_code_hash, &code).await {
        Ok(authorization) => match ctx.store.save(&authorization) {
            Ok(()) => {
                ctx.rpc.transport().install_session(&authorization).await;
                Ok(())
            }
            Err(e) => {
                error!(chat_id = %chat_id, error = %e, "Signed in but failed to persist session");
                Err(e.to_string())
            }
        },
        Err(e) => {
            error!(chat_id = %chat_id, error = %e, "Sign-in rejected");
            Err(e.to_string())
        }
    };

    let signing_in = dialogue
        .get()
        .await?
        .is_some_and(|s| matches!(s, LoginState::SigningIn { .. }));

    match outcome {
        Ok(()) => {
            if signing_in {
                dialogue.update(LoginState::SignedIn).await?;
            }
            info!(chat_id = %chat_id, "User account signed in");
            ctx.messenger.send_text(chat_id, t("login-success")).await
        }
        Err(reason) => {
            if signing_in {
                dialogue.update(LoginState::Failed).await?;
            }
            ctx.messenger
                .send_text(chat_id, t_args("signin-error", &[("error", &reason)]))
                .await
        }
    }
}
