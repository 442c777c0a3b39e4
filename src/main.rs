use std::env;
use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use introlink::bot::{self, BridgeContext, Command, TelegramMessenger};
use introlink::config::BridgeConfig;
use introlink::dialogue::LoginState;
use introlink::rpc::RpcClient;
use introlink::session_store::SessionStore;
use introlink::transport::HttpTransport;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Introlink bridge");

    let config = BridgeConfig::from_env()?;

    // Restore the user-account session, if one was saved
    let store = SessionStore::new(&config.session_path);
    let session = store.load();
    if session.is_none() {
        info!("No user-account session yet, send /login to the bot");
    }

    let transport = Arc::new(HttpTransport::new(
        &config.gateway_url,
        config.api_id,
        config.api_hash.clone(),
        session,
    ));
    let rpc = Arc::new(RpcClient::new(transport, config.default_dc));

    let bot = Bot::new(config.bot_token.clone());
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let ctx = Arc::new(BridgeContext::new(
        rpc,
        store,
        config.flow.clone(),
        Arc::new(TelegramMessenger::new(bot.clone())),
    ));

    info!(gateway = %config.gateway_url, dc_id = config.default_dc, "Bot initialized, starting dispatcher");

    let handler = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<LoginState>, LoginState>()
        .endpoint(bot::message_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<LoginState>::new(), ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
