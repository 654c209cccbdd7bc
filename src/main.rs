use dotenvy::dotenv;
use helpdesk_bot::api::{ApiClient, CredentialStore};
use helpdesk_bot::bot::handlers;
use helpdesk_bot::bot::SessionStore;
use helpdesk_bot::config::Settings;
use helpdesk_bot::notify::SubscriptionRegistry;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    init_logging();

    info!("Starting helpdesk bot...");

    let settings = init_settings();

    let creds = Arc::new(CredentialStore::new());
    let api = Arc::new(ApiClient::new(&settings, creds));
    let sessions = Arc::new(SessionStore::new());
    let registry = Arc::new(SubscriptionRegistry::new());

    let bot = Bot::new(settings.telegram_token.clone());

    info!("Bot is running...");

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![
            api,
            sessions,
            Arc::clone(&registry),
            settings
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    // Dispatch returned (termination signal): release every notification
    // task so nothing keeps running headless.
    registry.shutdown().await;
    info!("Shutdown complete.");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    api: Arc<ApiClient>,
    sessions: Arc<SessionStore>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_message(bot, msg, api, sessions).await {
        error!("Message handler error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    api: Arc<ApiClient>,
    sessions: Arc<SessionStore>,
    registry: Arc<SubscriptionRegistry>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_callback(bot, q, api, sessions, registry, settings).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
