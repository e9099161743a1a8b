#![allow(clippy::result_large_err)]

use deduction_buddy::{
    api::{self, AppState},
    config::{self, database},
    core::{chatbot::Corpus, identity::GoogleTokenVerifier},
    errors::Result,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    info!("Successfully processed application configuration.");

    // 4. Initialize database and schema
    let db = database::init_db(&app_config.database.url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Load the chatbot corpus; without one every question gets the fallback answer
    let corpus = Corpus::load(&app_config.chatbot.corpus_path)
        .inspect(|corpus| info!("Loaded {} chatbot entries.", corpus.len()))
        .unwrap_or_else(|e| {
            warn!("Chatbot corpus unavailable, continuing without it: {}", e);
            Corpus::default()
        });

    // 6. Google ID-token verifier for SSO sign-in
    let verifier = GoogleTokenVerifier::new(&app_config.auth)
        .inspect_err(|e| error!("Failed to build identity verifier: {}", e))?;

    // 7. Serve until shutdown
    let state = AppState::new(db, app_config, corpus, Arc::new(verifier));
    api::serve(state).await
}
