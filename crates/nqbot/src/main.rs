use std::sync::Arc;

use nqbot_core::{
    config::Config, engine::QueueEngine, policy::AccessPolicy, settings::SettingsFlags,
    users::UserDirectory,
};
use nqbot_storage::SqliteStore;
use nqbot_telegram::{pending::PendingActions, router::AppState};

mod health;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nqbot_core::logging::init("nqbot")?;

    let cfg = Arc::new(Config::load()?);
    let store = Arc::new(SqliteStore::connect(&cfg.database_url).await?);

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        engine: QueueEngine::new(store.clone()),
        policy: AccessPolicy::new(store.clone()),
        flags: SettingsFlags::new(store.clone()),
        users: UserDirectory::new(store),
        pending: PendingActions::default(),
    });

    // Keepalive page for the hosting platform; the bot itself is pure polling.
    let health_port = cfg.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_port).await {
            tracing::error!(error = %e, "health server failed");
        }
    });

    nqbot_telegram::router::run_polling(state).await
}
