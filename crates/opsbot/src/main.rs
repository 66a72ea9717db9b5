use std::sync::Arc;

use opsbot_core::{config::Config, remote::RemoteExec, store::ContactStore};

#[tokio::main]
async fn main() -> Result<(), opsbot_core::Error> {
    opsbot_core::logging::init("opsbot")?;

    let cfg = Arc::new(Config::load()?);

    let remote = Arc::new(RemoteExec::new(&cfg));
    let store = Arc::new(ContactStore::new(cfg.database_url()));

    opsbot_telegram::router::run_polling(cfg, remote, store)
        .await
        .map_err(|e| opsbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
