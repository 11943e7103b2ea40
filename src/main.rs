use std::sync::Arc;

use conneg::config::{AppState, Config};
use conneg::logger;
use conneg::server::{create_reusable_listener, start_server_loop};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Create Tokio runtime; worker count comes from config when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = cfg.get_socket_addr()?;
    let listener = create_reusable_listener(addr, cfg.server.backlog)?;
    let state = Arc::new(AppState::new(&cfg)?);

    logger::log_server_start(&addr, &cfg);

    start_server_loop(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for Ctrl-C: {e}"));
            std::future::pending::<()>().await;
        }
    })
    .await
}
