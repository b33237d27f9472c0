//! Snake Arena Server
//!
//! Runs one match on a WebSocket endpoint until Ctrl-C.

use tracing::info;
use tracing_subscriber::EnvFilter;

use snake_arena::{GameServer, MatchConfig, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let default_level = if cfg!(feature = "debug-tracing") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Snake Arena Server v{}", VERSION);

    let config = ServerConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;

    let match_config = MatchConfig::default();
    info!(
        "Board {}x{}, first to {} within {}s",
        match_config.cols,
        match_config.rows,
        match_config.score_to_win,
        match_config.time_limit.as_secs()
    );

    let server = GameServer::new(config, match_config);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            server.shutdown();
        }
    }

    Ok(())
}
