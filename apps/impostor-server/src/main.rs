//! Impostor word game server.
//!
//! Configuration comes from the environment (see [`ServerConfig`]); log
//! verbosity from `RUST_LOG`. Stops on Ctrl-C.

use impostor::logging;
use impostor::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind,
        min_players = config.game.min_players,
        max_players = config.game.max_players,
        turn_seconds = config.game.turn_timeout.as_secs_f64(),
        vote_seconds = config.game.vote_timeout.as_secs_f64(),
        "starting Impostor server"
    );

    let server = ImpostorServerBuilder::from_config(config).build().await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
        }
    }
    Ok(())
}
