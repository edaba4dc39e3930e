//! Skirmish room server.
//!
//! Configuration comes from the environment (see `ServerConfig::from_env`),
//! logging from `RUST_LOG`.

use skirmish::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    skirmish::init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        addr = %config.bind_addr,
        max_turns = config.hub.game.max_turns,
        "starting skirmish server"
    );

    let server = SkirmishServer::builder().config(config).build().await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }
    Ok(())
}
