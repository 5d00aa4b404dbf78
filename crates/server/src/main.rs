//! Homologador Server binary.
//!
//! Configuration comes from an optional `server.yaml` in the working directory and
//! `HOMOLOG_SERVER__*` environment variables.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    server::start_server(config).await?;
    Ok(())
}
