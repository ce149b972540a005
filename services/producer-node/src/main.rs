use anyhow::{bail, Context};
use mirrorwitness_core::{logging, Config};
use mirrorwitness_crypto::SharedSecret;
use mirrorwitness_mesh::{ProducerNode, ProducerSettings};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

const NODE_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    role: &'static str,
    protocol_version: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            role: "producer",
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    logging::init_from_env();

    let config_path = parse_config_path(&args)?;
    let config = Config::load(config_path.as_deref()).context("loading configuration")?;

    let secret = config.require_shared_secret()?;
    let secret = SharedSecret::new(secret.into_bytes())?;

    let settings = ProducerSettings::from(&config.producer);
    info!(witnesses = ?settings.witness_endpoints, "Producer configured");

    ProducerNode::new(settings, secret).run().await?;
    Ok(())
}

fn parse_config_path(args: &[String]) -> anyhow::Result<Option<PathBuf>> {
    match args.get(1..).unwrap_or(&[]) {
        [] => Ok(None),
        [flag, path] if flag == "--config" => Ok(Some(PathBuf::from(path))),
        [flag] if flag == "--config" => bail!("--config was provided without a path"),
        [other, ..] => bail!("unknown argument '{other}'"),
    }
}
