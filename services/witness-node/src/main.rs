use anyhow::{bail, Context};
use mirrorwitness_core::{logging, Config};
use mirrorwitness_crypto::SharedSecret;
use mirrorwitness_mesh::{OffsetCorroborator, WitnessNode};
use mirrorwitness_radio::{run_beacon, VirtualRadio};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const NODE_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    role: &'static str,
    protocol_version: u32,
}

#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    witness_id: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            role: "witness",
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    logging::init_from_env();

    let args = parse_args(&args)?;
    let mut config = Config::load(args.config_path.as_deref()).context("loading configuration")?;
    if let Some(id) = args.witness_id {
        config.witness.witness_id = id;
    }

    let secret = config.require_shared_secret()?;
    let secret = SharedSecret::new(secret.into_bytes())?;

    let witness_id = config.witness.witness_id;
    let key_path = config.witness.key_path()?;
    let keypair = mirrorwitness_identity::load_or_create(witness_id, &key_path)
        .with_context(|| format!("loading witness key from {}", key_path.display()))?;
    info!(witness_id, key_path = %key_path.display(), "Witness identity loaded");

    if config.witness.beacon_interval_secs > 0 {
        tokio::spawn(run_beacon(
            VirtualRadio::new(&config.radio),
            witness_id,
            Duration::from_secs(config.witness.beacon_interval_secs),
            config.radio.beacon_distance_km,
        ));
    }

    let node = WitnessNode::new(keypair, secret)
        .with_corroborator(OffsetCorroborator::new(witness_id, config.witness.gps_offset_deg));
    let bind_addr = config.witness.bind_addr();
    Arc::new(node)
        .run(&bind_addr)
        .await
        .with_context(|| format!("serving on {bind_addr}"))?;
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args_iter = args.iter().skip(1);
    while let Some(arg) = args_iter.next() {
        match arg.as_str() {
            "--config" => match args_iter.next() {
                Some(path) => parsed.config_path = Some(PathBuf::from(path)),
                None => bail!("--config was provided without a path"),
            },
            "--witness-id" => match args_iter.next() {
                Some(id) => {
                    parsed.witness_id = Some(
                        id.parse()
                            .with_context(|| format!("invalid --witness-id '{id}'"))?,
                    )
                }
                None => bail!("--witness-id was provided without a value"),
            },
            other => bail!("unknown argument '{other}'"),
        }
    }
    Ok(parsed)
}
