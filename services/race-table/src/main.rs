use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use derby_execution::RaceTable;
use derby_race_table::{
    router, AppState, CommentaryClient, Controller, ControllerSettings, OutboundEvent,
    RaceTableConfig,
};
use derby_types::ROSTER;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a single animal-race betting table.", long_about = None)]
struct Args {
    /// YAML config file; `RACE_TABLE_*` environment variables are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Overrides the configured RNG seed.
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(args: &Args) -> Result<RaceTableConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("could not read config file {}", path.display()))?;
            RaceTableConfig::from_yaml(&raw)
                .with_context(|| format!("could not parse config file {}", path.display()))?
        }
        None => RaceTableConfig::from_env(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config
        .validate()
        .map_err(|reason| anyhow!("invalid config: {reason}"))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    tracing_subscriber::fmt()
        .with_max_level(config.level())
        .init();

    let table = RaceTable::new(config.table_config(), &ROSTER).context("invalid table")?;
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let commentator = CommentaryClient::from_config(&config.commentary)
        .context("failed to build commentary client")?;
    info!(
        remote_commentary = commentator.is_remote(),
        seed = ?config.seed,
        round_interval_ms = config.round_interval_ms,
        "starting race table"
    );

    let (broadcaster, _) = broadcast::channel::<OutboundEvent>(1024);
    let (controller, _controller_task) = Controller::spawn(
        table,
        rng,
        Arc::new(commentator),
        ControllerSettings {
            round_interval: config.round_interval(),
            commentary_timeout: config.commentary_timeout(),
        },
        broadcaster.clone(),
    );

    let app = router(AppState {
        controller,
        broadcaster,
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen addr")?;
    info!(%addr, "race table service listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
