use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use passgym::api::{OptimizerService, Workspace, http};
use passgym::config::AppConfig;
use passgym::env::PassPipelineProvider;
use passgym::env::passes::PASSES;
use passgym::runtime::BlockingScheduler;

/// Train and evaluate compiler pass-ordering agents.
#[derive(Parser, Debug)]
#[command(name = "passgym")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./passgym.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the train/evaluate HTTP API
    Serve {
        /// Listen address, overrides the config
        #[arg(long)]
        addr: Option<String>,
    },
    /// Train once, evaluate once, print the rewards as JSON
    Run,
    /// List the available passes
    Passes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Passes => {
            for (action, pass) in PASSES.iter().enumerate() {
                println!("{action}\t{pass}");
            }
        }
        Command::Run => {
            let service = build(&config)?;
            service.train().await?;
            let report = service.evaluate().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Serve { addr } => {
            if let Some(addr) = addr {
                config.addr = addr;
            }
            let service = Arc::new(build(&config)?);
            let listener = TcpListener::bind(&config.addr).await?;
            http::serve(listener, service, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
        }
    }
    Ok(())
}

fn build(
    config: &AppConfig,
) -> Result<OptimizerService<PassPipelineProvider>, Box<dyn std::error::Error>> {
    let workspace = Workspace::from_config(config)?;
    info!(
        train = workspace.datasets.train.len(),
        val = workspace.datasets.val.len(),
        test = workspace.datasets.test.len(),
        "workspace ready"
    );
    Ok(OptimizerService::new(
        workspace,
        BlockingScheduler::new(&config.scheduler),
    ))
}
