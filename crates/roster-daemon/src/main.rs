use std::path::PathBuf;

use clap::Parser;
use roster_config::Config;
use roster_daemon::logging::init_logging;
use roster_daemon::DaemonServer;
use roster_store::Store;
use tracing::info;

#[derive(Parser)]
#[command(name = "roster-daemon")]
#[command(about = "Serve user records from a JSON file over HTTP")]
#[command(version)]
struct Args {
    #[arg(short, long, help = "Path to config.toml (default: ~/.config/roster/config.toml)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Address to bind (overrides config and ROSTER_HOST)")]
    host: Option<String>,

    #[arg(short, long, help = "Port to listen on (overrides config and PORT)")]
    port: Option<u16>,

    #[arg(long, help = "JSON file holding the users (overrides config and ROSTER_DATA_FILE)")]
    data_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(data_file) = args.data_file {
        config.storage.data_file = data_file;
    }

    init_logging(&config.logging)?;

    let store = Store::new(&config.storage.data_file);
    if config.storage.create_if_missing {
        store.ensure_initialized()?;
    }
    info!("Using user store at {}", store.path().display());

    let server = DaemonServer::bind(&config.server, store).await?;

    info!("Starting roster daemon");
    server.run().await?;

    Ok(())
}
