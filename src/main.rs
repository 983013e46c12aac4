use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use waypost::server::{self, AppState};
use waypost::storage::{FileKvStore, KvStore, MemoryKvStore, SiteStore};

#[derive(Parser)]
#[command(name = "waypost", about = "Personal bookmark and navigation manager", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8787")]
    bind: SocketAddr,

    /// Directory for persisted data (default: platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep the collection in memory only; nothing is written to disk
    #[arg(long)]
    memory: bool,

    /// Token required in the X-Edit-Token header for mutating requests
    /// (default: read WAYPOST_EDIT_TOKEN, else generate one and log it)
    #[arg(long)]
    edit_token: Option<String>,

    /// Disable the edit gate entirely (local use)
    #[arg(long)]
    open_edit: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store: Box<dyn KvStore + Send + Sync> = if cli.memory {
        log::info!("Using in-memory storage; the collection will not survive restarts");
        Box::new(MemoryKvStore::new())
    } else {
        let data_dir = match cli.data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        log::info!("Storing site collection under {:?}", data_dir);
        Box::new(FileKvStore::new(data_dir))
    };

    let edit_token = if cli.open_edit {
        None
    } else {
        let token = cli
            .edit_token
            .or_else(|| std::env::var("WAYPOST_EDIT_TOKEN").ok())
            .unwrap_or_else(|| {
                let token = server::generate_edit_token();
                log::info!("Generated edit token: {}", token);
                token
            });
        Some(token)
    };

    let state = Arc::new(AppState {
        sites: SiteStore::new(store),
        edit_token,
    });

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("waypost"))
        .ok_or_else(|| anyhow::anyhow!("Cannot determine platform data directory"))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    log::info!("Shutting down");
}
