use anyhow::Context;
use clap::{Parser, ValueEnum};
use ledger_core::constants::POW_TARGET_DIFFICULTY;
use ledger_node::{
    build_router,
    constants::{DEFAULT_DATA_DIR, DEFAULT_LISTEN},
    AppState, MiningPolicy,
};
use ledger_storage::{
    file_store::{FileIdStore, DEFAULT_ID_FILE},
    sled_store::SledIdStore,
    IdStore,
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IdStoreKind {
    /// One plain file holding the id
    File,
    /// A key in a sled database under --data-dir
    Sled,
}

#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "HTTP node serving a hash-linked transaction ledger")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, env = "LEDGER_LISTEN", default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Where /set_id keeps the node id
    #[arg(long, value_enum, env = "LEDGER_ID_STORE", default_value_t = IdStoreKind::File)]
    id_store: IdStoreKind,

    /// File used by the `file` id store
    #[arg(long, env = "LEDGER_ID_FILE", default_value = DEFAULT_ID_FILE)]
    id_file: PathBuf,

    /// Data directory for the `sled` id store
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Reject /mine requests whose proof does not satisfy --difficulty
    #[arg(long, env = "LEDGER_VERIFY_PROOFS")]
    verify_proofs: bool,

    /// Leading hex zeros a valid proof digest needs
    #[arg(long, env = "LEDGER_DIFFICULTY", default_value_t = POW_TARGET_DIFFICULTY)]
    difficulty: usize,
}

fn open_id_store(args: &Args) -> anyhow::Result<Arc<dyn IdStore>> {
    let store: Arc<dyn IdStore> = match args.id_store {
        IdStoreKind::File => Arc::new(FileIdStore::new(&args.id_file)),
        IdStoreKind::Sled => Arc::new(
            SledIdStore::open(&args.data_dir)
                .with_context(|| format!("opening sled at {}", args.data_dir.display()))?,
        ),
    };
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let policy = MiningPolicy {
        verify_proofs: args.verify_proofs,
        difficulty: args.difficulty,
    };
    let state = AppState::new(open_id_store(&args)?, policy);
    info!("node id {}", state.node_id);
    info!(
        "proof checks {} (difficulty {})",
        if policy.verify_proofs { "on" } else { "off" },
        policy.difficulty
    );

    let app = build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", args.listen))?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
