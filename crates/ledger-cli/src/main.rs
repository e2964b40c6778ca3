use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{
    constants::POW_TARGET_DIFFICULTY, mine::search_proof_parallel, pow::proof_of_work, Block,
};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, env = "LEDGER_NODE", default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stage a transaction for the next block
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
    },
    /// Seal the staged transactions into a block
    Mine {
        /// Id credited with the mining reward
        #[arg(long)]
        id: String,
        /// Proof to submit; searched against the node's last block when omitted
        #[arg(long)]
        proof: Option<u64>,
        /// Leading hex zeros the searched proof must reach
        #[arg(long, default_value_t = POW_TARGET_DIFFICULTY)]
        difficulty: usize,
        /// Search on every core instead of counting up from 0
        #[arg(long)]
        parallel: bool,
    },
    /// Find a proof for the node's last block without submitting it
    Prove {
        #[arg(long, default_value_t = POW_TARGET_DIFFICULTY)]
        difficulty: usize,
        #[arg(long)]
        parallel: bool,
    },
    /// Print the whole chain
    Chain,
    /// Print the last block
    LastBlock,
    /// Store the node's id
    SetId {
        #[arg(long)]
        id: String,
    },
    /// Check the node is up
    Health,
}

#[derive(Serialize)]
struct TxIn {
    sender: String,
    recipient: String,
    amount: i64,
}

#[derive(Serialize)]
struct MineIn {
    proof: u64,
    id: String,
}

#[derive(Serialize)]
struct SetIdIn {
    id: String,
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

async fn fetch_last_block(client: &Client, node: &str) -> Result<Block> {
    let res = client
        .get(format!("{node}/last_block"))
        .send()
        .await
        .context("requesting last block")?;
    if !res.status().is_success() {
        bail!("node answered {} for /last_block", res.status());
    }
    Ok(res.json().await?)
}

/// Search a proof for `block` on a blocking thread. Ctrl-C aborts the search.
async fn search_proof(block: &Block, difficulty: usize, parallel: bool) -> Result<u64> {
    let block_string = block.canonical_string();
    let cancel = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&cancel);
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::Relaxed);
        }
    });

    info!("searching proof for block {} at difficulty {}", block.index, difficulty);
    let flag = Arc::clone(&cancel);
    let found = tokio::task::spawn_blocking(move || {
        if parallel {
            search_proof_parallel(&block_string, difficulty, &flag)
        } else {
            proof_of_work(&block_string, difficulty, &flag)
        }
    })
    .await?;
    watcher.abort();

    match found {
        Some(proof) => Ok(proof),
        None if cancel.load(Ordering::Relaxed) => bail!("proof search cancelled"),
        None => bail!("no proof exists at difficulty {difficulty}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/').to_owned();
    let client = Client::new();
    debug!("using node {node}");

    match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
        } => {
            let tx = TxIn {
                sender,
                recipient,
                amount,
            };
            let res = client
                .post(format!("{node}/transactions/new"))
                .json(&tx)
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Mine {
            id,
            proof,
            difficulty,
            parallel,
        } => {
            let proof = match proof {
                Some(proof) => proof,
                None => {
                    let last = fetch_last_block(&client, &node).await?;
                    search_proof(&last, difficulty, parallel).await?
                }
            };
            let res = client
                .post(format!("{node}/mine"))
                .json(&MineIn { proof, id })
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Prove {
            difficulty,
            parallel,
        } => {
            let last = fetch_last_block(&client, &node).await?;
            let proof = search_proof(&last, difficulty, parallel).await?;
            println!("{proof}");
        }
        Command::Chain => {
            let res = client.get(format!("{node}/chain")).send().await?;
            print_response(res).await?;
        }
        Command::LastBlock => {
            let res = client.get(format!("{node}/last_block")).send().await?;
            print_response(res).await?;
        }
        Command::SetId { id } => {
            let res = client
                .post(format!("{node}/set_id"))
                .json(&SetIdIn { id })
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Health => {
            let res = client.get(format!("{node}/health")).send().await?;
            print_response(res).await?;
        }
    }
    Ok(())
}
