//! HTTP surface of the ledger node.
//!
//! Every handler reaches the ledger through [`AppState`]. Mining takes the
//! write lock once for the whole round (hash, seal, reward) so no reader sees
//! a block without its reward staged behind it.

pub mod constants;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use constants::{MSG_BLOCK_FORGED, MSG_INVALID_PROOF, MSG_INVALID_REQUEST};
use ledger_core::{
    chain::Ledger,
    constants::{POW_TARGET_DIFFICULTY, REWARD_AMOUNT, REWARD_SENDER},
    pow::valid_proof_with_difficulty,
    Block,
};
use ledger_storage::{IdStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Whether `/mine` checks proofs before sealing, and against which difficulty.
#[derive(Clone, Copy, Debug)]
pub struct MiningPolicy {
    pub verify_proofs: bool,
    pub difficulty: usize,
}

impl Default for MiningPolicy {
    fn default() -> Self {
        Self {
            verify_proofs: false,
            difficulty: POW_TARGET_DIFFICULTY,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub id_store: Arc<dyn IdStore>,
    /// Held across put-then-get so each `/set_id` echoes its own write.
    pub id_lock: Arc<Mutex<()>>,
    pub node_id: String,
    pub policy: MiningPolicy,
}

impl AppState {
    pub fn new(id_store: Arc<dyn IdStore>, policy: MiningPolicy) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(Ledger::new())),
            id_store,
            id_lock: Arc::new(Mutex::new(())),
            node_id: new_node_id(),
            policy,
        }
    }
}

/// A fresh identifier for this process: a v4 UUID without dashes.
pub fn new_node_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("id store failed: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = MessageResponse {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// Every field is optional so a missing one maps to our 400, not axum's 422.
#[derive(Debug, Deserialize)]
pub struct MineRequest {
    pub proof: Option<u64>,
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub block: Block,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChainResponse {
    pub length: usize,
    pub chain: Vec<Block>,
}

#[derive(Debug, Deserialize)]
pub struct SetIdRequest {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub node_id: String,
}

fn body_or_invalid<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!("rejected request body: {rejection}");
        ApiError::BadRequest(MSG_INVALID_REQUEST)
    })
}

/// POST /mine
/// Request body: { "proof": 42, "id": "miner" }
async fn mine(
    State(state): State<AppState>,
    payload: Result<Json<MineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MineResponse>), ApiError> {
    let request = body_or_invalid(payload)?;
    let (Some(proof), Some(id)) = (request.proof, request.id) else {
        warn!("mine request missing proof or id");
        return Err(ApiError::BadRequest(MSG_INVALID_REQUEST));
    };

    let mut ledger = state.ledger.write().await;
    let last = ledger.last_block();
    if state.policy.verify_proofs
        && !valid_proof_with_difficulty(&last.canonical_string(), proof, state.policy.difficulty)
    {
        warn!(proof, index = last.index, "proof rejected");
        return Err(ApiError::BadRequest(MSG_INVALID_PROOF));
    }

    let previous_hash = last.hash();
    let block = ledger.seal_block(proof, Some(previous_hash)).clone();
    ledger.stage_transaction(REWARD_SENDER, id.as_str(), REWARD_AMOUNT);
    info!(index = block.index, proof, miner = %id, "block forged");

    Ok((
        StatusCode::CREATED,
        Json(MineResponse {
            message: MSG_BLOCK_FORGED.to_owned(),
            block,
        }),
    ))
}

/// GET /chain
async fn full_chain(State(state): State<AppState>) -> Json<ChainResponse> {
    let ledger = state.ledger.read().await;
    Json(ChainResponse {
        length: ledger.len(),
        chain: ledger.chain().to_vec(),
    })
}

/// GET /last_block
async fn last_block(State(state): State<AppState>) -> Json<Block> {
    Json(state.ledger.read().await.last_block().clone())
}

/// POST /set_id
/// Request body: { "id": "some-node" }
async fn set_id(
    State(state): State<AppState>,
    payload: Result<Json<SetIdRequest>, JsonRejection>,
) -> Result<Json<IdResponse>, ApiError> {
    let Some(id) = body_or_invalid(payload)?.id else {
        return Err(ApiError::BadRequest(MSG_INVALID_REQUEST));
    };

    let _slot = state.id_lock.lock().await;
    let store = Arc::clone(&state.id_store);
    let stored = tokio::task::spawn_blocking(move || {
        store.put(&id)?;
        store.get()
    })
    .await
    .map_err(|e| ApiError::Internal(format!("id store task failed: {e}")))??;

    let id = stored.ok_or_else(|| ApiError::Internal("id missing after write".to_owned()))?;
    info!(id = %id, "node id set");
    Ok(Json(IdResponse { id }))
}

/// POST /transactions/new
/// Request body: { "sender": "a", "recipient": "b", "amount": 5 }
async fn new_transaction(
    State(state): State<AppState>,
    payload: Result<Json<NewTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let request = body_or_invalid(payload)?;
    let (Some(sender), Some(recipient), Some(amount)) =
        (request.sender, request.recipient, request.amount)
    else {
        return Err(ApiError::BadRequest(MSG_INVALID_REQUEST));
    };

    let index = state
        .ledger
        .write()
        .await
        .stage_transaction(sender, recipient, amount);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Transaction will be added to Block {index}"),
        }),
    ))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_owned(),
        node_id: state.node_id.clone(),
    })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mine", post(mine))
        .route("/chain", get(full_chain))
        .route("/last_block", get(last_block))
        .route("/set_id", post(set_id))
        .route("/transactions/new", post(new_transaction))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
