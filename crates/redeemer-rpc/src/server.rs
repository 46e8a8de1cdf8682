use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use serde_json::json;
use tracing::{info, warn};

use redeemer_core::constants::{CONFIG_VERSION, EVENT_SCHEMA_VERSION};
use redeemer_core::error::RedeemerError;
use redeemer_core::instruction::SignedRequest;
use redeemer_core::types::{AccountId, Amount, AssetId, Timestamp};
use redeemer_crypto::verify_request;
use redeemer_observer::ConfigQuery;
use redeemer_state::MigrationEngine;

use crate::api::RedeemerApiServer;
use crate::types::{RpcConfig, RpcEvent, RpcStats, RpcVersionInfo};

const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;
/// A well-formed request the engine refused.
const REQUEST_REJECTED: i32 = -32000;
const MAX_EVENTS_PAGE: u32 = 200;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Engine errors carry their kind so clients can branch without parsing text.
fn engine_err(e: RedeemerError) -> ErrorObject<'static> {
    let code = match e {
        RedeemerError::Storage(_) | RedeemerError::Serialization(_) => INTERNAL_ERROR,
        RedeemerError::InvalidId(_) => INVALID_PARAMS,
        _ => REQUEST_REJECTED,
    };
    ErrorObject::owned(
        code,
        e.to_string(),
        Some(json!({ "kind": e.kind(), "retryable": e.is_retryable() })),
    )
}

fn parse_asset(s: &str) -> Result<AssetId, ErrorObject<'static>> {
    AssetId::from_b58(s).map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid asset id: {e}")))
}

fn parse_account(s: &str) -> Result<AccountId, ErrorObject<'static>> {
    AccountId::from_b58(s).map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid account id: {e}")))
}

fn now() -> Timestamp {
    chrono::Utc::now().timestamp()
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub engine: Arc<MigrationEngine>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns the bound address and a
    /// handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let server = Server::builder().build(addr).await?;
        let bound = server.local_addr()?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(addr = %bound, "RPC server started");
        Ok((bound, handle))
    }
}

#[async_trait]
impl RedeemerApiServer for RpcServer {
    async fn get_config(&self, successor_asset: String) -> RpcResult<Option<RpcConfig>> {
        let successor = parse_asset(&successor_asset)?;
        let cfg = self
            .state
            .engine
            .db
            .get_config(&successor)
            .map_err(engine_err)?;
        Ok(cfg.as_ref().map(RpcConfig::from))
    }

    async fn get_balance(&self, asset: String, owner: String) -> RpcResult<String> {
        let asset = parse_asset(&asset)?;
        let owner = parse_account(&owner)?;
        let balance = self.state.engine.balance(&asset, &owner).map_err(engine_err)?;
        Ok(balance.to_string())
    }

    async fn get_events(&self, from_seq: u64, limit: u32) -> RpcResult<Vec<RpcEvent>> {
        let limit = limit.min(MAX_EVENTS_PAGE) as usize;
        let records = self
            .state
            .engine
            .db
            .events_from(from_seq, limit)
            .map_err(engine_err)?;
        Ok(records.iter().map(RpcEvent::from).collect())
    }

    async fn get_stats(&self, successor_asset: String) -> RpcResult<RpcStats> {
        let successor = parse_asset(&successor_asset)?;
        let query = ConfigQuery::new(&self.state.engine.db);
        query.config(&successor).map_err(engine_err)?;
        let stats = query.stats(&successor).map_err(engine_err)?;
        Ok(RpcStats::from(&stats))
    }

    async fn get_status(&self, successor_asset: String) -> RpcResult<String> {
        let successor = parse_asset(&successor_asset)?;
        Ok(ConfigQuery::new(&self.state.engine.db)
            .describe(&successor, now())
            .map_err(engine_err)?)
    }

    async fn quote_redeem(
        &self,
        successor_asset: String,
        caller: String,
        legacy_amount: String,
    ) -> RpcResult<String> {
        let successor = parse_asset(&successor_asset)?;
        let caller = parse_account(&caller)?;
        let amount: Amount = legacy_amount
            .parse()
            .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid amount: {e}")))?;
        let out = ConfigQuery::new(&self.state.engine.db)
            .quote_redeem(&successor, &caller, amount, now())
            .map_err(engine_err)?;
        Ok(out.to_string())
    }

    async fn submit(&self, request_hex: String) -> RpcResult<Vec<RpcEvent>> {
        let bytes = hex::decode(&request_hex)
            .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid hex: {e}")))?;
        let signed: SignedRequest = bincode::deserialize(&bytes)
            .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid request encoding: {e}")))?;
        if let Err(e) = verify_request(&signed) {
            warn!(
                op = signed.request.instruction.name(),
                caller = %signed.request.caller,
                error = e.kind(),
                "RPC: submit authentication failed"
            );
            return Err(engine_err(e));
        }
        let request = signed.request;

        let engine = Arc::clone(&self.state.engine);
        let op = request.instruction.name();
        let result = tokio::task::spawn_blocking(move || engine.apply(&request, now()))
            .await
            .map_err(|e| {
                warn!(op, error = %e, "RPC: submit task failed");
                rpc_err(INTERNAL_ERROR, "submit task failed")
            })?;

        let records = result.map_err(engine_err)?;
        Ok(records.iter().map(RpcEvent::from).collect())
    }

    async fn get_version(&self) -> RpcResult<RpcVersionInfo> {
        Ok(RpcVersionInfo {
            node_version: env!("CARGO_PKG_VERSION").to_string(),
            program_id: self.state.engine.program_id().to_b58(),
            config_version: CONFIG_VERSION,
            event_schema_version: EVENT_SCHEMA_VERSION,
            api_version: "1".to_string(),
        })
    }
}
