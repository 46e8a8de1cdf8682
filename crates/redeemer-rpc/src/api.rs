use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcConfig, RpcEvent, RpcStats, RpcVersionInfo};

/// Redeemer JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "redeemer_" via `namespace = "redeemer"`.
#[rpc(server, client, namespace = "redeemer")]
pub trait RedeemerApi {
    /// Full configuration record by base-58 successor asset id, or null.
    #[method(name = "getConfig")]
    async fn get_config(&self, successor_asset: String) -> RpcResult<Option<RpcConfig>>;

    /// Balance of `owner` in `asset`, base units as a decimal string.
    #[method(name = "getBalance")]
    async fn get_balance(&self, asset: String, owner: String) -> RpcResult<String>;

    /// Event log page starting at `from_seq`. `limit` is capped at 200.
    #[method(name = "getEvents")]
    async fn get_events(&self, from_seq: u64, limit: u32) -> RpcResult<Vec<RpcEvent>>;

    /// Aggregates rebuilt from the record's events.
    #[method(name = "getStats")]
    async fn get_stats(&self, successor_asset: String) -> RpcResult<RpcStats>;

    /// One-line operator status for a record.
    #[method(name = "getStatus")]
    async fn get_status(&self, successor_asset: String) -> RpcResult<String>;

    /// Successor amount a redemption would mint right now. Advisory only.
    #[method(name = "quoteRedeem")]
    async fn quote_redeem(
        &self,
        successor_asset: String,
        caller: String,
        legacy_amount: String,
    ) -> RpcResult<String>;

    /// Submit a signed request. `request_hex` is hex-encoded
    /// bincode(SignedRequest); the key must hash to the request's caller.
    /// Returns the events it emitted.
    #[method(name = "submit")]
    async fn submit(&self, request_hex: String) -> RpcResult<Vec<RpcEvent>>;

    #[method(name = "getVersion")]
    async fn get_version(&self) -> RpcResult<RpcVersionInfo>;
}
