//! redeemer-rpc
//!
//! JSON-RPC 2.0 boundary for a redeemer node.
//!
//! Namespace: "redeemer"
//! Methods:
//!   redeemer_getConfig    — configuration record by successor asset
//!   redeemer_getBalance   — ledger balance of an owner in an asset
//!   redeemer_getEvents    — page of the typed event log
//!   redeemer_getStats     — aggregates replayed from events
//!   redeemer_getStatus    — one-line operator status
//!   redeemer_quoteRedeem  — dry-run conversion for a caller
//!   redeemer_submit       — apply a signed request (hex bincode)
//!   redeemer_getVersion   — node and schema versions
//!
//! `submit` only forwards a request to the engine after its Dilithium2
//! signature verifies and the signing key hashes to the claimed caller.

pub mod api;
pub mod server;
pub mod types;

pub use api::{RedeemerApiClient, RedeemerApiServer};
pub use server::{RpcServer, RpcServerState};
pub use types::{RpcConfig, RpcEvent, RpcStats, RpcVersionInfo};
