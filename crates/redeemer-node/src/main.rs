//! redeemer-node — serves one program version's migration records.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply the deployment if the store holds no record yet
//!   3. Start the JSON-RPC 2.0 server
//!   4. Wait for Ctrl-C, then stop the server and flush the store

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use redeemer_core::types::{AccountId, ProgramId};
use redeemer_crypto::hash::account_id_from_pubkey;
use redeemer_genesis::{apply_deployment, DeploymentParams};
use redeemer_rpc::{RpcServer, RpcServerState};
use redeemer_state::{MigrationEngine, StateDb};

/// Key material hashed into the development program id.
const DEV_PROGRAM_SEED: &[u8] = b"redeemer/dev/program";
/// Key material hashed into the development admin id.
const DEV_ADMIN_SEED: &[u8] = b"redeemer/dev/admin";

#[derive(Parser, Debug)]
#[command(
    name = "redeemer-node",
    version,
    about = "Redeemer node: capped, time-boxed legacy → successor asset migration"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.redeemer/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Base-58 id of the program version this node runs. Defaults to the
    /// development id.
    #[arg(long)]
    program_id: Option<String>,

    /// Path to deployment params JSON (only used on a fresh store).
    #[arg(long)]
    deployment: Option<PathBuf>,

    /// Base-58 admin account for the development deployment. Submissions are
    /// signed, so the admin must be an account whose key you hold.
    #[arg(long)]
    admin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,redeemer=debug")),
        )
        .init();

    let args = Args::parse();
    info!("redeemer node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    let program_id = match &args.program_id {
        Some(s) => ProgramId::from_b58(s).context("parsing --program-id")?,
        None => {
            warn!("No --program-id provided. Using the development program id.");
            account_id_from_pubkey(DEV_PROGRAM_SEED)
        }
    };
    let engine = Arc::new(MigrationEngine::new(Arc::clone(&db), program_id.clone()));

    // ── Deployment if fresh ───────────────────────────────────────────────────
    let existing = db.iter_configs().context("reading configuration records")?;
    if existing.is_empty() {
        info!("fresh store — applying deployment");
        let now = chrono::Utc::now().timestamp();
        let params = load_or_default_deployment(args.deployment.as_deref(), args.admin.as_deref(), now)?;
        let deployment = apply_deployment(&engine, &params, now).context("applying deployment")?;
        info!(
            successor = %deployment.successor_asset,
            config = %deployment.config_address,
            mint_authority = %deployment.mint_authority,
            "deployment applied"
        );
    } else {
        for cfg in &existing {
            info!(
                successor = %cfg.successor_asset,
                finalized = cfg.finalized,
                minted = cfg.cumulative_minted_successor,
                "existing record found — skipping deployment"
            );
        }
    }

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState { engine: Arc::clone(&engine) });
    let (addr, rpc_handle) = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!(program = %program_id, rpc = %addr, "node ready");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;

    info!("shutting down");
    if rpc_handle.stop().is_err() {
        warn!("RPC server already stopped");
    }
    db.flush().context("flushing state database")?;
    Ok(())
}

/// Load deployment parameters from a JSON file, or build the development
/// deployment if no path is given.
///
/// # Warning
/// The development deployment uses well-known ids. Only use it for local
/// development and testing.
fn load_or_default_deployment(
    path: Option<&Path>,
    admin: Option<&str>,
    now: i64,
) -> anyhow::Result<DeploymentParams> {
    if let Some(p) = path {
        let json = std::fs::read_to_string(p)
            .with_context(|| format!("reading deployment params from {}", p.display()))?;
        return DeploymentParams::from_json(&json).context("parsing deployment params JSON");
    }
    warn!("No --deployment provided. Using the development deployment — DO NOT USE IN PRODUCTION.");
    let admin = match admin {
        Some(s) => AccountId::from_b58(s).context("parsing --admin")?,
        None => {
            warn!("No --admin provided. The development admin has no signing key; admin operations are unavailable.");
            account_id_from_pubkey(DEV_ADMIN_SEED)
        }
    };
    Ok(DeploymentParams::dev(now, &admin, &[admin.clone()]))
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
