//! End-to-end smoke test for redeemer-node.
//!
//! Starts a real node process with a fresh deployment, submits requests via
//! JSON-RPC, and asserts state changes are reflected in queries.
//!
//! Run with:
//!   cargo test -p redeemer-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use redeemer_core::instruction::{Instruction, Request};
use redeemer_core::types::AccountId;
use redeemer_crypto::KeyPair;
use redeemer_genesis::DeploymentParams;

// ── Node lifecycle ────────────────────────────────────────────────────────────

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Find a free TCP port on loopback.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

// ── RPC helpers ───────────────────────────────────────────────────────────────

async fn rpc_raw(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    resp.json().await.expect("parse RPC JSON")
}

async fn rpc_call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let json = rpc_raw(client, url, method, params).await;
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

/// Poll until the RPC server responds or the timeout elapses.
async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "redeemer_getVersion",
        "params": [],
        "id": 1
    });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

async fn get_balance(client: &reqwest::Client, url: &str, asset: &str, owner: &AccountId) -> u64 {
    let result = rpc_call(
        client,
        url,
        "redeemer_getBalance",
        serde_json::json!([asset, owner.to_b58()]),
    )
    .await;
    result.as_str().unwrap().parse().expect("parse balance")
}

fn encode_signed(key: &KeyPair, request: Request) -> String {
    let signed = key.sign_request(request).expect("sign request");
    hex::encode(bincode::serialize(&signed).expect("serialize request"))
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn smoke_redeem_and_pause() {
    // ── 1. Prepare temp dir and deployment params ─────────────────────────────
    let data_dir = std::env::temp_dir().join(format!("redeemer_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let admin_key = KeyPair::generate();
    let holder_key = KeyPair::generate();
    let admin = admin_key.account_id.clone();
    let holder = holder_key.account_id.clone();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let params = DeploymentParams::dev(now - 60, &admin, &[holder.clone()]);
    let successor = params.successor.asset_id().to_b58();
    let legacy = params.legacy.asset_id().to_b58();
    let params_path = data_dir.join("deployment.json");
    std::fs::write(&params_path, serde_json::to_string(&params).unwrap()).unwrap();

    // ── 2. Start node ─────────────────────────────────────────────────────────
    let rpc_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);

    let node_bin = env!("CARGO_BIN_EXE_redeemer-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir",   data_dir.join("state").to_str().unwrap(),
            "--rpc-addr",   &format!("127.0.0.1:{}", rpc_port),
            "--deployment", params_path.to_str().unwrap(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn redeemer-node");

    let _guard = NodeGuard { child, data_dir };

    // ── 3. Wait for RPC ready ─────────────────────────────────────────────────
    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "redeemer-node did not become ready within 20 seconds"
    );

    // ── 4. Deployment is visible ──────────────────────────────────────────────
    let cfg = rpc_call(&http, &rpc_url, "redeemer_getConfig", serde_json::json!([successor])).await;
    assert_eq!(cfg["admin"], admin.to_b58());
    assert_eq!(cfg["cumulative_minted_successor"], "0");
    assert_eq!(get_balance(&http, &rpc_url, &legacy, &holder).await, 1_000_000_000);

    // ── 5. Holder redeems 1.0 legacy → 0.1 successor ──────────────────────────
    let redeem = Request {
        caller: holder.clone(),
        successor_asset: params.successor.asset_id(),
        instruction: Instruction::Redeem { legacy_amount: 1_000_000, min_successor_out: 100_000_000 },
    };
    let events = rpc_call(
        &http,
        &rpc_url,
        "redeemer_submit",
        serde_json::json!([encode_signed(&holder_key, redeem.clone())]),
    )
    .await;
    assert_eq!(events[0]["kind"], "Redeemed");

    assert_eq!(get_balance(&http, &rpc_url, &successor, &holder).await, 100_000_000);
    assert_eq!(get_balance(&http, &rpc_url, &legacy, &holder).await, 999_000_000);

    // ── 6. Admin pauses; the next redemption is refused with its kind ─────────
    let pause = Request {
        caller: admin.clone(),
        successor_asset: params.successor.asset_id(),
        instruction: Instruction::SetPause { paused: true },
    };
    // Signed by the holder, the pause is refused; signed by the admin, it lands.
    let spoofed = rpc_raw(
        &http,
        &rpc_url,
        "redeemer_submit",
        serde_json::json!([encode_signed(&holder_key, Request { caller: holder.clone(), ..pause.clone() })]),
    )
    .await;
    assert_eq!(spoofed["error"]["data"]["kind"], "Unauthorized");
    rpc_call(&http, &rpc_url, "redeemer_submit", serde_json::json!([encode_signed(&admin_key, pause)])).await;

    let refused = rpc_raw(
        &http,
        &rpc_url,
        "redeemer_submit",
        serde_json::json!([encode_signed(&holder_key, redeem)]),
    )
    .await;
    assert_eq!(refused["error"]["data"]["kind"], "MigrationPaused");
    assert_eq!(refused["error"]["data"]["retryable"], true);

    // ── 7. Stats replay the event log ─────────────────────────────────────────
    let stats = rpc_call(&http, &rpc_url, "redeemer_getStats", serde_json::json!([successor])).await;
    assert_eq!(stats["redemptions"], 1);
    assert_eq!(stats["paused"], true);
    assert_eq!(stats["total_successor_minted"], "100000000");
}
