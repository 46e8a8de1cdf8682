/// ─── Redeemer Protocol Constants ────────────────────────────────────────────
///
/// One-way, capped, time-boxed conversion of a legacy asset into its
/// successor at a fixed ratio.

// ── Record layout ────────────────────────────────────────────────────────────

/// Schema tag written into every `MigrationConfig`.
pub const CONFIG_VERSION: u16 = 1;

/// Schema tag written into every `EventRecord`.
pub const EVENT_SCHEMA_VERSION: u16 = 1;

// ── Derivation namespaces ────────────────────────────────────────────────────

/// Namespace of the singleton configuration record address.
pub const CONFIG_SEED: &[u8] = b"config";

/// Namespace of the successor-asset mint-authority capability account.
pub const MINT_AUTH_SEED: &[u8] = b"mint_auth";

/// Namespace of the protocol-held liquidity allocation vault.
pub const LIQUIDITY_SEED: &[u8] = b"liquidity";

/// Namespace of the account that receives holder balances moved to a proposed version.
pub const UPGRADE_ESCROW_SEED: &[u8] = b"upgrade_escrow";

// ── Conversion ───────────────────────────────────────────────────────────────

/// Largest decimal precision accepted for either asset. 10^18 keeps the
/// widened conversion well inside u128 for any u64 amount and ratio.
pub const MAX_DECIMALS: u8 = 18;

// ── Governance ───────────────────────────────────────────────────────────────

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Upper bound on an upgrade proposal's timelock.
pub const MAX_UPGRADE_TIMELOCK_DAYS: u32 = 365;

/// Timelock used by deployment tooling when none is given.
pub const DEFAULT_UPGRADE_TIMELOCK_DAYS: u32 = 7;
