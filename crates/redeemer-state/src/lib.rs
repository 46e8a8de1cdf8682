pub mod db;
pub mod engine;
pub mod ledger;

pub use db::StateDb;
pub use engine::{MigrationEngine, Receipt};
pub use ledger::{Authority, Ledger, ProgramSigner, StagedLedger, TokenLedger};
