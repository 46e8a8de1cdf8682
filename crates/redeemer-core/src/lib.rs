pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod governance;
pub mod instruction;
pub mod math;
pub mod types;

pub use config::{InitializeParams, MigrationConfig};
pub use constants::*;
pub use error::RedeemerError;
pub use event::{EventRecord, MigrationEvent};
pub use governance::UpgradeState;
pub use instruction::{Instruction, Request, SignedRequest};
pub use types::*;
