//! Confidential token launchpad: catalog and balance readers, the flow
//! orchestrator, and the command-line tasks built on them.

pub mod balances;
pub mod catalog;
pub mod deploy;
pub mod inflight;
pub mod launchpad;
pub mod state;
pub mod tasks;

pub use balances::{BalanceHandle, fetch_balances};
pub use catalog::{CatalogToken, align_catalog, fetch_catalog};
pub use inflight::{FlowKind, InFlightGuard, InFlightRegistry, RequestToken};
pub use launchpad::Launchpad;
pub use state::{CreateForm, DEFAULT_PRICE, LaunchpadState};
