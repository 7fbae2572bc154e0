//! Fjall-backed ledger of broker job snapshots
//!
//! Every queued job has one `JobSnapshot` record, written on enqueue and
//! updated by the worker on each transition. Status queries for broker ids
//! read from here. Directly executed jobs never touch the ledger.
//! Completed and failed snapshots are pruned once older than the broker's
//! retention window.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use postforge::ledger::FjallStore;
//!
//! let store = FjallStore::open("data/ledger")?;
//! store.upsert(&snapshot)?;
//! let snapshot = store.get(&job_id)?;
//! ```

pub mod error;
pub mod partitions;
pub mod pruning;
pub mod store;

pub use error::{LedgerError, Result};
pub use store::{FjallStore, StoreStats};
