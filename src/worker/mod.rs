//! Queue workers
//!
//! Each worker owns one mpsc receiver of its kind's lane and executes tasks
//! one at a time, moving the ledger snapshot through
//! `pending → active → {completed | failed}`. Retryable failures back off
//! exponentially (`base * 2^(attempt - 1)`); exhausted or permanent failures
//! land in the dead letter queue.

mod runner;

pub use runner::Worker;
