//! HTTP surface over the job router
//!
//! - `POST /content`, `POST /niche` - submit a job (200 with result when it
//!   ran directly, 202 when it was queued)
//! - `GET /jobs/{kind}/{job_id}` - status of a submitted job
//! - `POST /validate/content`, `POST /validate/analysis` - quality checks
//! - `GET /health` - execution mode and job counters

mod error;
pub mod models;
mod server;
pub mod services;
pub mod state;
pub(crate) mod utils;

pub use error::ApiError;
pub use server::{router, run};
pub use state::AppState;
