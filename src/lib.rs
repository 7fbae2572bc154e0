pub mod api;
pub mod config;
pub mod extractor;
pub mod handlers;
pub mod jobs;
pub mod ledger;
pub mod model;
pub mod observability;
pub mod parser;
pub mod pipeline;
pub mod platform;
pub mod proto;
pub mod queue;
pub mod scrape;
pub mod validation;
pub mod worker;
