pub mod broker;
pub mod store;

pub use broker::{JobBroker, TaskEnvelope};
pub use store::{FjallQueue, QueueError};
