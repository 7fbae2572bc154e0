//! Protobuf envelopes persisted by the durable queue
//!
//! - `JobTask` - one queued job, payload carried as JSON bytes
//! - `DeadLetterTask` - a job that exhausted its attempts or failed permanently
//!
//! ## Usage
//!
//! ```rust,ignore
//! use postforge::proto::JobTask;
//! use prost::Message;
//!
//! let task = JobTask {
//!     job_id: "0192f3c5-...".to_string(),
//!     kind: "content-generation".to_string(),
//!     ..Default::default()
//! };
//!
//! let bytes = task.encode_to_vec();
//! let decoded = JobTask::decode(&bytes[..])?;
//! ```

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JobTask {
    #[prost(string, tag = "1")]
    pub job_id: ::prost::alloc::string::String,
    /// `content-generation` | `niche-analysis`
    #[prost(string, tag = "2")]
    pub kind: ::prost::alloc::string::String,
    /// JSON-encoded `JobPayload`
    #[prost(bytes = "vec", tag = "3")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag = "4")]
    pub max_attempts: u32,
    #[prost(uint64, tag = "5")]
    pub backoff_ms: u64,
    #[prost(uint64, tag = "6")]
    pub enqueued_at_ms: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeadLetterTask {
    #[prost(message, optional, tag = "1")]
    pub task: ::core::option::Option<JobTask>,
    #[prost(string, tag = "2")]
    pub failure_code: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub failure_message: ::prost::alloc::string::String,
    #[prost(uint32, tag = "4")]
    pub attempts: u32,
    #[prost(uint64, tag = "5")]
    pub failed_at_ms: u64,
}
