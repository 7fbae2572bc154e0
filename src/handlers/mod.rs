//! Job handlers
//!
//! - [`JobHandler`] - executes one payload kind
//! - [`HandlerRegistry`] - maps job kinds to handlers
//! - [`ContentHandler`] / [`NicheHandler`] - the built-in pipeline handlers
//!
//! ```rust,ignore
//! let registry = HandlerRegistry::with_pipelines(generator, analyzer);
//! let handler = registry.get(JobKind::NicheAnalysis)?;
//! let output = handler.execute(&payload).await?;
//! ```

mod pipelines;
mod registry;
mod traits;

pub use pipelines::{ContentHandler, NicheHandler};
pub use registry::HandlerRegistry;
pub use traits::JobHandler;
