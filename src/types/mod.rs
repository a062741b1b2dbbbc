//! User-facing types for building requests and reading relay outcomes

pub mod operation;
pub mod relay;

pub use operation::Operation;
pub use relay::{ExecutionResult, FlushOutcome, PendingView, SignedRequest};
