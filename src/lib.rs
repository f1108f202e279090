//! A single-assignment deferred value that follows the Promises/A+
//! interoperability rules.
//!
//! A [`Deferred`] starts pending and settles exactly once, either fulfilled
//! with a [`Value`] or rejected with a reason. Reactions attached with
//! [`Deferred::then`] never run inline: they are submitted to the host's
//! [`TaskQueue`] and run on a later turn.
//!
//! # Examples
//!
//! ```
//! use thenable::{handler, Deferred, Host, JobQueue, Value};
//!
//! let jobs = JobQueue::new();
//! let host = Host::new(jobs.clone());
//!
//! let doubled = Deferred::new(&host, |resolve, _reject| {
//!     resolve.call(Value::from(21));
//!     Ok(())
//! })
//! .then(handler(|v| Ok(Value::from(v.as_number().unwrap_or_default() * 2.0))), None);
//!
//! assert!(doubled.value().is_none());
//! jobs.run_until_idle();
//! assert_eq!(doubled.value(), Some(Value::from(42)));
//! ```
use thiserror::Error;

pub mod adapter;
mod chain;
pub mod combinators;
mod deferred;
pub mod queue;
pub mod resolution;
mod settled;
mod sugar;
pub mod value;

pub use adapter::{deferred, promisify, Capability, NodeCallback};
pub use chain::{handler, Handler};
pub use combinators::{all, all_settled, any, race, reject, resolve};
pub use deferred::{Deferred, Reject, Resolve, State};
pub use queue::{Host, JobQueue, Task, TaskQueue};
pub use settled::Settled;
pub use value::{Callback, Object, ThenFn, Value};

/// Type-mismatch failures raised by the deferred machinery itself.
///
/// These travel as rejection reasons wrapped in [`Value::Error`]; consumer
/// reasons are never converted into this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("cannot resolve a value with itself")]
    SelfResolution,
    #[error("expected an indexable sequence")]
    NotASequence,
}
