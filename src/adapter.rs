//! Adapters for code outside the deferred model: a compliance-suite
//! factory and a Node-style callback wrapper.
use crate::{Deferred, Host, Reject, Resolve, Value};

/// A pending deferred value together with its settlement capabilities.
#[derive(Debug, Clone)]
pub struct Capability {
    pub deferred: Deferred,
    pub resolve: Resolve,
    pub reject: Reject,
}

/// Factory expected by Promises/A+ style compliance suites.
///
/// # Examples
///
/// ```
/// use thenable::{deferred, Host, JobQueue, State, Value};
///
/// let host = Host::new(JobQueue::new());
/// let d = deferred(&host);
/// assert_eq!(d.deferred.state(), State::Pending);
/// d.resolve.call(Value::from(1));
/// assert_eq!(d.deferred.value(), Some(Value::from(1)));
/// ```
pub fn deferred(host: &Host) -> Capability {
    let deferred = Deferred::pending(host);
    let (resolve, reject) = deferred.capabilities();
    Capability {
        deferred,
        resolve,
        reject,
    }
}

/// The trailing `(error, result)` callback handed to a wrapped function.
#[derive(Debug, Clone)]
pub struct NodeCallback {
    resolve: Resolve,
    reject: Reject,
}

impl NodeCallback {
    /// An `error` of `None`, `Undefined` or `Null` means success.
    pub fn call(&self, error: Option<Value>, result: Value) {
        match error {
            None | Some(Value::Undefined) | Some(Value::Null) => self.resolve.call(result),
            Some(error) => self.reject.call(error),
        }
    }
}

/// Wraps a callback-style function so that calling it returns a
/// [`Deferred`] settled by its callback.
///
/// `f` receives the leading arguments and a [`NodeCallback`]. An `Err` from
/// `f` rejects the returned value.
///
/// # Examples
///
/// ```
/// use thenable::{promisify, Host, JobQueue, Value};
///
/// let host = Host::new(JobQueue::new());
/// let read = promisify(&host, |args, done| {
///     match args.first() {
///         Some(Value::String(path)) => done.call(None, Value::from(format!("contents of {path}"))),
///         _ => done.call(Some(Value::from("ENOENT")), Value::Undefined),
///     }
///     Ok(())
/// });
/// assert_eq!(read(vec!["a.txt".into()]).value(), Some(Value::from("contents of a.txt")));
/// assert_eq!(read(Vec::new()).reason(), Some(Value::from("ENOENT")));
/// ```
pub fn promisify<F>(host: &Host, f: F) -> impl Fn(Vec<Value>) -> Deferred
where
    F: Fn(Vec<Value>, NodeCallback) -> Result<(), Value> + 'static,
{
    let host = host.clone();
    move |args| Deferred::new(&host, |resolve, reject| f(args, NodeCallback { resolve, reject }))
}
