//! The chaining operator, `then`.
use crate::{resolution::resolve_procedure, Deferred, Value};

/// A reaction handler. `Err` is the handler throwing.
pub type Handler = Box<dyn FnOnce(Value) -> Result<Value, Value>>;

/// Boxes a closure for [`Deferred::then`].
pub fn handler<F>(f: F) -> Option<Handler>
where
    F: FnOnce(Value) -> Result<Value, Value> + 'static,
{
    Some(Box::new(f) as Handler)
}

fn pass_through(value: Value) -> Result<Value, Value> {
    Ok(value)
}

fn rethrow(reason: Value) -> Result<Value, Value> {
    Err(reason)
}

impl Deferred {
    /// Chains a new deferred value onto this one.
    ///
    /// The chosen handler runs on a later turn of the host queue, never
    /// inline, whether this value is already settled or not. Its `Ok` result
    /// is adopted through the resolution procedure and its `Err` rejects the
    /// returned value. Missing handlers pass the settlement through.
    ///
    /// # Examples
    ///
    /// ```
    /// use thenable::{handler, Deferred, Host, JobQueue, Value};
    ///
    /// let jobs = JobQueue::new();
    /// let host = Host::new(jobs.clone());
    /// let failed = thenable::reject(&host, Value::from("nope"));
    /// let recovered = failed
    ///     .then(None, None)
    ///     .then(None, handler(|reason| Ok(Value::List(vec![reason]))));
    /// jobs.run_until_idle();
    /// assert_eq!(recovered.value(), Some(Value::List(vec![Value::from("nope")])));
    /// ```
    pub fn then(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Deferred {
        let derived = Deferred::pending(self.host());
        let on_fulfilled = on_fulfilled.unwrap_or_else(|| Box::new(pass_through));
        let on_rejected = on_rejected.unwrap_or_else(|| Box::new(rethrow));
        let fulfilled_target = derived.clone();
        let rejected_target = derived.clone();
        self.react(
            move |value| run_handler(&fulfilled_target, on_fulfilled, value),
            move |reason| run_handler(&rejected_target, on_rejected, reason),
        );
        derived
    }

    /// Chains an infallible fulfilment handler; rejections pass through.
    pub fn map<F>(&self, f: F) -> Deferred
    where
        F: FnOnce(Value) -> Value + 'static,
    {
        self.then(handler(move |value| Ok(f(value))), None)
    }
}

fn run_handler(derived: &Deferred, handler: Handler, argument: Value) {
    match handler(argument) {
        Ok(outcome) => resolve_procedure(derived, outcome),
        Err(reason) => derived.settle_rejected(reason),
    }
}
