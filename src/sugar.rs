//! `catch` and `finally`, expressed through `then`.
use std::{cell::Cell, rc::Rc};

use crate::{chain::handler, resolution::adopt, Deferred, Host, Value};

impl Deferred {
    /// Handles rejections only; fulfilment passes through untouched.
    pub fn catch<F>(&self, on_rejected: F) -> Deferred
    where
        F: FnOnce(Value) -> Result<Value, Value> + 'static,
    {
        self.then(None, handler(on_rejected))
    }

    /// Runs `on_settled` after either outcome and then settles exactly like
    /// this value, keeping the original value or reason.
    ///
    /// The result of `on_settled` is adopted and waited for before settling.
    /// If it fails, or adopts a rejection, that failure rejects the returned
    /// value instead.
    pub fn finally<F>(&self, on_settled: F) -> Deferred
    where
        F: FnOnce() -> Result<Value, Value> + 'static,
    {
        let slot = Rc::new(Cell::new(Some(on_settled)));
        let (host, fulfilled_slot, rejected_slot) = (self.host().clone(), slot.clone(), slot);
        let rejected_host = host.clone();
        self.then(
            handler(move |value| {
                let cleanup = run_cleanup(&host, &fulfilled_slot)?;
                Ok(Value::Deferred(cleanup.map(move |_| value)))
            }),
            handler(move |reason| {
                let cleanup = run_cleanup(&rejected_host, &rejected_slot)?;
                Ok(Value::Deferred(cleanup.then(handler(move |_| Err(reason)), None)))
            }),
        )
    }
}

fn run_cleanup<F>(host: &Host, slot: &Rc<Cell<Option<F>>>) -> Result<Deferred, Value>
where
    F: FnOnce() -> Result<Value, Value>,
{
    let outcome = match slot.take() {
        Some(on_settled) => on_settled()?,
        None => Value::Undefined,
    };
    Ok(adopt(host, outcome))
}

#[cfg(test)]
mod tests {
    use crate::{reject, resolve, Host, JobQueue, Value};
    use std::cell::Cell;
    use std::rc::Rc;

    fn host() -> (JobQueue, Host) {
        let jobs = JobQueue::new();
        (jobs.clone(), Host::new(jobs))
    }

    #[test]
    fn test_catch_ignores_fulfilment() {
        let (jobs, host) = host();
        let called = Rc::new(Cell::new(false));
        let flag = called.clone();
        let d = resolve(&host, Value::from(5)).catch(move |_| {
            flag.set(true);
            Ok(Value::Null)
        });
        jobs.run_until_idle();
        assert!(!called.get());
        assert_eq!(d.value(), Some(Value::from(5)));
    }

    #[test]
    fn test_catch_recovers() {
        let (jobs, host) = host();
        let d = reject(&host, Value::from("bad")).catch(|reason| Ok(Value::List(vec![reason])));
        jobs.run_until_idle();
        assert_eq!(d.value(), Some(Value::List(vec!["bad".into()])));
    }

    #[test]
    fn test_finally_keeps_value() {
        let (jobs, host) = host();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let d = resolve(&host, Value::from("kept")).finally(move || {
            counter.set(counter.get() + 1);
            Ok(Value::from("discarded"))
        });
        jobs.run_until_idle();
        assert_eq!(runs.get(), 1);
        assert_eq!(d.value(), Some(Value::from("kept")));
    }

    #[test]
    fn test_finally_keeps_original_reason() {
        let (jobs, host) = host();
        let d = reject(&host, Value::from("original")).finally(|| Ok(Value::from("cleanup result")));
        jobs.run_until_idle();
        assert_eq!(d.reason(), Some(Value::from("original")));
    }

    #[test]
    fn test_finally_waits_for_cleanup() {
        let (jobs, host) = host();
        let cleanup = crate::deferred(&host);
        let pending = cleanup.deferred.clone();
        let d = resolve(&host, Value::from(1)).finally(move || Ok(Value::Deferred(pending)));
        jobs.run_until_idle();
        assert!(d.value().is_none());
        cleanup.resolve.call(Value::Null);
        jobs.run_until_idle();
        assert_eq!(d.value(), Some(Value::from(1)));
    }

    #[test]
    fn test_finally_failure_replaces_outcome() {
        let (jobs, host) = host();
        let thrown = resolve(&host, Value::from(1)).finally(|| Err(Value::from("cleanup threw")));
        let cleanup_host = host.clone();
        let rejected = resolve(&host, Value::from(1))
            .finally(move || Ok(Value::Deferred(reject(&cleanup_host, Value::from("late")))));
        jobs.run_until_idle();
        assert_eq!(thrown.reason(), Some(Value::from("cleanup threw")));
        assert_eq!(rejected.reason(), Some(Value::from("late")));
    }
}
