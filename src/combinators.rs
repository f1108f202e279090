//! Aggregate and wrapping constructors built on the core and the resolution
//! procedure.
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{resolution::follow_then, Deferred, Error, Host, Value};

/// A deferred value fulfilled with `value`. A deferred `value` is adopted.
pub fn resolve(host: &Host, value: Value) -> Deferred {
    Deferred::new(host, |resolve, _| {
        resolve.call(value);
        Ok(())
    })
}

/// A deferred value rejected with `reason`.
pub fn reject(host: &Host, reason: Value) -> Deferred {
    Deferred::new(host, |_, reject| {
        reject.call(reason);
        Ok(())
    })
}

enum Entry {
    Thenable(Deferred),
    Plain(Value),
}

impl Entry {
    /// Reads an object's `then` once; a failed read counts as a plain value.
    fn classify(host: &Host, item: Value) -> Self {
        let then = match &item {
            Value::Deferred(deferred) => return Entry::Thenable(deferred.clone()),
            Value::Object(object) => object.then(),
            _ => return Entry::Plain(item),
        };
        match then {
            Ok(Some(then)) => {
                let derived = Deferred::pending(host);
                follow_then(&derived, item, then);
                Entry::Thenable(derived)
            }
            _ => Entry::Plain(item),
        }
    }
}

fn into_items(items: Value) -> Result<Vec<Value>, Value> {
    match items {
        Value::List(items) => Ok(items),
        _ => Err(Error::NotASequence.into()),
    }
}

/// Fulfils with every element's value, in input order, once all of them
/// have fulfilled. The first rejection rejects the aggregate.
///
/// Plain elements count as fulfilled straight away, so `all([])` fulfils
/// immediately with an empty list. Anything but a [`Value::List`] rejects
/// with [`Error::NotASequence`].
///
/// # Examples
///
/// ```
/// use thenable::{all, resolve, Host, JobQueue, Value};
///
/// let jobs = JobQueue::new();
/// let host = Host::new(jobs.clone());
/// let both = all(&host, Value::List(vec![Value::from(1), resolve(&host, Value::from(2)).into()]));
/// jobs.run_until_idle();
/// assert_eq!(both.value(), Some(Value::List(vec![Value::from(1), Value::from(2)])));
/// ```
pub fn all(host: &Host, items: Value) -> Deferred {
    Deferred::new(host, |resolve, reject| {
        let items = into_items(items)?;
        let len = items.len();
        if len == 0 {
            resolve.call(Value::List(Vec::new()));
            return Ok(());
        }
        let results = Rc::new(RefCell::new(vec![Value::Undefined; len]));
        let done = Rc::new(Cell::new(0));
        let store = Rc::new(move |index: usize, value: Value| {
            results.borrow_mut()[index] = value;
            done.set(done.get() + 1);
            if done.get() == len {
                let values = results.take();
                resolve.call(Value::List(values));
            }
        });
        for (index, item) in items.into_iter().enumerate() {
            match Entry::classify(host, item) {
                Entry::Thenable(deferred) => {
                    let store = store.clone();
                    let reject = reject.clone();
                    deferred.react(
                        move |value| store(index, value),
                        move |reason| reject.call(reason),
                    );
                }
                Entry::Plain(value) => store(index, value),
            }
        }
        Ok(())
    })
}

/// Settles like whichever element settles first.
///
/// Plain elements settle the race as soon as iteration reaches them, ahead
/// of any earlier element that is still waiting on the queue. `race([])`
/// never settles.
pub fn race(host: &Host, items: Value) -> Deferred {
    Deferred::new(host, |resolve, reject| {
        for item in into_items(items)? {
            match Entry::classify(host, item) {
                Entry::Thenable(deferred) => {
                    let resolve = resolve.clone();
                    let reject = reject.clone();
                    deferred.react(
                        move |value| resolve.call(value),
                        move |reason| reject.call(reason),
                    );
                }
                Entry::Plain(value) => resolve.call(value),
            }
        }
        Ok(())
    })
}

/// Always fulfils, once every element has settled, with one
/// `["fulfilled", value]` or `["rejected", reason]` record per element.
pub fn all_settled(host: &Host, items: Value) -> Deferred {
    fn record(status: &str, payload: Value) -> Value {
        Value::List(vec![Value::from(status), payload])
    }

    Deferred::new(host, |resolve, _| {
        let items = into_items(items)?;
        let len = items.len();
        if len == 0 {
            resolve.call(Value::List(Vec::new()));
            return Ok(());
        }
        let results = Rc::new(RefCell::new(vec![Value::Undefined; len]));
        let done = Rc::new(Cell::new(0));
        let store = Rc::new(move |index: usize, value: Value| {
            results.borrow_mut()[index] = value;
            done.set(done.get() + 1);
            if done.get() == len {
                let values = results.take();
                resolve.call(Value::List(values));
            }
        });
        for (index, item) in items.into_iter().enumerate() {
            match Entry::classify(host, item) {
                Entry::Thenable(deferred) => {
                    let (on_value, on_reason) = (store.clone(), store.clone());
                    deferred.react(
                        move |value| on_value(index, record("fulfilled", value)),
                        move |reason| on_reason(index, record("rejected", reason)),
                    );
                }
                Entry::Plain(value) => store(index, record("fulfilled", value)),
            }
        }
        Ok(())
    })
}

/// Fulfils with the first element to fulfil. Rejects with the list of every
/// reason, in input order, only when all elements reject; `any([])` rejects
/// with an empty list.
pub fn any(host: &Host, items: Value) -> Deferred {
    Deferred::new(host, |resolve, reject| {
        let items = into_items(items)?;
        let len = items.len();
        if len == 0 {
            reject.call(Value::List(Vec::new()));
            return Ok(());
        }
        let reasons = Rc::new(RefCell::new(vec![Value::Undefined; len]));
        let failed = Rc::new(Cell::new(0));
        let record_failure = Rc::new(move |index: usize, reason: Value| {
            reasons.borrow_mut()[index] = reason;
            failed.set(failed.get() + 1);
            if failed.get() == len {
                let reasons = reasons.take();
                reject.call(Value::List(reasons));
            }
        });
        for (index, item) in items.into_iter().enumerate() {
            match Entry::classify(host, item) {
                Entry::Thenable(deferred) => {
                    let resolve = resolve.clone();
                    let record_failure = record_failure.clone();
                    deferred.react(
                        move |value| resolve.call(value),
                        move |reason| record_failure(index, reason),
                    );
                }
                Entry::Plain(value) => resolve.call(value),
            }
        }
        Ok(())
    })
}
