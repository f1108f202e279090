//! The settlement state machine.
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use crate::{Error, Host, Value};

/// Observable phase of a [`Deferred`]. Only `Pending → Fulfilled` and
/// `Pending → Rejected` ever happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

pub(crate) type Reaction = Box<dyn FnOnce(Value)>;

enum Settlement {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

struct Inner {
    settlement: Settlement,
    fulfill_reactions: Vec<Reaction>,
    reject_reactions: Vec<Reaction>,
}

/// A settle-once asynchronous value.
///
/// Cloning yields another handle onto the same settlement. Only the
/// [`Resolve`] and [`Reject`] capabilities given to the initializer can
/// settle it.
///
/// # Examples
///
/// ```
/// use thenable::{Deferred, Host, JobQueue, State, Value};
///
/// let host = Host::new(JobQueue::new());
/// let d = Deferred::new(&host, |resolve, reject| {
///     resolve.call(Value::from("first"));
///     reject.call(Value::from("ignored"));
///     Ok(())
/// });
/// assert_eq!(d.state(), State::Fulfilled);
/// assert_eq!(d.value(), Some(Value::from("first")));
/// ```
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<RefCell<Inner>>,
    host: Host,
}

impl Deferred {
    /// Creates a deferred value and runs `initializer` synchronously with its
    /// settlement capabilities. An `Err` from the initializer rejects the
    /// value with that reason.
    pub fn new<F>(host: &Host, initializer: F) -> Self
    where
        F: FnOnce(Resolve, Reject) -> Result<(), Value>,
    {
        let deferred = Self::pending(host);
        let (resolve, reject) = deferred.capabilities();
        if let Err(reason) = initializer(resolve, reject) {
            deferred.settle_rejected(reason);
        }
        deferred
    }

    pub(crate) fn pending(host: &Host) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                settlement: Settlement::Pending,
                fulfill_reactions: Vec::new(),
                reject_reactions: Vec::new(),
            })),
            host: host.clone(),
        }
    }

    pub(crate) fn capabilities(&self) -> (Resolve, Reject) {
        (
            Resolve {
                target: self.clone(),
            },
            Reject {
                target: self.clone(),
            },
        )
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn state(&self) -> State {
        match self.inner.borrow().settlement {
            Settlement::Pending => State::Pending,
            Settlement::Fulfilled(_) => State::Fulfilled,
            Settlement::Rejected(_) => State::Rejected,
        }
    }

    /// The fulfilment value, once fulfilled.
    pub fn value(&self) -> Option<Value> {
        match &self.inner.borrow().settlement {
            Settlement::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The rejection reason, once rejected.
    pub fn reason(&self) -> Option<Value> {
        match &self.inner.borrow().settlement {
            Settlement::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// True when both handles point at the same settlement.
    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Fulfils with `value`, adopting it first if it is itself a deferred
    /// value. A no-op once settled.
    pub(crate) fn settle_fulfilled(&self, value: Value) {
        if self.state() != State::Pending {
            return;
        }
        if let Value::Deferred(nested) = &value {
            if nested.ptr_eq(self) {
                tracing::debug!("deferred value resolved with itself");
                self.settle_rejected(Error::SelfResolution.into());
                return;
            }
            tracing::trace!("adopting nested deferred value");
            let (resolve, reject) = self.capabilities();
            nested.react(move |value| resolve.call(value), move |reason| reject.call(reason));
            return;
        }
        self.settle(Settlement::Fulfilled(value));
    }

    pub(crate) fn settle_rejected(&self, reason: Value) {
        self.settle(Settlement::Rejected(reason));
    }

    fn settle(&self, settlement: Settlement) {
        let (reactions, payload) = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            if !matches!(inner.settlement, Settlement::Pending) {
                return;
            }
            let picked = match &settlement {
                Settlement::Fulfilled(value) => {
                    (std::mem::take(&mut inner.fulfill_reactions), value.clone())
                }
                Settlement::Rejected(reason) => {
                    (std::mem::take(&mut inner.reject_reactions), reason.clone())
                }
                Settlement::Pending => return,
            };
            // The other side can never fire now.
            inner.fulfill_reactions.clear();
            inner.reject_reactions.clear();
            inner.settlement = settlement;
            picked
        };
        tracing::trace!(state = ?self.state(), reactions = reactions.len(), "deferred value settled");
        for reaction in reactions {
            reaction(payload.clone());
        }
    }

    /// Registers callbacks that run synchronously at settlement, or right
    /// away if already settled. Exactly one of them runs, at most once.
    pub(crate) fn on_settle<F>(&self, reaction: F)
    where
        F: FnOnce(Result<Value, Value>) + 'static,
    {
        let settled = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            match &inner.settlement {
                Settlement::Pending => {
                    let shared = Rc::new(Cell::new(Some(reaction)));
                    let on_reject = shared.clone();
                    inner.fulfill_reactions.push(Box::new(move |value| {
                        if let Some(reaction) = shared.take() {
                            reaction(Ok(value));
                        }
                    }));
                    inner.reject_reactions.push(Box::new(move |reason| {
                        if let Some(reaction) = on_reject.take() {
                            reaction(Err(reason));
                        }
                    }));
                    return;
                }
                Settlement::Fulfilled(value) => Ok(value.clone()),
                Settlement::Rejected(reason) => Err(reason.clone()),
            }
        };
        reaction(settled);
    }

    /// Registers callbacks that are submitted to the host queue once this
    /// value settles. Neither ever runs inline with this call.
    pub(crate) fn react<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: FnOnce(Value) + 'static,
        R: FnOnce(Value) + 'static,
    {
        let settled = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            match &inner.settlement {
                Settlement::Pending => {
                    let host = self.host.clone();
                    inner.fulfill_reactions.push(Box::new(move |value| {
                        host.submit(move || on_fulfilled(value));
                    }));
                    let host = self.host.clone();
                    inner.reject_reactions.push(Box::new(move |reason| {
                        host.submit(move || on_rejected(reason));
                    }));
                    return;
                }
                Settlement::Fulfilled(value) => Ok(value.clone()),
                Settlement::Rejected(reason) => Err(reason.clone()),
            }
        };
        match settled {
            Ok(value) => self.host.submit(move || on_fulfilled(value)),
            Err(reason) => self.host.submit(move || on_rejected(reason)),
        }
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => match &inner.settlement {
                Settlement::Pending => f.debug_tuple("Deferred").field(&State::Pending).finish(),
                Settlement::Fulfilled(value) => f
                    .debug_tuple("Deferred")
                    .field(&State::Fulfilled)
                    .field(value)
                    .finish(),
                Settlement::Rejected(reason) => f
                    .debug_tuple("Deferred")
                    .field(&State::Rejected)
                    .field(reason)
                    .finish(),
            },
            Err(_) => f.write_str("Deferred(<settling>)"),
        }
    }
}

/// Fulfil capability of a [`Deferred`].
#[derive(Debug, Clone)]
pub struct Resolve {
    target: Deferred,
}

impl Resolve {
    /// Fulfils the target. A deferred `value` is adopted rather than stored,
    /// and resolving a value with itself rejects it with
    /// [`Error::SelfResolution`].
    pub fn call(&self, value: Value) {
        self.target.settle_fulfilled(value);
    }
}

/// Reject capability of a [`Deferred`].
#[derive(Debug, Clone)]
pub struct Reject {
    target: Deferred,
}

impl Reject {
    pub fn call(&self, reason: Value) {
        self.target.settle_rejected(reason);
    }
}
