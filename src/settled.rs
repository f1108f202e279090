//! A `Future` over the settlement of a deferred value.
use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use crate::{Deferred, Value};

/// Future over the settlement of a [`Deferred`]. Resolves to `Ok(value)` or
/// `Err(reason)`. It may be cloned; every clone resolves.
///
/// The future only observes settlement. Chained work still needs the host
/// queue to be driven.
///
/// # Examples
///
/// ```
/// use thenable::{Host, JobQueue, Value};
/// use futures::executor::block_on;
///
/// let jobs = JobQueue::new();
/// let host = Host::new(jobs.clone());
/// let later = thenable::resolve(&host, Value::from(2)).map(|v| v);
/// let settled = later.settled();
/// jobs.run_until_idle();
/// assert_eq!(block_on(settled), Ok(Value::from(2)));
/// ```
#[derive(Clone)]
pub struct Settled {
    slot: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    outcome: Option<Result<Value, Value>>,
    wakers: Vec<Waker>,
}

impl Deferred {
    pub fn settled(&self) -> Settled {
        let slot = Rc::new(RefCell::new(Inner::default()));
        let target = slot.clone();
        self.on_settle(move |outcome| {
            let wakers = {
                let mut inner = target.borrow_mut();
                inner.outcome = Some(outcome);
                std::mem::take(&mut inner.wakers)
            };
            for waker in wakers {
                waker.wake()
            }
        });
        Settled { slot }
    }
}

impl Future for Settled {
    type Output = Result<Value, Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut guard = self.slot.borrow_mut();
        let inner = &mut *guard;
        match inner.outcome {
            Some(ref outcome) => Poll::Ready(outcome.clone()),
            None => {
                if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    inner.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}
