//! Adopting an arbitrary outcome into a definite settlement.
//!
//! This is the interoperability boundary: any [`Value::Object`] whose `then`
//! member is callable is followed to its terminal state, not only this
//! crate's own [`Deferred`].
use std::{cell::Cell, rc::Rc};

use crate::{Callback, Deferred, Error, Host, ThenFn, Value};

/// Settles `derived` from `outcome`.
///
/// 1. `outcome` pointing back at `derived` rejects with
///    [`Error::SelfResolution`].
/// 2. Values other than objects fulfil directly.
/// 3. Objects have `then` read once. A failed read rejects, a callable
///    `then` is invoked with fresh callbacks, and anything else fulfils with
///    the object itself.
///
/// The callbacks handed to a foreign `then` share a guard, so only the first
/// call to either of them counts, and an error raised by `then` after that
/// call is dropped.
pub fn resolve_procedure(derived: &Deferred, outcome: Value) {
    let then = match &outcome {
        Value::Deferred(nested) if nested.ptr_eq(derived) => {
            tracing::debug!("resolution outcome is the derived value itself");
            derived.settle_rejected(Error::SelfResolution.into());
            return;
        }
        Value::Deferred(nested) => {
            let on_fulfilled = derived.clone();
            let on_rejected = derived.clone();
            nested.react(
                move |y| resolve_procedure(&on_fulfilled, y),
                move |r| on_rejected.settle_rejected(r),
            );
            return;
        }
        Value::Object(object) => object.then(),
        _ => {
            derived.settle_fulfilled(outcome);
            return;
        }
    };

    let then = match then {
        Ok(Some(then)) => then,
        Ok(None) => {
            derived.settle_fulfilled(outcome);
            return;
        }
        Err(reason) => {
            tracing::debug!(?reason, "reading `then` failed");
            derived.settle_rejected(reason);
            return;
        }
    };

    follow_then(derived, outcome, then);
}

/// Invokes an already read `then` with `outcome` as receiver and guarded
/// callbacks that settle `derived`.
pub(crate) fn follow_then(derived: &Deferred, outcome: Value, then: ThenFn) {
    let called = Rc::new(Cell::new(false));
    let on_y = {
        let (called, derived) = (called.clone(), derived.clone());
        Callback::new(move |y| {
            if called.replace(true) {
                tracing::debug!("ignoring repeated thenable callback");
                return;
            }
            resolve_procedure(&derived, y);
        })
    };
    let on_r = {
        let (called, derived) = (called.clone(), derived.clone());
        Callback::new(move |r| {
            if called.replace(true) {
                tracing::debug!("ignoring repeated thenable callback");
                return;
            }
            derived.settle_rejected(r);
        })
    };
    if let Err(error) = then(&outcome, on_y, on_r) {
        if called.replace(true) {
            tracing::debug!(?error, "thenable failed after settling, ignored");
        } else {
            tracing::debug!(?error, "calling `then` failed");
            derived.settle_rejected(error);
        }
    }
}

/// Whether `value` exposes a callable `then`. A `then` read that fails
/// counts as not thenable.
pub fn is_thenable(value: &Value) -> bool {
    match value {
        Value::Deferred(_) => true,
        Value::Object(object) => matches!(object.then(), Ok(Some(_))),
        _ => false,
    }
}

/// A fresh deferred value settled from `value` through
/// [`resolve_procedure`].
pub fn adopt(host: &Host, value: Value) -> Deferred {
    let derived = Deferred::pending(host);
    resolve_procedure(&derived, value);
    derived
}
