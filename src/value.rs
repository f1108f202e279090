//! Dynamic payloads carried by settlements, and the `then` capability check
//! used to recognise foreign thenables.
use std::{fmt, rc::Rc};

use crate::{Deferred, Error};

/// A callable `then` member. It is invoked with the owning object as
/// receiver, followed by the fulfil and reject callbacks. `Err` means the
/// call threw.
pub type ThenFn = Rc<dyn Fn(&Value, Callback, Callback) -> Result<(), Value>>;

/// An object-like value that may expose a `then` member.
///
/// Implementors decide how reading `then` behaves:
///
/// * `Err(reason)` when reading the member throws,
/// * `Ok(None)` when there is no member or it is not callable,
/// * `Ok(Some(then))` when it can be called.
pub trait Object: fmt::Debug {
    fn then(&self) -> Result<Option<ThenFn>, Value>;
}

/// A settlement callback handed to a foreign `then`. It may be called any
/// number of times; the resolution procedure ignores all but the first.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(Value)>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, value: Value) {
        (self.0)(value)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// Anything a [`Deferred`] can be fulfilled or rejected with.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Error(Error),
    Deferred(Deferred),
    Object(Rc<dyn Object>),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Value::Deferred(deferred) => Some(deferred),
            _ => None,
        }
    }

    /// True for values the resolution procedure must read `then` from.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Deferred(_) | Value::Object(_))
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Deferred(a), Value::Deferred(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Error> for Value {
    fn from(error: Error) -> Self {
        Value::Error(error)
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Value::Deferred(deferred)
    }
}
