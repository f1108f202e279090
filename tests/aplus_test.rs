#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};
    use thenable::{
        deferred, handler, Callback, Deferred, Error, Host, JobQueue, Object, State, ThenFn,
        Value,
    };

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn host() -> (JobQueue, Host) {
        init_tracing();
        let jobs = JobQueue::new();
        (jobs.clone(), Host::new(jobs))
    }

    /// A thenable that hands out another thenable `depth` times before
    /// finally fulfilling with `value`.
    #[derive(Debug)]
    struct Nested {
        depth: usize,
        value: Value,
    }

    impl Object for Nested {
        fn then(&self) -> Result<Option<ThenFn>, Value> {
            let (depth, value) = (self.depth, self.value.clone());
            Ok(Some(Rc::new(move |_: &Value, on_y: Callback, _: Callback| {
                if depth == 0 {
                    on_y.call(value.clone());
                } else {
                    on_y.call(Value::Object(Rc::new(Nested {
                        depth: depth - 1,
                        value: value.clone(),
                    })));
                }
                Ok(())
            })))
        }
    }

    /// A thenable that settles on a later queue turn, like a foreign
    /// promise library would.
    #[derive(Debug)]
    struct Later {
        host: Host,
        outcome: Result<Value, Value>,
    }

    impl Object for Later {
        fn then(&self) -> Result<Option<ThenFn>, Value> {
            let outcome = self.outcome.clone();
            let host = self.host.clone();
            Ok(Some(Rc::new(move |_: &Value, on_y: Callback, on_r: Callback| {
                let outcome = outcome.clone();
                let source = thenable::resolve(&host, Value::Null);
                source.map(move |_| {
                    match outcome {
                        Ok(value) => on_y.call(value),
                        Err(reason) => on_r.call(reason),
                    }
                    Value::Undefined
                });
                Ok(())
            })))
        }
    }

    #[test]
    fn test_fulfilled_value_is_immutable() {
        let (jobs, host) = host();
        let d = deferred(&host);
        d.resolve.call(Value::from("a"));
        d.resolve.call(Value::from("b"));
        d.reject.call(Value::from("c"));
        jobs.run_until_idle();
        assert_eq!(d.deferred.state(), State::Fulfilled);
        assert_eq!(d.deferred.value(), Some(Value::from("a")));
        assert_eq!(d.deferred.reason(), None);
    }

    #[test]
    fn test_handlers_run_after_the_settling_stack_unwinds() {
        let (jobs, host) = host();
        let d = deferred(&host);
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        d.deferred.map(move |_| {
            l.borrow_mut().push("handler");
            Value::Undefined
        });
        d.resolve.call(Value::Null);
        log.borrow_mut().push("after resolve");
        jobs.run_until_idle();
        assert_eq!(*log.borrow(), vec!["after resolve", "handler"]);
    }

    #[test]
    fn test_then_on_settled_value_is_still_asynchronous() {
        let (jobs, host) = host();
        let d = thenable::reject(&host, Value::from("r"));
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        d.catch(move |reason| {
            *s.borrow_mut() = Some(reason);
            Ok(Value::Undefined)
        });
        assert!(seen.borrow().is_none());
        jobs.run_until_idle();
        assert_eq!(*seen.borrow(), Some(Value::from("r")));
    }

    #[test]
    fn test_multiple_handlers_on_one_value() {
        let (jobs, host) = host();
        let d = deferred(&host);
        let results: Vec<Deferred> = (1..=3_i32)
            .map(|n| {
                d.deferred
                    .map(move |v| Value::from(v.as_number().unwrap_or_default() * f64::from(n)))
            })
            .collect();
        d.resolve.call(Value::from(2));
        jobs.run_until_idle();
        let values: Vec<_> = results.iter().map(Deferred::value).collect();
        assert_eq!(values, vec![Some(2.into()), Some(4.into()), Some(6.into())]);
    }

    #[test]
    fn test_rejection_skips_fulfil_handlers() {
        let (jobs, host) = host();
        let d = thenable::reject(&host, Value::from("why"))
            .map(|_| Value::from("unreachable"))
            .map(|_| Value::from("still unreachable"))
            .catch(|reason| Ok(Value::List(vec![Value::from("caught"), reason])));
        jobs.run_until_idle();
        assert_eq!(
            d.value(),
            Some(Value::List(vec!["caught".into(), "why".into()]))
        );
    }

    #[test]
    fn test_self_resolution_through_capability_rejects() {
        let (jobs, host) = host();
        let d = deferred(&host);
        d.resolve.call(Value::Deferred(d.deferred.clone()));
        jobs.run_until_idle();
        assert_eq!(d.deferred.state(), State::Rejected);
        assert!(d.deferred.reason().is_some_and(|r| r.is_type_error()));
    }

    #[test]
    fn test_handler_returning_its_own_derived_value_rejects() {
        let (jobs, host) = host();
        let cell: Rc<RefCell<Option<Deferred>>> = Rc::new(RefCell::new(None));
        let me = cell.clone();
        let derived = thenable::resolve(&host, Value::Null).then(
            handler(move |_| Ok(me.borrow().clone().map(Value::Deferred).unwrap_or_default())),
            None,
        );
        *cell.borrow_mut() = Some(derived.clone());
        jobs.run_until_idle();
        assert_eq!(derived.reason(), Some(Value::Error(Error::SelfResolution)));
        cell.borrow_mut().take();
    }

    #[test]
    fn test_nested_foreign_thenables_are_adopted() {
        let (jobs, host) = host();
        let d = thenable::resolve(&host, Value::Null).then(
            handler(|_| {
                Ok(Value::Object(Rc::new(Nested {
                    depth: 4,
                    value: Value::from("deep"),
                })))
            }),
            None,
        );
        jobs.run_until_idle();
        assert_eq!(d.value(), Some(Value::from("deep")));
    }

    #[test]
    fn test_asynchronous_foreign_thenables_are_adopted() {
        let (jobs, host) = host();
        let ok_host = host.clone();
        let err_host = host.clone();
        let fulfilled = thenable::resolve(&host, Value::Null).then(
            handler(move |_| {
                Ok(Value::Object(Rc::new(Later {
                    host: ok_host,
                    outcome: Ok(Value::from(1)),
                })))
            }),
            None,
        );
        let rejected = thenable::resolve(&host, Value::Null).then(
            handler(move |_| {
                Ok(Value::Object(Rc::new(Later {
                    host: err_host,
                    outcome: Err(Value::from("foreign")),
                })))
            }),
            None,
        );
        jobs.run_until_idle();
        assert_eq!(fulfilled.value(), Some(Value::from(1)));
        assert_eq!(rejected.reason(), Some(Value::from("foreign")));
    }

    #[test]
    fn test_deferred_returned_from_handler_is_adopted() {
        let (jobs, host) = host();
        let inner = deferred(&host);
        let pending = inner.deferred.clone();
        let outer = thenable::resolve(&host, Value::Null).then(handler(move |_| Ok(pending.into())), None);
        jobs.run_until_idle();
        assert_eq!(outer.state(), State::Pending);
        inner.resolve.call(Value::from("eventually"));
        jobs.run_until_idle();
        assert_eq!(outer.value(), Some(Value::from("eventually")));
    }
}
