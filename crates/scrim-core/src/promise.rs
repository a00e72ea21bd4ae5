#![forbid(unsafe_code)]

//! Single-fire promises for dialog results.
//!
//! A [`promise`] call yields a [`Promise`] for the consumer and a
//! [`Resolver`] for the producer. The first [`Resolver::resolve`]
//! wins; every later attempt is ignored. Settlement callbacks run
//! exactly once each, whether registered before or after the value
//! arrives.
//!
//! Everything here is single-threaded: values and callbacks live in
//! `Rc<RefCell<_>>` shared between the two halves.

use std::cell::RefCell;
use std::rc::Rc;

struct PromiseInner<T> {
    value: Option<Rc<T>>,
    callbacks: Vec<Box<dyn FnOnce(&T)>>,
}

/// The consumer half: observe the eventual value.
pub struct Promise<T> {
    inner: Rc<RefCell<PromiseInner<T>>>,
}

/// The producer half: settle the promise.
pub struct Resolver<T> {
    inner: Rc<RefCell<PromiseInner<T>>>,
}

/// Create a linked promise/resolver pair.
#[must_use]
pub fn promise<T: 'static>() -> (Promise<T>, Resolver<T>) {
    let inner = Rc::new(RefCell::new(PromiseInner {
        value: None,
        callbacks: Vec::new(),
    }));
    (
        Promise {
            inner: Rc::clone(&inner),
        },
        Resolver { inner },
    )
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Promise<T> {
    /// Whether the promise has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.borrow().value.is_some()
    }

    /// Run `callback` with the settled value.
    ///
    /// If the promise is already settled the callback runs before
    /// this method returns; otherwise it runs inside the winning
    /// `resolve` call. Either way it runs at most once.
    pub fn on_settle(&self, callback: impl FnOnce(&T) + 'static) {
        let ready = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            match &inner.value {
                Some(value) => Some((Rc::clone(value), callback)),
                None => {
                    inner.callbacks.push(Box::new(callback));
                    None
                }
            }
        };
        // Borrow released before the callback runs, so it may freely
        // touch this same promise.
        if let Some((value, callback)) = ready {
            callback(&value);
        }
    }

    /// The settled value, if any.
    #[must_use]
    pub fn try_get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.borrow().value.as_deref().cloned()
    }
}

impl<T: 'static> Resolver<T> {
    /// Settle the promise. Returns whether this call won.
    ///
    /// The winning call drains the registered callbacks and runs them
    /// in registration order, outside any internal borrow.
    pub fn resolve(&self, value: T) -> bool {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if inner.value.is_some() {
                return false;
            }
            let value = Rc::new(value);
            inner.value = Some(Rc::clone(&value));
            (value, std::mem::take(&mut inner.callbacks))
        };
        for callback in callbacks {
            callback(&value);
        }
        true
    }

    /// Whether the promise has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.borrow().value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn first_resolve_wins() {
        let (p, r) = promise::<i32>();
        assert!(r.resolve(1));
        assert!(!r.resolve(2));
        assert_eq!(p.try_get(), Some(1));
    }

    #[test]
    fn callback_before_settlement_runs_on_resolve() {
        let (p, r) = promise::<String>();
        let seen = Rc::new(RefCell::new(String::new()));
        let s = Rc::clone(&seen);
        p.on_settle(move |v| *s.borrow_mut() = v.clone());
        assert!(seen.borrow().is_empty());

        r.resolve("done".to_owned());
        assert_eq!(&*seen.borrow(), "done");
    }

    #[test]
    fn callback_after_settlement_runs_immediately() {
        let (p, r) = promise::<i32>();
        r.resolve(7);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        p.on_settle(move |v| s.set(*v));
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn callbacks_run_in_registration_order() {
        let (p, r) = promise::<()>();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let o = Rc::clone(&order);
            p.on_settle(move |()| o.borrow_mut().push(i));
        }
        r.resolve(());
        assert_eq!(&*order.borrow(), &[0, 1, 2]);
    }

    #[test]
    fn reentrant_on_settle_inside_callback() {
        let (p, r) = promise::<i32>();
        let seen = Rc::new(Cell::new(0));
        let p2 = p.clone();
        let s = Rc::clone(&seen);
        p.on_settle(move |v| {
            let inner = *v;
            let s2 = Rc::clone(&s);
            p2.on_settle(move |v| s2.set(inner + *v));
        });
        r.resolve(5);
        assert_eq!(seen.get(), 10);
    }

    #[test]
    fn clones_share_settlement() {
        let (p, r) = promise::<i32>();
        let r2 = r.clone();
        assert!(r2.resolve(3));
        assert!(!r.resolve(4));
        assert!(p.is_settled());
        assert_eq!(p.clone().try_get(), Some(3));
    }
}
