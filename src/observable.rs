//! Latest-value broadcast for single-threaded state.
//!
//! An [`Observable`] holds the current value and a list of subscribers. Read
//! access is handed out as a [`Feed`], which can be polled with `get()` or
//! subscribed to. A subscriber is called immediately with the current value
//! and then once per `set`, in the order the values were set.
//!
//! Subscribers are stored as `Weak` callbacks; the strong side lives in the
//! [`Subscription`] returned to the caller, so dropping the guard ends
//! delivery. Dead entries are pruned the next time the value changes.
//!
//! No borrow is held while callbacks run, so a callback may read the feed it
//! is attached to.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct Shared<T> {
    value: Rc<T>,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

impl<T> Shared<T> {
    fn attach(&mut self, callback: &Rc<Callback<T>>) {
        self.subscribers.push(Rc::downgrade(callback));
    }
}

/// Writable side. Only the owner of the state should hold one.
pub struct Observable<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T: 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                value: Rc::new(value),
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> Rc<T> {
        Rc::clone(&self.shared.borrow().value)
    }

    pub fn version(&self) -> u64 {
        self.shared.borrow().version
    }

    /// Replace the value and notify every live subscriber with the new
    /// snapshot.
    pub fn set(&self, value: T) {
        let (snapshot, callbacks) = {
            let mut shared = self.shared.borrow_mut();
            shared.value = Rc::new(value);
            shared.version += 1;
            shared.subscribers.retain(|weak| weak.strong_count() > 0);
            let callbacks: Vec<Rc<Callback<T>>> =
                shared.subscribers.iter().filter_map(Weak::upgrade).collect();
            (Rc::clone(&shared.value), callbacks)
        };

        for callback in callbacks {
            callback(&*snapshot);
        }
    }

    pub fn feed(&self) -> Feed<T> {
        Feed {
            shared: Rc::clone(&self.shared),
        }
    }
}

/// Read-only handle on an [`Observable`].
pub struct Feed<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: 'static> Feed<T> {
    pub fn get(&self) -> Rc<T> {
        Rc::clone(&self.shared.borrow().value)
    }

    pub fn version(&self) -> u64 {
        self.shared.borrow().version
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        let current = {
            let mut shared = self.shared.borrow_mut();
            shared.attach(&callback);
            Rc::clone(&shared.value)
        };
        callback(&*current);
        Subscription {
            _guard: Box::new(callback),
        }
    }

    /// Derive a view that recomputes `project` on every emission.
    pub fn map<U, F>(&self, project: F) -> MappedFeed<T, U>
    where
        F: Fn(&T) -> U + 'static,
    {
        MappedFeed {
            source: self.clone(),
            project: Rc::new(project),
        }
    }
}

/// A [`Feed`] seen through a projection. Nothing is cached: `get()` projects
/// the current source value and subscribers receive the projection of each
/// emission.
pub struct MappedFeed<T, U> {
    source: Feed<T>,
    project: Rc<dyn Fn(&T) -> U>,
}

impl<T, U> Clone for MappedFeed<T, U> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            project: Rc::clone(&self.project),
        }
    }
}

impl<T: 'static, U: 'static> MappedFeed<T, U> {
    pub fn get(&self) -> U {
        let value = self.source.get();
        (self.project)(&*value)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&U) + 'static,
    {
        let project = Rc::clone(&self.project);
        self.source.subscribe(move |value| callback(&project(value)))
    }
}

/// Keeps a subscriber alive. Drop it to unsubscribe.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}
