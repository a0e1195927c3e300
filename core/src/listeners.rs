//! Synchronous observer registries.
//!
//! A [`Listeners`] value maps subscriber identity to a callback. Registering
//! returns a [`SubscriberId`]; the same id is never handed out twice by one
//! registry, so membership is unique by construction. Notification is
//! synchronous: every callback runs to completion, in registration order,
//! before [`Listeners::notify`] returns.
//!
//! Callers must not depend on the relative order in which different
//! subscribers observe an event.
//!
//! # Example
//!
//! ```
//! use metrotik_core::listeners::Listeners;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let mut listeners = Listeners::new();
//!
//! let sink = Rc::clone(&seen);
//! let id = listeners.subscribe(move |value: &u32| sink.borrow_mut().push(*value));
//!
//! listeners.notify(&7);
//! assert!(listeners.unsubscribe(id));
//! listeners.notify(&8);
//!
//! assert_eq!(*seen.borrow(), vec![7]);
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Identity of a registered subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Returns the raw identifier
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

type Callback<E> = Box<dyn FnMut(&E)>;

/// Registry of callbacks interested in events of type `E`
pub struct Listeners<E> {
    next_id: u64,
    callbacks: BTreeMap<SubscriberId, Callback<E>>,
}

impl<E> Listeners<E> {
    /// Creates an empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            callbacks: BTreeMap::new(),
        }
    }

    /// Registers a callback and returns its identity
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&E) + 'static,
    {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.callbacks.insert(id, Box::new(callback));
        tracing::trace!(subscriber = %id, "Listener registered");
        id
    }

    /// Removes a subscriber, returning whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.callbacks.remove(&id).is_some()
    }

    /// Invokes every registered callback once with `event`
    pub fn notify(&mut self, event: &E) {
        for callback in self.callbacks.values_mut() {
            callback(event);
        }
    }

    /// Number of registered subscribers
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns true if nobody is subscribed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Returns true if `id` is currently subscribed
    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.callbacks.contains_key(&id)
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("subscribers", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_ids_are_never_reused() {
        let mut listeners: Listeners<()> = Listeners::new();
        let first = listeners.subscribe(|()| {});
        assert!(listeners.unsubscribe(first));
        let second = listeners.subscribe(|()| {});

        assert_ne!(first, second);
        assert!(!listeners.contains(first));
        assert!(listeners.contains(second));
    }

    #[test]
    fn test_notify_reaches_every_subscriber_once() {
        let calls = Rc::new(Cell::new(0));
        let mut listeners: Listeners<u8> = Listeners::new();

        for _ in 0..3 {
            let calls = Rc::clone(&calls);
            listeners.subscribe(move |_| calls.set(calls.get() + 1));
        }

        listeners.notify(&1);
        assert_eq!(calls.get(), 3);
        assert_eq!(listeners.len(), 3);
    }

    #[test]
    fn test_unsubscribe_unknown_id() {
        let mut listeners: Listeners<u8> = Listeners::new();
        let id = listeners.subscribe(|_| {});
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        assert!(listeners.is_empty());
    }
}
