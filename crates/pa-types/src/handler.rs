//! Callback registration for adapter notifications
//!
//! Adapters report asynchronous happenings (SIM state changes, toolkit
//! events, position fixes) by invoking every handler registered for that
//! event kind. Registration hands back a [`HandlerRef`] that can later be
//! used to unregister the callback.

use std::fmt;

/// Opaque reference to a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerRef(pub u32);

impl HandlerRef {
    /// Get the raw reference value
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Boxed handler callback
pub type Handler<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered set of callbacks for one event kind
pub struct HandlerRegistry<E> {
    handlers: Vec<(HandlerRef, Handler<E>)>,
    next_ref: u32,
}

impl<E> HandlerRegistry<E> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_ref: 1,
        }
    }

    /// Register a handler and return its reference
    pub fn add<F>(&mut self, handler: F) -> HandlerRef
    where
        F: FnMut(&E) + Send + 'static,
    {
        let handler_ref = HandlerRef(self.next_ref);
        self.next_ref = self.next_ref.wrapping_add(1).max(1);
        self.handlers.push((handler_ref, Box::new(handler)));
        handler_ref
    }

    /// Unregister a handler
    ///
    /// Returns false if the reference was not registered.
    pub fn remove(&mut self, handler_ref: HandlerRef) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(r, _)| *r != handler_ref);
        self.handlers.len() != before
    }

    /// Invoke every handler, in registration order
    pub fn notify(&mut self, event: &E) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handler is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Drop all handlers
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<E> Default for HandlerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for HandlerRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field(
                "handlers",
                &self.handlers.iter().map(|(r, _)| r).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_notify_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::<u32>::new();

        let a = Arc::clone(&seen);
        registry.add(move |e| a.lock().unwrap().push(("a", *e)));
        let b = Arc::clone(&seen);
        registry.add(move |e| b.lock().unwrap().push(("b", *e)));

        registry.notify(&7);

        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_remove_handler() {
        let count = Arc::new(Mutex::new(0));
        let mut registry = HandlerRegistry::<()>::new();

        let c = Arc::clone(&count);
        let r = registry.add(move |_| *c.lock().unwrap() += 1);
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(r));
        assert!(!registry.remove(r));
        assert!(registry.is_empty());

        registry.notify(&());
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn test_clear_drops_all_handlers() {
        let count = Arc::new(Mutex::new(0));
        let mut registry = HandlerRegistry::<()>::new();

        for _ in 0..3 {
            let c = Arc::clone(&count);
            registry.add(move |_| *c.lock().unwrap() += 1);
        }
        registry.clear();
        assert!(registry.is_empty());

        registry.notify(&());
        assert_eq!(*count.lock().unwrap(), 0);

        // References keep counting after a clear
        let r = registry.add(|_| {});
        assert_eq!(r.as_u32(), 4);
    }

    #[test]
    fn test_refs_are_unique() {
        let mut registry = HandlerRegistry::<()>::new();
        let r1 = registry.add(|_| {});
        let r2 = registry.add(|_| {});
        assert_ne!(r1, r2);
        assert!(r1.as_u32() > 0);
    }
}
