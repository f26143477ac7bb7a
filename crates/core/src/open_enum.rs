//! Runtime-extensible enumerations.
//!
//! An [`OpenEnum`] owns a set of named constants. Constants are handed out as
//! [`EnumConstant`] handles: cloning a handle yields the same instance, and two
//! handles are equal only when they point at the same registered constant.
//! Handles serialize as their name; there is no way to deserialize one into a
//! fresh instance, callers go through the owning registry instead.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::OpenEnumError;

struct Inner<T> {
    name: String,
    ordinal: i32,
    value: T,
}

pub struct EnumConstant<T>(Arc<Inner<T>>);

impl<T> EnumConstant<T> {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ordinal(&self) -> i32 {
        self.0.ordinal
    }

    pub fn value(&self) -> &T {
        &self.0.value
    }
}

impl<T> Clone for EnumConstant<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for EnumConstant<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for EnumConstant<T> {}

impl<T> Hash for EnumConstant<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const () as usize).hash(state);
    }
}

impl<T> Deref for EnumConstant<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0.value
    }
}

impl<T> fmt::Debug for EnumConstant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.0.name, self.0.ordinal)
    }
}

impl<T> Serialize for EnumConstant<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.name)
    }
}

/// Token returned by [`OpenEnum::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&EnumConstant<T>) + Send + Sync>;

pub struct OpenEnum<T> {
    constants: RwLock<Vec<EnumConstant<T>>>,
    listeners: RwLock<Vec<(ListenerId, Listener<T>)>>,
    next_listener: AtomicU64,
}

impl<T> Default for OpenEnum<T> {
    fn default() -> Self {
        Self {
            constants: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }
}

impl<T> OpenEnum<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new constant. Names are unique within the registry.
    pub fn register(
        &self,
        name: impl Into<String>,
        ordinal: i32,
        value: T,
    ) -> Result<EnumConstant<T>, OpenEnumError> {
        let name = name.into();
        let constant = {
            let mut constants = self.constants.write();
            if constants.iter().any(|c| c.name() == name) {
                return Err(OpenEnumError::Duplicate(name));
            }
            let constant = EnumConstant(Arc::new(Inner {
                name,
                ordinal,
                value,
            }));
            constants.push(constant.clone());
            constant
        };
        self.notify(&constant);
        Ok(constant)
    }

    /// Return the constant called `name`, registering the one built by `make`
    /// if there is none yet. `make` receives the ordinal of the new constant
    /// (the current number of constants).
    pub fn get_or_register(&self, name: &str, make: impl FnOnce(i32) -> T) -> EnumConstant<T> {
        self.find_or_register(|c| c.name() == name, name, make)
    }

    /// Like [`get_or_register`](Self::get_or_register), but an existing
    /// constant is any one accepted by `matches`. The search and the insert
    /// happen under one write lock, so concurrent callers whose inputs match
    /// the same constant never create two.
    pub fn find_or_register(
        &self,
        matches: impl Fn(&EnumConstant<T>) -> bool,
        name: &str,
        make: impl FnOnce(i32) -> T,
    ) -> EnumConstant<T> {
        let constant = {
            let mut constants = self.constants.write();
            if let Some(existing) = constants
                .iter()
                .find(|c| c.name() == name || matches(c))
            {
                return existing.clone();
            }
            let ordinal = constants.len() as i32;
            let constant = EnumConstant(Arc::new(Inner {
                name: name.to_string(),
                ordinal,
                value: make(ordinal),
            }));
            constants.push(constant.clone());
            constant
        };
        debug!(name, ordinal = constant.ordinal(), "Registered new enum constant");
        self.notify(&constant);
        constant
    }

    pub fn value_of(&self, name: &str) -> Option<EnumConstant<T>> {
        self.constants.read().iter().find(|c| c.name() == name).cloned()
    }

    /// All constants in registration order.
    pub fn values(&self) -> Vec<EnumConstant<T>> {
        self.constants.read().clone()
    }

    pub fn len(&self) -> usize {
        self.constants.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.read().is_empty()
    }

    /// Call `listener` for every constant registered from now on.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&EnumConstant<T>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(l, _)| *l != id);
        listeners.len() != before
    }

    // Listeners run without any lock held so they may query the registry.
    fn notify(&self, constant: &EnumConstant<T>) {
        let listeners: Vec<Listener<T>> =
            self.listeners.read().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(constant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn value_of_returns_registered_instance() {
        let e: OpenEnum<&str> = OpenEnum::new();
        let a = e.register("A", 0, "first").unwrap();
        let found = e.value_of("A").unwrap();
        assert_eq!(a, found);
        assert_eq!(*found, "first");
        assert!(e.value_of("B").is_none());
    }

    #[test]
    fn equality_is_identity() {
        let one: OpenEnum<u8> = OpenEnum::new();
        let two: OpenEnum<u8> = OpenEnum::new();
        let a = one.register("X", 0, 1).unwrap();
        let b = two.register("X", 0, 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let e: OpenEnum<()> = OpenEnum::new();
        e.register("A", 0, ()).unwrap();
        assert!(matches!(e.register("A", 1, ()), Err(OpenEnumError::Duplicate(n)) if n == "A"));
        assert_eq!(e.len(), 1);
    }

    #[test]
    fn get_or_register_uses_next_ordinal() {
        let e: OpenEnum<i32> = OpenEnum::new();
        e.register("A", 0, 0).unwrap();
        e.register("B", 1, 0).unwrap();
        let c = e.get_or_register("C", |o| o * 10);
        assert_eq!(c.ordinal(), 2);
        assert_eq!(*c, 20);
        let again = e.get_or_register("C", |_| unreachable!());
        assert_eq!(c, again);
    }

    #[test]
    fn find_or_register_uses_predicate() {
        let e: OpenEnum<()> = OpenEnum::new();
        let a = e.register("Alpha", 0, ()).unwrap();
        let found = e.find_or_register(|c| c.name().eq_ignore_ascii_case("ALPHA"), "ALPHA", |_| ());
        assert_eq!(a, found);
        assert_eq!(e.len(), 1);

        let b = e.find_or_register(|_| false, "Beta", |_| ());
        assert_eq!(b.ordinal(), 1);
        assert_eq!(e.find_or_register(|_| false, "Beta", |_| ()), b);
        assert_eq!(e.len(), 2);
    }

    #[test]
    fn serializes_as_name() {
        let e: OpenEnum<()> = OpenEnum::new();
        let a = e.register("SCIENCE_FICTION", 30, ()).unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"SCIENCE_FICTION\"");
    }

    #[test]
    fn listeners_are_notified_until_removed() {
        let e: OpenEnum<()> = OpenEnum::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let id = e.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        e.register("A", 0, ()).unwrap();
        e.get_or_register("B", |_| ());
        e.get_or_register("B", |_| ());
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        assert!(e.remove_listener(id));
        assert!(!e.remove_listener(id));
        e.register("C", 2, ()).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_may_query_registry() {
        let e = Arc::new(OpenEnum::<()>::new());
        let inner = Arc::clone(&e);
        let found = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&found);
        e.add_listener(move |c| {
            if inner.value_of(c.name()).is_some() {
                f.fetch_add(1, Ordering::SeqCst);
            }
        });
        e.register("A", 0, ()).unwrap();
        assert_eq!(found.load(Ordering::SeqCst), 1);
    }
}
