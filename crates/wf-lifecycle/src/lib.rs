//! Lifecycle owners for screens and views.
//!
//! A [`Lifecycle`] is an observable active/inactive flag with a terminal
//! destroyed state. Anything scoped to it either registers an observer or a
//! keyed binding that is cancelled the moment the lifecycle stops being active.

use core::fmt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Weak;
use tracing::debug;
use wf_core::IdGenerator;

static LIFECYCLE_IDS: IdGenerator = IdGenerator::new(1);

/// Process-unique identifier of a lifecycle owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LifecycleId(u64);

impl LifecycleId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initialized,
    Active,
    Inactive,
    Destroyed,
}

impl LifecycleState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Destroyed => "destroyed",
        }
    }
}

/// Identifies a binding slot on a lifecycle; binding twice under the same key
/// cancels the earlier binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    kind: &'static str,
    id: u64,
}

impl BindingKey {
    pub fn new(kind: &'static str, id: u64) -> Self {
        Self { kind, id }
    }
}

type Observer = Arc<dyn Fn(LifecycleState) + Send + Sync>;
type Cancel = Box<dyn FnOnce() + Send>;

struct Inner {
    id: LifecycleId,
    name: String,
    state: Mutex<LifecycleState>,
    observers: Mutex<Vec<(u64, Observer)>>,
    bindings: Mutex<HashMap<BindingKey, Cancel>>,
    observer_ids: IdGenerator,
}

/// Shared handle to a lifecycle owner (a screen, a view, a toolbar widget).
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

impl Lifecycle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: LifecycleId(LIFECYCLE_IDS.next()),
                name: name.into(),
                state: Mutex::new(LifecycleState::Initialized),
                observers: Mutex::new(Vec::new()),
                bindings: Mutex::new(HashMap::new()),
                observer_ids: IdGenerator::default(),
            }),
        }
    }

    pub fn id(&self) -> LifecycleId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> LifecycleState {
        *self.inner.state.lock()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn activate(&self) -> bool {
        self.transition(LifecycleState::Active)
    }

    pub fn deactivate(&self) -> bool {
        self.transition(LifecycleState::Inactive)
    }

    pub fn destroy(&self) -> bool {
        self.transition(LifecycleState::Destroyed)
    }

    /// Registers `observer` for every later transition. The observer stays
    /// registered for as long as the returned handle lives.
    pub fn observe<F>(&self, observer: F) -> LifecycleObservation
    where
        F: Fn(LifecycleState) + Send + Sync + 'static,
    {
        let id = self.inner.observer_ids.next();
        self.inner.observers.lock().push((id, Arc::new(observer)));
        LifecycleObservation {
            lifecycle: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Scopes `cancel` to the current active window.
    ///
    /// Returns false without storing anything if the lifecycle is not active.
    /// A previous binding under the same key is cancelled before this returns.
    pub fn bind<F>(&self, key: BindingKey, cancel: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let replaced = {
            let mut bindings = self.inner.bindings.lock();
            if !self.inner.state.lock().is_active() {
                return false;
            }
            bindings.insert(key, Box::new(cancel))
        };

        if let Some(previous) = replaced {
            debug!(lifecycle = %self.inner.name, ?key, "replacing lifecycle binding");
            previous();
        }
        true
    }

    pub fn binding_count(&self) -> usize {
        self.inner.bindings.lock().len()
    }

    fn transition(&self, to: LifecycleState) -> bool {
        let from = {
            let mut state = self.inner.state.lock();
            let from = *state;
            if from == to || from == LifecycleState::Destroyed {
                return false;
            }
            *state = to;
            from
        };

        debug!(
            lifecycle = %self.inner.name,
            from = from.as_str(),
            to = to.as_str(),
            "lifecycle transition"
        );

        if from.is_active() && !to.is_active() {
            let cancels: Vec<Cancel> = self
                .inner
                .bindings
                .lock()
                .drain()
                .map(|(_, cancel)| cancel)
                .collect();
            for cancel in cancels {
                cancel();
            }
        }

        let observers: Vec<Observer> = self
            .inner
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(to);
        }

        if to == LifecycleState::Destroyed {
            self.inner.observers.lock().clear();
        }
        true
    }
}

/// Registration handle returned by [`Lifecycle::observe`].
///
/// Dropping the handle unregisters the observer. Removal after the lifecycle
/// itself is gone is a no-op.
#[derive(Debug)]
pub struct LifecycleObservation {
    lifecycle: Weak<Inner>,
    id: u64,
}

impl LifecycleObservation {
    pub fn remove(&mut self) {
        if let Some(inner) = self.lifecycle.upgrade() {
            inner.observers.lock().retain(|(id, _)| *id != self.id);
        }
        self.lifecycle = Weak::new();
    }
}

impl Drop for LifecycleObservation {
    fn drop(&mut self) {
        self.remove();
    }
}
