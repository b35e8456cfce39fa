//! Generic store publishing immutable snapshots.

use core::fmt;
use core::ops::Deref;
use parking_lot::Mutex;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tracing::trace;
use tracing::warn;
use wf_core::IdGenerator;

static STORE_IDS: IdGenerator = IdGenerator::new(1);

/// Process-unique identifier of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Immutable point-in-time state published by a [`Store`].
///
/// Versions increase by one with every dispatched action.
pub struct Snapshot<S> {
    version: u64,
    state: Arc<S>,
}

impl<S> Snapshot<S> {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S> Clone for Snapshot<S> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> Deref for Snapshot<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S: fmt::Debug> fmt::Debug for Snapshot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("version", &self.version)
            .field("state", &self.state)
            .finish()
    }
}

type Reducer<S, A> = dyn Fn(&S, A) -> S + Send + Sync;
type Observer<S> = Arc<dyn Fn(&Snapshot<S>) + Send + Sync>;

struct ObserverList<S> {
    entries: Mutex<Vec<(u64, Observer<S>)>>,
    ids: IdGenerator,
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

impl<S> Unsubscribe for ObserverList<S> {
    fn unsubscribe(&self, id: u64) {
        self.entries.lock().retain(|(entry, _)| *entry != id);
    }
}

struct StoreInner<S, A> {
    id: StoreId,
    reducer: Box<Reducer<S, A>>,
    current: RwLock<Snapshot<S>>,
    pending: Mutex<VecDeque<A>>,
    draining: AtomicBool,
    observers: Arc<ObserverList<S>>,
}

/// Holds the current snapshot and notifies observers of every new one.
///
/// Actions may be dispatched from any thread. Reductions run one at a time and
/// each resulting snapshot is handed to observers before the next action is
/// reduced. An observer that dispatches sees its action queued behind the
/// current notification.
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("version", &self.inner.current.read().version)
            .finish()
    }
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Send + 'static,
{
    pub fn new<R>(initial: S, reducer: R) -> Self
    where
        R: Fn(&S, A) -> S + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(StoreInner {
                id: StoreId(STORE_IDS.next()),
                reducer: Box::new(reducer),
                current: RwLock::new(Snapshot {
                    version: 0,
                    state: Arc::new(initial),
                }),
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                observers: Arc::new(ObserverList {
                    entries: Mutex::new(Vec::new()),
                    ids: IdGenerator::default(),
                }),
            }),
        }
    }

    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    pub fn current_snapshot(&self) -> Snapshot<S> {
        self.inner.current.read().clone()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.entries.lock().len()
    }

    pub fn dispatch(&self, action: A) {
        self.inner.pending.lock().push_back(action);

        loop {
            // Whoever flips the flag drains the queue; everyone else only enqueues.
            if self.inner.draining.swap(true, Ordering::AcqRel) {
                return;
            }

            let drain = DrainGuard { inner: &self.inner };
            loop {
                let next = self.inner.pending.lock().pop_front();
                let Some(action) = next else {
                    break;
                };
                let snapshot = self.reduce(action);
                self.notify(&snapshot);
            }
            drop(drain);

            if self.inner.pending.lock().is_empty() {
                return;
            }
        }
    }

    /// Registers `observer` for every snapshot published after this call.
    ///
    /// The current snapshot is not replayed.
    pub fn subscribe<F>(&self, observer: F) -> StoreSubscription
    where
        F: Fn(&Snapshot<S>) + Send + Sync + 'static,
    {
        let list = &self.inner.observers;
        let id = list.ids.next();
        list.entries.lock().push((id, Arc::new(observer)));

        let observers: Weak<ObserverList<S>> = Arc::downgrade(list);
        let observers: Weak<dyn Unsubscribe> = observers;
        StoreSubscription {
            observers: Some(observers),
            id,
        }
    }

    fn reduce(&self, action: A) -> Snapshot<S> {
        let mut current = self.inner.current.write();
        let state = (self.inner.reducer)(&current.state, action);
        let next = Snapshot {
            version: current.version + 1,
            state: Arc::new(state),
        };
        *current = next.clone();
        next
    }

    fn notify(&self, snapshot: &Snapshot<S>) {
        let observers: Vec<Observer<S>> = self
            .inner
            .observers
            .entries
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        trace!(
            store = self.inner.id.get(),
            version = snapshot.version,
            observers = observers.len(),
            "publishing snapshot"
        );
        for observer in observers {
            observer(snapshot);
        }
    }
}

/// Releases the drain flag when the draining dispatch ends, including by unwinding.
struct DrainGuard<'a, S, A> {
    inner: &'a StoreInner<S, A>,
}

impl<S, A> Drop for DrainGuard<'_, S, A> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut pending = self.inner.pending.lock();
            if !pending.is_empty() {
                warn!(
                    store = self.inner.id.get(),
                    dropped = pending.len(),
                    "dispatch unwound, discarding queued actions"
                );
                pending.clear();
            }
        }
        self.inner.draining.store(false, Ordering::Release);
    }
}

/// Cancel handle returned by [`Store::subscribe`]. Dropping it cancels.
pub struct StoreSubscription {
    observers: Option<Weak<dyn Unsubscribe>>,
    id: u64,
}

impl fmt::Debug for StoreSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSubscription")
            .field("id", &self.id)
            .field("active", &self.observers.is_some())
            .finish()
    }
}

impl StoreSubscription {
    pub fn cancel(&mut self) {
        if let Some(observers) = self.observers.take().and_then(|weak| weak.upgrade()) {
            observers.unsubscribe(self.id);
        }
    }
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
