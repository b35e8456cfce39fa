//! Lifecycle-scoped store consumers.

use crate::store::Snapshot;
use crate::store::Store;
use crate::store::StoreSubscription;
use core::cell::Cell;
use core::cell::RefCell;
use core::fmt;
use parking_lot::Mutex;
use parking_lot::ReentrantMutex;
use std::sync::Arc;
use tracing::debug;
use wf_lifecycle::BindingKey;
use wf_lifecycle::Lifecycle;

const STORE_BINDING: &str = "store";

type Callback<S> = Box<dyn FnMut(&S) + Send>;

struct Gate<S> {
    active: Cell<bool>,
    last_version: Cell<Option<u64>>,
    delivering: Cell<bool>,
    pending: RefCell<Option<Snapshot<S>>>,
    callback: RefCell<Callback<S>>,
}

struct ConsumerShared<S> {
    // Re-entrant so that the callback itself may deactivate the owner.
    gate: ReentrantMutex<Gate<S>>,
    subscription: Mutex<Option<StoreSubscription>>,
}

impl<S> ConsumerShared<S> {
    fn deliver(&self, snapshot: &Snapshot<S>) {
        let gate = self.gate.lock();
        if !gate.active.get() {
            return;
        }
        if gate
            .last_version
            .get()
            .is_some_and(|last| snapshot.version() <= last)
        {
            return;
        }
        gate.last_version.set(Some(snapshot.version()));

        if gate.delivering.get() {
            // Re-entered from our own callback; hand the newest snapshot to the
            // outer delivery loop.
            gate.pending.replace(Some(snapshot.clone()));
            return;
        }

        gate.delivering.set(true);
        let _delivery = Delivery { gate: &*gate };
        let mut next = Some(snapshot.clone());
        while let Some(current) = next.take() {
            {
                let mut callback = gate.callback.borrow_mut();
                (&mut **callback)(current.state());
            }
            if gate.active.get() {
                next = gate.pending.borrow_mut().take();
            }
        }
    }
}

/// Ends a delivery loop, also when the callback unwinds out of it.
struct Delivery<'a, S> {
    gate: &'a Gate<S>,
}

impl<S> Drop for Delivery<'_, S> {
    fn drop(&mut self) {
        self.gate.pending.replace(None);
        self.gate.delivering.set(false);
    }
}

trait ConsumerControl: Send + Sync {
    fn cancel(&self);
    fn is_active(&self) -> bool;
}

impl<S: Send + Sync> ConsumerControl for ConsumerShared<S> {
    fn cancel(&self) {
        let gate = self.gate.lock();
        if !gate.active.replace(false) {
            return;
        }
        gate.pending.replace(None);
        let subscription = self.subscription.lock().take();
        drop(subscription);
    }

    fn is_active(&self) -> bool {
        self.gate.lock().active.get()
    }
}

/// Handle to a subscription created by [`consume_from`].
///
/// The subscription is owned by the lifecycle it was scoped to; dropping this
/// handle does not cancel it.
#[derive(Clone)]
pub struct Consumer {
    control: Arc<dyn ConsumerControl>,
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("active", &self.is_active())
            .finish()
    }
}

impl Consumer {
    pub fn is_active(&self) -> bool {
        self.control.is_active()
    }

    /// Cancels the subscription. Idempotent.
    pub fn cancel(&self) {
        self.control.cancel();
    }
}

/// Feeds `on_snapshot` with the store's current state and every later one,
/// for as long as `owner` stays active.
///
/// Only one consumer per (owner, store) pair is live at a time: consuming the
/// same store again from the same owner cancels the earlier consumer. If the
/// owner is not active nothing is subscribed and the returned consumer is
/// already cancelled.
pub fn consume_from<S, A, F>(
    store: &Store<S, A>,
    owner: &Lifecycle,
    on_snapshot: F,
) -> Consumer
where
    S: Send + Sync + 'static,
    A: Send + 'static,
    F: FnMut(&S) + Send + 'static,
{
    let shared = Arc::new(ConsumerShared {
        gate: ReentrantMutex::new(Gate {
            active: Cell::new(true),
            last_version: Cell::new(None),
            delivering: Cell::new(false),
            pending: RefCell::new(None),
            callback: RefCell::new(Box::new(on_snapshot)),
        }),
        subscription: Mutex::new(None),
    });
    let consumer = Consumer {
        control: Arc::clone(&shared) as Arc<dyn ConsumerControl>,
    };

    if !owner.is_active() {
        debug!(
            owner = owner.name(),
            owner_id = owner.id().get(),
            store = store.id().get(),
            "owner inactive, not consuming"
        );
        shared.cancel();
        return consumer;
    }

    let weak = Arc::downgrade(&shared);
    let subscription = store.subscribe(move |snapshot| {
        if let Some(shared) = weak.upgrade() {
            shared.deliver(snapshot);
        }
    });
    *shared.subscription.lock() = Some(subscription);

    let binding = Arc::clone(&shared);
    let bound = owner.bind(BindingKey::new(STORE_BINDING, store.id().get()), move || {
        binding.cancel();
    });
    if !bound {
        debug!(
            owner = owner.name(),
            owner_id = owner.id().get(),
            store = store.id().get(),
            "owner went inactive while subscribing"
        );
        shared.cancel();
        return consumer;
    }

    shared.deliver(&store.current_snapshot());
    consumer
}
