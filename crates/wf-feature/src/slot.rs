use crate::Feature;
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tracing::debug;
use wf_core::IdGenerator;
use wf_lifecycle::Lifecycle;
use wf_lifecycle::LifecycleObservation;

const NO_TEARDOWN: u64 = 0;

enum SlotState<F> {
    Empty,
    Active {
        feature: F,
        generation: u64,
        _owner: LifecycleObservation,
        _view: LifecycleObservation,
    },
}

struct Slot<F: Feature> {
    name: &'static str,
    state: Mutex<SlotState<F>>,
    // Generation whose lifecycle went inactive while the state was locked.
    teardown: AtomicU64,
    generations: IdGenerator,
}

impl<F: Feature> Slot<F> {
    fn stop_locked(&self, state: &mut SlotState<F>, reason: &'static str) {
        if let SlotState::Active { mut feature, .. } = std::mem::replace(state, SlotState::Empty) {
            feature.stop();
            debug!(slot = self.name, reason, "feature stopped");
        }
    }

    fn request_teardown(&self, generation: u64) {
        self.teardown.store(generation, Ordering::SeqCst);
        self.drain_teardown();
    }

    /// Applies a pending teardown unless the state is locked, in which case
    /// the lock holder applies it on release.
    fn drain_teardown(&self) {
        loop {
            let requested = self.teardown.load(Ordering::SeqCst);
            if requested == NO_TEARDOWN {
                return;
            }
            let Some(mut state) = self.state.try_lock() else {
                return;
            };
            if self
                .teardown
                .compare_exchange(requested, NO_TEARDOWN, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                continue;
            }
            if matches!(&*state, SlotState::Active { generation, .. } if *generation == requested) {
                self.stop_locked(&mut *state, "lifecycle inactive");
            }
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SlotState<F>) -> R) -> R {
        let result = {
            let mut state = self.state.lock();
            f(&mut *state)
        };
        self.drain_teardown();
        result
    }
}

impl<F: Feature> Drop for Slot<F> {
    fn drop(&mut self) {
        if let SlotState::Active { feature, .. } = self.state.get_mut() {
            feature.stop();
        }
    }
}

/// Ownership cell for at most one feature bound to an owner and a view.
///
/// The feature is present only while both lifecycles are active. When either
/// becomes inactive the feature is stopped exactly once and the slot empties;
/// it is not restarted when the lifecycle becomes active again.
pub struct ViewBoundFeature<F: Feature> {
    slot: Arc<Slot<F>>,
}

impl<F: Feature> Clone for ViewBoundFeature<F> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<F: Feature> fmt::Debug for ViewBoundFeature<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBoundFeature")
            .field("name", &self.slot.name)
            .field("present", &self.is_present())
            .finish()
    }
}

impl<F: Feature> ViewBoundFeature<F> {
    pub fn new(name: &'static str) -> Self {
        Self {
            slot: Arc::new(Slot {
                name,
                state: Mutex::new(SlotState::Empty),
                teardown: AtomicU64::new(NO_TEARDOWN),
                generations: IdGenerator::new(1),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.slot.name
    }

    /// Stores and starts `feature`, stopping any feature already present.
    ///
    /// Returns false, dropping `feature` unstarted, when owner or view is not
    /// active.
    pub fn set(&self, mut feature: F, owner: &Lifecycle, view: &Lifecycle) -> bool {
        let generation = self.slot.generations.next();
        debug_assert_ne!(generation, NO_TEARDOWN);
        let owner_watch = self.watch(owner, generation);
        let view_watch = self.watch(view, generation);

        self.slot.with_state(|state| {
            self.slot.stop_locked(state, "replaced");

            if !owner.is_active() || !view.is_active() {
                debug!(
                    slot = self.slot.name,
                    owner = owner.state().as_str(),
                    view = view.state().as_str(),
                    "lifecycle not active, discarding feature"
                );
                return false;
            }

            feature.start();
            *state = SlotState::Active {
                feature,
                generation,
                _owner: owner_watch,
                _view: view_watch,
            };
            debug!(slot = self.slot.name, generation, "feature started");
            true
        })
    }

    pub fn is_present(&self) -> bool {
        matches!(*self.slot.state.lock(), SlotState::Active { .. })
    }

    /// Runs `f` with the present feature. `None` when the slot is empty.
    pub fn with_feature<R>(&self, f: impl FnOnce(&mut F) -> R) -> Option<R> {
        self.slot.with_state(|state| match state {
            SlotState::Active { feature, .. } => Some(f(feature)),
            SlotState::Empty => None,
        })
    }

    /// Offers a back press to the present feature's back handler.
    pub fn on_back_pressed(&self) -> bool {
        self.with_feature(|feature| {
            feature
                .back_handler()
                .is_some_and(|handler| handler.on_back_pressed())
        })
        .unwrap_or(false)
    }

    /// Stops and removes the present feature. No-op when empty.
    pub fn clear(&self) {
        self.slot
            .with_state(|state| self.slot.stop_locked(state, "cleared"));
    }

    fn watch(&self, lifecycle: &Lifecycle, generation: u64) -> LifecycleObservation {
        let slot = Arc::downgrade(&self.slot);
        lifecycle.observe(move |state| {
            if state.is_active() {
                return;
            }
            if let Some(slot) = slot.upgrade() {
                slot.request_teardown(generation);
            }
        })
    }
}
