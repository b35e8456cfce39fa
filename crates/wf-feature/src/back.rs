use crate::Feature;
use crate::ViewBoundFeature;
use core::fmt;
use tracing::debug;

/// Uniform try-consume capability for entries of a [`BackChain`].
pub trait BackConsumer: Send + Sync {
    fn try_consume_back(&self) -> bool;
}

impl<F: Feature> BackConsumer for ViewBoundFeature<F> {
    fn try_consume_back(&self) -> bool {
        self.on_back_pressed()
    }
}

struct FnConsumer<F>(F);

impl<F> BackConsumer for FnConsumer<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn try_consume_back(&self) -> bool {
        (self.0)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Consumed by the named entry.
    Consumed(&'static str),
    /// No entry consumed the press; the host's default applies.
    Unhandled,
}

impl BackOutcome {
    pub fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed(_))
    }
}

struct Entry {
    name: &'static str,
    consumer: Box<dyn BackConsumer>,
}

/// Priority-ordered list of back-press consumers.
///
/// Entries are asked in the order they were added; the first to consume stops
/// the chain.
#[derive(Default)]
pub struct BackChain {
    entries: Vec<Entry>,
}

impl fmt::Debug for BackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl BackChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, name: &'static str, consumer: impl BackConsumer + 'static) -> Self {
        self.entries.push(Entry {
            name,
            consumer: Box::new(consumer),
        });
        self
    }

    pub fn then_fn<F>(self, name: &'static str, consume: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.then(name, FnConsumer(consume))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn handle_back(&self) -> BackOutcome {
        for entry in &self.entries {
            if entry.consumer.try_consume_back() {
                debug!(consumer = entry.name, "back press consumed");
                return BackOutcome::Consumed(entry.name);
            }
        }
        debug!("back press not consumed");
        BackOutcome::Unhandled
    }

    /// Runs the chain, falling back to `default` when nothing consumed.
    pub fn handle_back_or<F: FnOnce()>(&self, default: F) -> BackOutcome {
        let outcome = self.handle_back();
        if outcome == BackOutcome::Unhandled {
            default();
        }
        outcome
    }
}
