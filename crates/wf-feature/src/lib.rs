//! Attachable units of screen behavior.
//!
//! A [`Feature`] lives in a [`ViewBoundFeature`] slot that is bound to two
//! lifecycles, and may answer back presses routed through a [`BackChain`].

mod back;
mod slot;

pub use back::BackChain;
pub use back::BackConsumer;
pub use back::BackOutcome;
pub use slot::ViewBoundFeature;

/// A unit of behavior with start/stop hooks.
pub trait Feature: Send + 'static {
    fn start(&mut self);

    fn stop(&mut self);

    /// Back-press capability, if this feature has one.
    fn back_handler(&mut self) -> Option<&mut dyn BackHandler> {
        None
    }
}

/// Something that may consume a back press.
pub trait BackHandler {
    /// Returns true if the press was consumed.
    fn on_back_pressed(&mut self) -> bool;
}
