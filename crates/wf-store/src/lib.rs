//! Session/tab store and the bridge that scopes its subscribers to a lifecycle.

pub mod action;
pub mod consume;
pub mod reducer;
pub mod state;
pub mod store;

pub use action::BrowserAction;
pub use consume::Consumer;
pub use consume::consume_from;
pub use reducer::reduce;
pub use state::BrowserState;
pub use state::CustomTabConfig;
pub use state::CustomTabRecord;
pub use state::DisplayOptions;
pub use state::SessionRecord;
pub use state::SessionSource;
pub use store::Snapshot;
pub use store::Store;
pub use store::StoreId;
pub use store::StoreSubscription;

/// Store holding the browser session state.
pub type BrowserStore = Store<BrowserState, BrowserAction>;

/// Creates a browser store seeded with `initial`.
pub fn browser_store(initial: BrowserState) -> BrowserStore {
    Store::new(initial, reduce)
}
