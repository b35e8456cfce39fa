//! Shared primitives used across Wayfarer crates.

mod error;
mod ids;

pub use error::WayfarerError;
pub use error::WayfarerResult;
pub use ids::CustomTabToken;
pub use ids::IdGenerator;
pub use ids::SessionId;
