//! Origin contracts: URL origin parsing and trusted-scope membership.

pub mod origin;
pub mod scope;

pub use origin::Origin;
pub use origin::Scheme;
pub use scope::TrustedScope;
