use thiserror::Error;

/// Result alias used across the workspace.
pub type WayfarerResult<T> = Result<T, WayfarerError>;

/// Top-level error type.
///
/// Only malformed input is surfaced through this type. Lookup misses and
/// lifecycle misuse are absorbed where they happen and never become errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WayfarerError {
    #[error("failed to parse URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("URL `{0}` cannot carry an origin")]
    OpaqueOrigin(String),

    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("URL `{0}` must include a host")]
    MissingHost(String),

    #[error("unable to determine effective port for `{0}`")]
    MissingPort(String),
}

impl WayfarerError {
    /// Stable dotted code for log fields and assertions.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "net.url.invalid",
            Self::OpaqueOrigin(_) => "net.url.invalid_base",
            Self::UnsupportedScheme(_) => "net.url.scheme_unsupported",
            Self::MissingHost(_) => "net.url.host_missing",
            Self::MissingPort(_) => "net.url.port_missing",
        }
    }
}
