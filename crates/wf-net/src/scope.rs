//! Trusted-origin sets attached to custom tabs.

use crate::origin::Origin;
use std::collections::HashSet;
use tracing::warn;

/// Set of origins for which the host application suppresses browser chrome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedScope {
    origins: HashSet<Origin>,
}

impl TrustedScope {
    /// Builds a scope from origin strings. Entries that do not parse are skipped.
    pub fn from_origins<I>(origins: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut parsed = HashSet::new();
        for raw in origins {
            let raw = raw.as_ref();
            match Origin::parse(raw) {
                Ok(origin) => {
                    parsed.insert(origin);
                }
                Err(error) => {
                    warn!(
                        origin = raw,
                        code = error.code(),
                        "ignoring unparsable trusted origin"
                    );
                }
            }
        }
        Self { origins: parsed }
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn contains(&self, origin: &Origin) -> bool {
        self.origins.contains(origin)
    }

    /// Returns true only if `url` parses and its origin is in the scope.
    pub fn contains_url(&self, url: &str) -> bool {
        if self.is_empty() {
            return false;
        }
        Origin::parse(url).is_ok_and(|origin| self.contains(&origin))
    }
}
