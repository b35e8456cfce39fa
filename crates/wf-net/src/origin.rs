//! URL origin parsing and normalization.

use core::fmt;
use url::Url;
use wf_core::WayfarerError;
use wf_core::WayfarerResult;

/// Schemes that can carry a trusted origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Scheme, host and effective port of a URL.
///
/// Hosts are lowercased with any trailing dot removed, and the port is always
/// the effective one, so `https://Example.COM:443/a` and `https://example.com`
/// compare equal. Path, query, fragment and userinfo never take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Origin {
    pub fn parse(input: &str) -> WayfarerResult<Self> {
        let parsed = Url::parse(input.trim()).map_err(|error| WayfarerError::InvalidUrl {
            input: input.to_owned(),
            reason: error.to_string(),
        })?;

        if parsed.cannot_be_a_base() {
            return Err(WayfarerError::OpaqueOrigin(input.to_owned()));
        }

        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(WayfarerError::UnsupportedScheme(other.to_owned())),
        };

        let host = parsed
            .host_str()
            .map(|host| host.trim_end_matches('.').to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .ok_or_else(|| WayfarerError::MissingHost(input.to_owned()))?;

        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| WayfarerError::MissingPort(input.to_owned()))?;

        Ok(Self { scheme, host, port })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn authority(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.authority())
    }
}
