//! The immutable root every request is resolved against.
//!
//! # Design
//! The root is assembled as `{scheme}://{domain}:{port}/` and validated by
//! parsing it with `url::Url`. The parsed form is kept for reference
//! resolution while the raw parts are kept for display, because `Url`
//! normalizes away a port that equals the scheme default.

use std::fmt;

use url::Url;

use crate::error::ClientError;
use crate::target::RelativeTarget;

/// URI scheme of an `Endpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn from_https(use_https: bool) -> Self {
        if use_https {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheme, domain and port of the remote server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    domain: String,
    port: u16,
    root: Url,
}

impl Endpoint {
    /// Build the root URI, failing if the parts do not form a valid authority.
    pub fn new(domain: &str, port: u16, scheme: Scheme) -> Result<Self, ClientError> {
        let uri = format!("{scheme}://{domain}:{port}/");
        let invalid = |reason: &str| ClientError::InvalidEndpoint {
            uri: uri.clone(),
            reason: reason.to_string(),
        };

        if domain.is_empty() {
            return Err(invalid("domain is empty"));
        }
        // Userinfo, path, query or fragment smuggled in through the domain
        // would otherwise parse as a different URI.
        if domain.contains(['/', '?', '#', '@', '\\']) {
            return Err(invalid("domain contains URI delimiters"));
        }

        let root = Url::parse(&uri).map_err(|e| invalid(&e.to_string()))?;
        if root.path() != "/" || root.query().is_some() || root.fragment().is_some() {
            return Err(invalid("root must not carry a path, query or fragment"));
        }

        Ok(Self {
            scheme,
            domain: domain.to_string(),
            port,
            root,
        })
    }

    /// Plain-HTTP endpoint.
    pub fn http(domain: &str, port: u16) -> Result<Self, ClientError> {
        Self::new(domain, port, Scheme::Http)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The parsed root, as used for resolution.
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Resolve `target` against the root with RFC 3986 reference resolution.
    ///
    /// Fails if the result does not stay on the endpoint's origin.
    pub fn resolve(&self, target: &RelativeTarget) -> Result<Url, ClientError> {
        let invalid = |reason: String| ClientError::InvalidTarget {
            target: target.to_string(),
            reason,
        };
        let resolved = self
            .root
            .join(target.as_str())
            .map_err(|e| invalid(e.to_string()))?;
        if resolved.origin() != self.root.origin() {
            return Err(invalid(format!("resolves outside {self}")));
        }
        Ok(resolved)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}/", self.scheme, self.domain, self.port)
    }
}
