//! Key-value configuration for locating the server.
//!
//! # Design
//! `ConfigSource` is the lookup contract the caller depends on; `Properties`
//! is the file-backed implementation. Loading and lookup failures are both
//! `ConfigError`s and are fatal to startup: no client is built from a partial
//! configuration.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::endpoint::{Endpoint, Scheme};
use crate::error::{ClientError, ConfigError};

pub const DOMAIN_KEY: &str = "server.domain";
pub const PORT_KEY: &str = "server.port";
pub const HTTPS_KEY: &str = "server.https";

/// Supplies string values for named keys.
pub trait ConfigSource {
    /// Value of `key`, or `ConfigError::MissingKey` when absent.
    fn get(&self, key: &str) -> Result<String, ConfigError>;

    /// Value of `key` parsed into `T`.
    fn get_parsed<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.get(key)?;
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
    }

    /// Value of `key` parsed into `T`, or `default` when the key is absent.
    fn get_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_parsed(key) {
            Err(ConfigError::MissingKey(_)) => Ok(default),
            other => other,
        }
    }
}

/// Entries of a Java-style `.properties` file.
///
/// Supports `key=value`, `key: value` and `key value` lines, `#` and `!`
/// comments, and values continued onto the next line with a trailing `\`.
/// A later entry for the same key replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let properties = Self::parse(&text);
        debug!(path = %path.display(), entries = properties.len(), "loaded properties file");
        Ok(properties)
    }

    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        let mut pending = String::new();

        for raw in text.lines() {
            let line = raw.trim_start();
            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            if let Some(stripped) = continued(line) {
                pending.push_str(stripped);
                continue;
            }
            pending.push_str(line);

            let logical = std::mem::take(&mut pending);
            if let Some((key, value)) = split_entry(&logical) {
                entries.insert(key, value);
            }
        }
        if !pending.is_empty() {
            if let Some((key, value)) = split_entry(&pending) {
                entries.insert(key, value);
            }
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigSource for Properties {
    fn get(&self, key: &str) -> Result<String, ConfigError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The line without its continuation marker, if it ends with an odd number
/// of backslashes.
fn continued(line: &str) -> Option<&str> {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    (trailing % 2 == 1).then(|| &line[..line.len() - 1])
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let split = line
        .char_indices()
        .find(|(_, c)| matches!(c, '=' | ':') || c.is_whitespace());
    let (key, rest) = match split {
        Some((idx, _)) => (&line[..idx], &line[idx..]),
        None => (line, ""),
    };
    // Separator is optional whitespace, then at most one of '=' or ':'.
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    Some((key.to_string(), rest.trim().to_string()))
}

/// Where the server lives, as read from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub domain: String,
    pub port: u16,
    pub use_https: bool,
}

impl ServerSettings {
    /// Read `server.domain`, `server.port` and the optional `server.https`.
    pub fn from_source(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let domain = source.get(DOMAIN_KEY)?.trim().to_string();
        let port = source.get_parsed::<u16>(PORT_KEY)?;
        let use_https = source.get_or(HTTPS_KEY, false)?;
        Ok(Self {
            domain,
            port,
            use_https,
        })
    }

    pub fn endpoint(&self) -> Result<Endpoint, ClientError> {
        Endpoint::new(&self.domain, self.port, Scheme::from_https(self.use_https))
    }
}
