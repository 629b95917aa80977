//! Request targets resolved against an `Endpoint`.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::ClientError;

/// A path with an optional query, relative to the endpoint root.
///
/// Holds no scheme and no authority, so resolving it can only ever address
/// the endpoint it is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeTarget(String);

impl RelativeTarget {
    pub fn parse(target: &str) -> Result<Self, ClientError> {
        let invalid = |reason: &str| ClientError::InvalidTarget {
            target: target.to_string(),
            reason: reason.to_string(),
        };

        // The URL parser strips these before looking for an authority, so
        // " //host" and "/\t/host" would otherwise escape the endpoint.
        if target.contains(['\t', '\n', '\r']) {
            return Err(invalid("target contains a tab or line break"));
        }
        let is_c0_or_space = |c: char| c <= ' ';
        if target.starts_with(is_c0_or_space) || target.ends_with(is_c0_or_space) {
            return Err(invalid("target has leading or trailing control characters or spaces"));
        }

        let mut leading = target.chars().take(2);
        let is_slash = |c: Option<char>| matches!(c, Some('/') | Some('\\'));
        if is_slash(leading.next()) && is_slash(leading.next()) {
            return Err(invalid("target carries an authority"));
        }
        if Url::parse(target).is_ok() {
            return Err(invalid("target carries a scheme"));
        }

        Ok(Self(target.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RelativeTarget {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for RelativeTarget {
    type Error = ClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl fmt::Display for RelativeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
