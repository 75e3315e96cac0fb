// ── Resource keys ──
//
// A key is an endpoint path plus ordered parameters. Equality and hashing
// are structural, so two call sites asking for the same path with the
// same parameters share one cache entry.

use std::fmt;

use serde::Serialize;

/// One primitive component of a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<KeyPart>),
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<KeyPart>> From<Vec<T>> for KeyPart {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Identity of a cached resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    path: String,
    params: Vec<KeyPart>,
}

impl ResourceKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter.
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.params.push(part.into());
        self
    }

    /// The endpoint component.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[KeyPart] {
        &self.params
    }

    /// `true` if this key's path is `prefix` or lies below it.
    /// Matching is per path segment: `/users` covers `/users/u1`, not
    /// `/users-archive`.
    pub fn is_under(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        match self.path.strip_prefix(prefix) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for part in &self.params {
            write!(f, "|{part}")?;
        }
        Ok(())
    }
}

/// A set of keys to mark stale after a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Exactly this key.
    Key(ResourceKey),
    /// Every key with this path, whatever its parameters.
    Path(String),
    /// Every key whose path lies under this prefix.
    PathPrefix(String),
}

impl Invalidation {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::PathPrefix(prefix.into())
    }

    pub fn matches(&self, key: &ResourceKey) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Path(p) => key.path() == p,
            Self::PathPrefix(p) => key.is_under(p),
        }
    }
}

impl From<ResourceKey> for Invalidation {
    fn from(key: ResourceKey) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{k}"),
            Self::Path(p) => write!(f, "{p}|*"),
            Self::PathPrefix(p) => write!(f, "{}/**", p.trim_end_matches('/')),
        }
    }
}
