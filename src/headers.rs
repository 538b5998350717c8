//! Header sets and per-host default header resolution.
//!
//! A [`HeaderPolicy`] is built once (usually by [`crate::RestClientBuilder`]) and
//! handed to every [`crate::Request`] at construction time. Resolution starts
//! from the wildcard host `*`, overlays the request host's defaults, and the
//! request itself may override any of them afterwards.

use std::collections::HashMap;

pub const ACCEPT: &str = "Accept";
pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const COOKIE: &str = "Cookie";
pub const USER_AGENT: &str = "User-Agent";

pub const TYPE_JSON: &str = "application/json";
/// Legacy JSON alias still accepted when encoding request bodies.
pub const TYPE_TEXT_JSON: &str = "text/json";
pub const TYPE_HAL_JSON: &str = "application/hal+json";
pub const TYPE_X_WWW_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Host key whose defaults apply to every request.
pub const ANY_HOST: &str = "*";

pub fn default_user_agent() -> String {
    format!("rest-batch/{}", env!("CARGO_PKG_VERSION"))
}

/// Ordered header map with case-insensitive names.
///
/// Setting a name that already exists (in any casing) replaces the entry in
/// place, so insertion order is stable and the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    /// Overlay every entry of `other` onto this set.
    pub fn merge(&mut self, other: &HeaderSet) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `Name: value` lines, the layout handed to the transport.
    pub fn to_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(n, v)| format!("{}: {}", n, v))
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<K, V> Extend<(K, V)> for HeaderSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        set.extend(iter);
        set
    }
}

/// Default headers keyed by host, with `*` holding the global defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPolicy {
    hosts: HashMap<String, HeaderSet>,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        let mut global = HeaderSet::new();
        global.set(CONTENT_TYPE, TYPE_JSON);
        global.set(USER_AGENT, default_user_agent());
        let mut hosts = HashMap::new();
        hosts.insert(ANY_HOST.to_string(), global);
        Self { hosts }
    }
}

impl HeaderPolicy {
    /// Policy with the built-in `*` defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy without any defaults, not even the built-in ones.
    pub fn empty() -> Self {
        Self {
            hosts: HashMap::new(),
        }
    }

    pub fn set_default_header(
        &mut self,
        host: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.hosts
            .entry(host.to_ascii_lowercase())
            .or_default()
            .set(name, value);
        self
    }

    pub fn add_default_headers<I, K, V>(&mut self, host: &str, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.hosts
            .entry(host.to_ascii_lowercase())
            .or_default()
            .extend(headers);
        self
    }

    pub fn defaults_for(&self, host: &str) -> Option<&HeaderSet> {
        self.hosts.get(&host.to_ascii_lowercase())
    }

    /// Effective defaults for `host`: wildcard first, then host-specific.
    pub fn resolve(&self, host: &str) -> HeaderSet {
        let mut out = HeaderSet::new();
        if let Some(global) = self.hosts.get(ANY_HOST) {
            out.merge(global);
        }
        if host != ANY_HOST {
            if let Some(specific) = self.hosts.get(&host.to_ascii_lowercase()) {
                out.merge(specific);
            }
        }
        out
    }
}
