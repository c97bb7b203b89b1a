//! Process environment provider.

use std::fmt;

/// Supplies the environment handed to every spawned child.
///
/// Tests substitute a `FixedEnvironment` instead of mutating the real
/// process environment.
pub trait Environment: Send + Sync + fmt::Debug {
    /// All variables, in `(key, value)` form.
    fn vars(&self) -> Vec<(String, String)>;

    /// Look up a single variable.
    fn var(&self, key: &str) -> Option<String> {
        self.vars()
            .into_iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }
}

/// The server's own environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct FixedEnvironment {
    vars: Vec<(String, String)>,
}

impl FixedEnvironment {
    /// Create from key/value pairs.
    #[must_use]
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Add or replace a variable.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.vars.retain(|(k, _)| *k != key);
        self.vars.push((key, value.into()));
        self
    }
}

impl Environment for FixedEnvironment {
    fn vars(&self) -> Vec<(String, String)> {
        self.vars.clone()
    }
}
