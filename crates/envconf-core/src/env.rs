//! Environment variable providers
//!
//! Placeholder resolution reads the environment through the [`Environment`]
//! trait so callers can swap the live process environment for a fixed map.

use std::collections::HashMap;

/// Variable name to value, captured once per resolution
pub type EnvSnapshot = HashMap<String, String>;

/// Source of environment variables for placeholder resolution
pub trait Environment: Send + Sync {
    /// Capture the current set of variables
    fn snapshot(&self) -> EnvSnapshot;
}

/// The live process environment.
///
/// Every call to [`Environment::snapshot`] re-reads the process state, so
/// changes made between accessor calls are visible on the next call.
/// Variables whose name or value is not valid UTF-8 are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn snapshot(&self) -> EnvSnapshot {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

/// A fixed set of variables
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment {
    vars: EnvSnapshot,
}

impl FixedEnvironment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, replacing any previous value
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for FixedEnvironment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Environment for FixedEnvironment {
    fn snapshot(&self) -> EnvSnapshot {
        self.vars.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fixed_environment() {
        let env = FixedEnvironment::new()
            .with_var("HOST", "localhost")
            .with_var("HOST", "db.internal");

        let snapshot = env.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("HOST").map(String::as_str), Some("db.internal"));
    }

    #[test]
    fn test_fixed_environment_from_iter() {
        let env: FixedEnvironment = [("A", "1"), ("B", "2")].into_iter().collect();

        let snapshot = env.snapshot();
        assert_eq!(snapshot.get("A").map(String::as_str), Some("1"));
        assert_eq!(snapshot.get("B").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_process_environment_sees_path() {
        // PATH is set in every reasonable test environment
        let snapshot = ProcessEnvironment.snapshot();
        assert_eq!(
            snapshot.get("PATH").cloned(),
            std::env::var("PATH").ok()
        );
    }
}
