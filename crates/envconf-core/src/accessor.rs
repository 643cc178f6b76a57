//! Typed configuration accessor
//!
//! [`ConfigData`] reads a key from its [`ValueSource`], falls back to the
//! caller's default when the key is absent, resolves environment placeholders
//! and coerces the result to the requested type.

use std::path::PathBuf;
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::placeholder::PlaceholderResolver;
use crate::source::{FileSource, FileSpec, ValueSource};

/// Strings accepted as `true` by [`ConfigData::get_bool`] (after lower-casing)
pub const TRUTHY: [&str; 6] = ["true", "t", "yes", "y", "1", "-1"];

/// Strings accepted as `false` by [`ConfigData::get_bool`] (after lower-casing)
pub const FALSY: [&str; 5] = ["false", "f", "no", "n", "0"];

/// Typed access to configuration values with placeholder resolution
#[derive(Clone)]
pub struct ConfigData {
    source: Arc<dyn ValueSource>,
    resolver: PlaceholderResolver,
}

impl std::fmt::Debug for ConfigData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigData")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl ConfigData {
    /// Create an accessor over `source` using the process environment and
    /// the `log` facade for diagnostics
    pub fn new(source: Arc<dyn ValueSource>) -> Self {
        Self {
            source,
            resolver: PlaceholderResolver::default(),
        }
    }

    /// Load `path` as an optional settings file with the default wiring.
    ///
    /// A missing file yields an accessor where every key takes its default.
    /// Edits to the file, including creating or deleting it, are picked up
    /// by the next read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let source = FileSource::load_layers(vec![FileSpec::optional(path)])?
            .with_reload_on_change(true);
        Ok(Self::new(Arc::new(source)))
    }

    /// Replace the environment used for placeholder resolution
    pub fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.resolver = self.resolver.with_environment(env);
        self
    }

    /// Replace the sink receiving unresolved-placeholder events
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.resolver = self.resolver.with_diagnostics(diagnostics);
        self
    }

    /// Replace the whole resolver
    pub fn with_resolver(mut self, resolver: PlaceholderResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The resolver used by this accessor
    pub fn resolver(&self) -> &PlaceholderResolver {
        &self.resolver
    }

    /// Get a resolved string, or `default` (also resolved) if `key` is absent
    pub fn get_string(&self, key: &str, default: &str) -> Result<String> {
        match self.source.lookup(key) {
            Some(raw) => self.resolver.resolve(&raw),
            None => self.resolver.resolve(default),
        }
    }

    /// Get a resolved boolean.
    ///
    /// The lower-cased value is matched against [`TRUTHY`] and [`FALSY`];
    /// anything else, including an absent key, yields `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let value = self
            .get_string(key, &default.to_string())?
            .to_lowercase();

        if TRUTHY.contains(&value.as_str()) {
            Ok(true)
        } else if FALSY.contains(&value.as_str()) {
            Ok(false)
        } else {
            Ok(default)
        }
    }

    /// Get a resolved base-10 integer, or `default` if `key` is absent.
    ///
    /// Surrounding whitespace is ignored. A value that does not parse is an
    /// [`InvalidValue`](crate::ErrorKind::InvalidValue) error naming `key`.
    pub fn get_int(&self, key: &str, default: i32) -> Result<i32> {
        let value = self.get_string(key, &default.to_string())?;
        value
            .trim()
            .parse()
            .map_err(|e| Error::invalid_value(key, e))
    }
}
