//! Value sources
//!
//! A [`ValueSource`] maps configuration keys to raw (unresolved) text.
//! [`MemorySource`] holds an in-memory map; [`FileSource`] layers YAML/JSON
//! files and can be reloaded while in use.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use indexmap::IndexMap;

use crate::error::{Error, Result, SourceLocation};
use crate::value::Value;

/// Key-value store backing a [`ConfigData`](crate::ConfigData)
pub trait ValueSource: Send + Sync {
    /// Raw text for `key`, or `None` if the key is absent
    fn lookup(&self, key: &str) -> Option<String>;
}

/// An ordered in-memory source
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: IndexMap<String, String>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous value for `key`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add an entry, replacing any previous value for `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for MemorySource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ValueSource for MemorySource {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned().or_else(|| {
            self.entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        })
    }
}

/// Specifies a file to load, either required or optional
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSpec {
    /// A required file - error if not found
    Required(PathBuf),
    /// An optional file - silently skip if not found
    Optional(PathBuf),
}

impl FileSpec {
    /// Create a required file spec
    pub fn required(path: impl Into<PathBuf>) -> Self {
        FileSpec::Required(path.into())
    }

    /// Create an optional file spec
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        FileSpec::Optional(path.into())
    }

    /// Get the path for this file spec
    pub fn path(&self) -> &Path {
        match self {
            FileSpec::Required(p) => p,
            FileSpec::Optional(p) => p,
        }
    }

    /// Check if this file spec is optional
    pub fn is_optional(&self) -> bool {
        matches!(self, FileSpec::Optional(_))
    }
}

impl<P: Into<PathBuf>> From<P> for FileSpec {
    fn from(path: P) -> Self {
        FileSpec::Required(path.into())
    }
}

/// Modification time of each layer at load time; `None` for a missing file
type Stamps = Vec<Option<SystemTime>>;

/// One loaded generation of a [`FileSource`]
#[derive(Debug)]
struct Generation {
    value: Arc<Value>,
    stamps: Stamps,
}

/// Layered, reloadable file-backed source.
///
/// Files are deep-merged in order, later files overriding earlier ones:
/// - Mappings are deep-merged
/// - Scalars use last-writer-wins
/// - Arrays are replaced (not concatenated)
/// - Null values remove keys
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML.
/// Each lookup reads from a single loaded generation; [`FileSource::reload`]
/// swaps in a new generation atomically. With
/// [`FileSource::with_reload_on_change`] every lookup first reloads any layer
/// that changed on disk.
#[derive(Debug)]
pub struct FileSource {
    specs: Vec<FileSpec>,
    current: RwLock<Generation>,
    reload_on_change: bool,
}

impl FileSource {
    /// Load a single required file
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        Self::load_layers(vec![FileSpec::required(path)])
    }

    /// Load and merge multiple files
    pub fn load_layers(specs: Vec<FileSpec>) -> Result<Self> {
        let generation = read_generation(&specs)?;
        Ok(Self {
            specs,
            current: RwLock::new(generation),
            reload_on_change: false,
        })
    }

    /// Build a source from an already-parsed value tree
    pub fn from_value(value: Value) -> Self {
        Self {
            specs: Vec::new(),
            current: RwLock::new(Generation {
                value: Arc::new(value),
                stamps: Vec::new(),
            }),
            reload_on_change: false,
        }
    }

    /// Parse a YAML document into a source
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        parse_yaml(yaml, None).map(Self::from_value)
    }

    /// Parse a JSON document into a source
    pub fn from_json(json: &str) -> Result<Self> {
        parse_json(json, None).map(Self::from_value)
    }

    /// Check the layers for changes before every lookup.
    ///
    /// A layer that fails to reload is logged and the previous tree keeps
    /// serving lookups.
    pub fn with_reload_on_change(mut self, enabled: bool) -> Self {
        self.reload_on_change = enabled;
        self
    }

    /// Whether lookups reload changed layers
    pub fn reloads_on_change(&self) -> bool {
        self.reload_on_change
    }

    /// The layers this source was loaded from
    pub fn specs(&self) -> &[FileSpec] {
        &self.specs
    }

    /// The current merged value tree
    pub fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.read().value)
    }

    /// Keys of every scalar leaf in the current tree
    pub fn keys(&self) -> Vec<String> {
        self.snapshot().leaf_keys()
    }

    /// Re-read every layer and replace the current tree.
    ///
    /// On error the previous tree stays in place.
    pub fn reload(&self) -> Result<()> {
        let generation = read_generation(&self.specs)?;
        log::debug!("Reloaded configuration from {} layer(s)", self.specs.len());
        *self.write() = generation;
        Ok(())
    }

    /// Reload only if a layer appeared, disappeared or was modified since the
    /// last load. Returns whether a reload happened.
    pub fn reload_if_changed(&self) -> Result<bool> {
        if stamps(&self.specs) == self.read().stamps {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Generation> {
        // Writers only ever swap a fully built generation in
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Generation> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl ValueSource for FileSource {
    fn lookup(&self, key: &str) -> Option<String> {
        if self.reload_on_change {
            if let Err(e) = self.reload_if_changed() {
                log::warn!("Keeping previous configuration: {}", e);
            }
        }
        self.read().value.get_path(key).and_then(Value::as_text)
    }
}

fn stamps(specs: &[FileSpec]) -> Stamps {
    specs
        .iter()
        .map(|spec| {
            std::fs::metadata(spec.path())
                .and_then(|m| m.modified())
                .ok()
        })
        .collect()
}

fn read_generation(specs: &[FileSpec]) -> Result<Generation> {
    let stamps = stamps(specs);
    let mut merged = Value::empty();

    for spec in specs {
        let path = spec.path();

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if spec.is_optional() {
                    log::debug!("Skipping missing optional file {}", path.display());
                    continue;
                }
                return Err(Error::file_not_found(path.display().to_string()));
            }
            Err(e) => return Err(Error::io(path.display().to_string(), e.to_string())),
        };

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let value = if is_json {
            parse_json(&content, Some(path))?
        } else {
            parse_yaml(&content, Some(path))?
        };

        match value {
            // An empty document contributes nothing
            Value::Null => {}
            Value::Mapping(_) => merged.merge(value),
            other => {
                return Err(Error::parse(format!(
                    "Top-level value must be a mapping, found {}",
                    other.type_name()
                ))
                .with_source_location(location(path, None)))
            }
        }
    }

    Ok(Generation {
        value: Arc::new(merged),
        stamps,
    })
}

fn location(path: &Path, line: Option<usize>) -> SourceLocation {
    SourceLocation {
        file: path.display().to_string(),
        line,
        column: None,
    }
}

fn parse_yaml(content: &str, path: Option<&Path>) -> Result<Value> {
    serde_yaml::from_str(content).map_err(|e| {
        let line = e.location().map(|l| l.line());
        let err = Error::parse(e.to_string());
        match path {
            Some(p) => err.with_source_location(location(p, line)),
            None => err,
        }
    })
}

fn parse_json(content: &str, path: Option<&Path>) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| {
        let err = Error::parse(e.to_string());
        match path {
            Some(p) => err.with_source_location(location(p, Some(e.line()))),
            None => err,
        }
    })
}
