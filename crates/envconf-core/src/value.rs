//! Configuration value tree
//!
//! Represents a parsed configuration file before any placeholder resolution.
//! Values can be scalars (string, int, float, bool, null),
//! sequences (arrays), or mappings (objects).

use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;

/// A configuration value as read from a file
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value (may contain placeholders like ${VAR} or ${?VAR})
    String(String),
    /// Sequence of values
    Sequence(Vec<Value>),
    /// Mapping of string keys to values
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// An empty mapping, the root of a source with no entries
    pub fn empty() -> Self {
        Value::Mapping(IndexMap::new())
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as str if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if this is an Integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Textual form of a scalar leaf.
    ///
    /// Floats keep their fractional part (`1.0` stays `1.0`). Null, sequences
    /// and mappings have no textual form: a key pointing at them is treated
    /// as absent.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(format!("{:?}", f)),
            Value::String(s) => Some(s.clone()),
            Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }

    /// Get a value by key.
    ///
    /// Keys are paths whose segments are separated by `:` or `.`
    /// (`Database:Host`, `database.host`), with `[n]` or a numeric segment
    /// indexing into sequences. Mapping keys match exactly first, then
    /// ASCII case-insensitively. A mapping key that itself contains a
    /// separator (`"a.b"`) is found too: the longest matching key wins.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        walk(self, path)
    }

    /// Keys of every scalar leaf, `:`-separated, in document order.
    ///
    /// Every listed key resolves through [`Value::get_path`].
    pub fn leaf_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.collect_leaf_keys("", &mut keys);
        keys
    }

    fn collect_leaf_keys(&self, prefix: &str, keys: &mut Vec<String>) {
        let child = |segment: &str| {
            if prefix.is_empty() {
                segment.to_string()
            } else {
                format!("{}:{}", prefix, segment)
            }
        };

        match self {
            Value::Mapping(map) => {
                for (k, v) in map {
                    v.collect_leaf_keys(&child(k), keys);
                }
            }
            Value::Sequence(seq) => {
                for (i, v) in seq.iter().enumerate() {
                    v.collect_leaf_keys(&child(&i.to_string()), keys);
                }
            }
            Value::Null => {}
            _ => {
                if !prefix.is_empty() {
                    keys.push(prefix.to_string());
                }
            }
        }
    }

    /// Returns the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Merge another value into this one (deep merge)
    ///
    /// Merge semantics:
    /// - Mappings: Deep merge recursively
    /// - Scalars: `other` wins (last-writer-wins)
    /// - Sequences: `other` replaces entirely
    /// - Null in other: Removes the key
    /// - Type mismatch: `other` wins
    pub fn merge(&mut self, other: Value) {
        match (self, other) {
            (Value::Mapping(base), Value::Mapping(overlay)) => {
                for (key, overlay_value) in overlay {
                    if overlay_value.is_null() {
                        base.shift_remove(&key);
                    } else if let Some(base_value) = base.get_mut(&key) {
                        base_value.merge(overlay_value);
                    } else {
                        base.insert(key, overlay_value);
                    }
                }
            }
            (this, other) => {
                *this = other;
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Sequence(seq) => {
                write!(f, "[")?;
                for (i, v) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Mapping(m)
    }
}

fn lookup_key<'a>(map: &'a IndexMap<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

const SEPARATORS: [char; 2] = [':', '.'];

fn is_boundary(c: char) -> bool {
    SEPARATORS.contains(&c) || c == '['
}

/// Resolve `path` below `value`.
///
/// At a mapping every prefix of `path` ending at a segment boundary is a
/// candidate key, longest first; a candidate only counts if the rest of the
/// path resolves below it. Returns `None` for malformed indices.
fn walk<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim_start_matches(SEPARATORS);
    if path.is_empty() {
        return Some(value);
    }

    if let Some(rest) = path.strip_prefix('[') {
        let (index, rest) = rest.split_once(']')?;
        return match value {
            Value::Sequence(seq) => walk(seq.get(index.parse::<usize>().ok()?)?, rest),
            _ => None,
        };
    }

    match value {
        Value::Mapping(map) => {
            let ends: Vec<usize> = path
                .char_indices()
                .filter(|&(_, c)| is_boundary(c))
                .map(|(i, _)| i)
                .chain(std::iter::once(path.len()))
                .collect();

            ends.into_iter().rev().find_map(|end| {
                let child = lookup_key(map, &path[..end])?;
                walk(child, &path[end..])
            })
        }
        Value::Sequence(seq) => {
            let end = path.find(is_boundary).unwrap_or(path.len());
            let index = path[..end].parse::<usize>().ok()?;
            walk(seq.get(index)?, &path[end..])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Value {
        let mut db = IndexMap::new();
        db.insert("Host".into(), Value::String("localhost".into()));
        db.insert("Port".into(), Value::Integer(5432));
        db.insert("Ssl".into(), Value::Bool(true));
        db.insert("Ratio".into(), Value::Float(0.5));
        db.insert("Password".into(), Value::Null);

        let mut map = IndexMap::new();
        map.insert("Database".into(), Value::Mapping(db));
        map.insert(
            "servers".into(),
            Value::Sequence(vec!["server1".into(), "server2".into()]),
        );
        Value::Mapping(map)
    }

    fn dotted() -> Value {
        let mut nested = IndexMap::new();
        nested.insert("c.d".into(), Value::from("y"));
        nested.insert("e".into(), Value::from("z"));

        let mut a = IndexMap::new();
        a.insert("b".into(), Value::from("nested"));

        let mut map = IndexMap::new();
        map.insert("a.b".into(), Value::from("x"));
        map.insert("a".into(), Value::Mapping(a));
        map.insert("host:port".into(), Value::from("db:5432"));
        map.insert("nested".into(), Value::Mapping(nested));
        map.insert("list[0]".into(), Value::from("literal"));
        Value::Mapping(map)
    }

    #[test]
    fn test_get_path_complex() {
        let mut server = IndexMap::new();
        server.insert("host".into(), Value::from("server1"));
        let mut map = IndexMap::new();
        map.insert("servers".into(), Value::from(vec![Value::Mapping(server)]));
        let value = Value::Mapping(map);

        assert_eq!(
            value.get_path("servers[0].host").and_then(Value::as_str),
            Some("server1")
        );
        assert_eq!(
            value.get_path("servers:0:host").and_then(Value::as_str),
            Some("server1")
        );
    }

    #[test]
    fn test_get_path_malformed() {
        let value = sample();

        assert!(value.get_path("servers[x]").is_none());
        assert!(value.get_path("servers[0").is_none());
        assert!(value.get_path("servers]").is_none());
    }

    #[test]
    fn test_get_path_keys_containing_separators() {
        let value = dotted();
        let text = |key: &str| value.get_path(key).and_then(Value::as_str);

        assert_eq!(text("a.b"), Some("x"));
        assert_eq!(text("A.B"), Some("x"));
        assert_eq!(text("a:b"), Some("nested"));
        assert_eq!(text("host:port"), Some("db:5432"));
        assert_eq!(text("nested:c.d"), Some("y"));
        assert_eq!(text("nested.c.d"), Some("y"));
        assert_eq!(text("nested.e"), Some("z"));
        assert_eq!(text("list[0]"), Some("literal"));
    }

    #[test]
    fn test_leaf_keys_resolve() {
        for value in [sample(), dotted()] {
            for key in value.leaf_keys() {
                assert!(
                    value.get_path(&key).and_then(Value::as_text).is_some(),
                    "{} is listed but not found",
                    key
                );
            }
        }
    }

    #[test]
    fn test_get_path_separators() {
        let value = sample();

        assert_eq!(
            value.get_path("Database:Host").and_then(Value::as_str),
            Some("localhost")
        );
        assert_eq!(
            value.get_path("Database.Port").and_then(Value::as_i64),
            Some(5432)
        );
    }

    #[test]
    fn test_get_path_case_insensitive() {
        let value = sample();

        assert_eq!(
            value.get_path("database:host").and_then(Value::as_str),
            Some("localhost")
        );
        assert_eq!(
            value.get_path("DATABASE.PORT").and_then(Value::as_i64),
            Some(5432)
        );
    }

    #[test]
    fn test_get_path_exact_match_preferred() {
        let mut map = IndexMap::new();
        map.insert("mode".into(), Value::from("lower"));
        map.insert("Mode".into(), Value::from("upper"));
        let value = Value::Mapping(map);

        assert_eq!(value.get_path("Mode").and_then(Value::as_str), Some("upper"));
        assert_eq!(value.get_path("mode").and_then(Value::as_str), Some("lower"));
        assert_eq!(value.get_path("MODE").and_then(Value::as_str), Some("lower"));
    }

    #[test]
    fn test_get_path_sequences() {
        let value = sample();

        assert_eq!(
            value.get_path("servers[1]").and_then(Value::as_str),
            Some("server2")
        );
        assert_eq!(
            value.get_path("servers:0").and_then(Value::as_str),
            Some("server1")
        );
        assert!(value.get_path("servers:7").is_none());
    }

    #[test]
    fn test_get_path_not_found() {
        let value = sample();

        assert!(value.get_path("nonexistent").is_none());
        assert!(value.get_path("Database:Host:Deeper").is_none());
        assert!(value.get_path("servers[x]").is_none());
    }

    #[test]
    fn test_as_text() {
        let value = sample();
        let text = |key: &str| value.get_path(key).and_then(Value::as_text);

        assert_eq!(text("Database:Host"), Some("localhost".to_string()));
        assert_eq!(text("Database:Port"), Some("5432".to_string()));
        assert_eq!(text("Database:Ssl"), Some("true".to_string()));
        assert_eq!(text("Database:Ratio"), Some("0.5".to_string()));
        assert_eq!(Value::Float(1.0).as_text(), Some("1.0".to_string()));
        assert_eq!(Value::Float(-2.25).as_text(), Some("-2.25".to_string()));
        assert_eq!(text("Database:Password"), None);
        assert_eq!(text("Database"), None);
        assert_eq!(text("servers"), None);
    }

    #[test]
    fn test_leaf_keys() {
        let value = sample();

        assert_eq!(
            value.leaf_keys(),
            vec![
                "Database:Host",
                "Database:Port",
                "Database:Ssl",
                "Database:Ratio",
                "servers:0",
                "servers:1",
            ]
        );
    }

    #[test]
    fn test_merge_deep() {
        let mut base = sample();

        let mut db_overlay = IndexMap::new();
        db_overlay.insert("Host".into(), Value::from("prod-db"));
        let mut overlay = IndexMap::new();
        overlay.insert("Database".into(), Value::Mapping(db_overlay));

        base.merge(Value::Mapping(overlay));

        assert_eq!(
            base.get_path("Database:Host").and_then(Value::as_str),
            Some("prod-db")
        );
        assert_eq!(
            base.get_path("Database:Port").and_then(Value::as_i64),
            Some(5432)
        );
    }

    #[test]
    fn test_merge_null_removes_key() {
        let mut base = sample();

        let mut db_overlay = IndexMap::new();
        db_overlay.insert("Host".into(), Value::Null);
        let mut overlay = IndexMap::new();
        overlay.insert("Database".into(), Value::Mapping(db_overlay));

        base.merge(Value::Mapping(overlay));

        assert!(base.get_path("Database:Host").is_none());
        assert!(base.get_path("Database:Port").is_some());
    }

    #[test]
    fn test_merge_array_replaces() {
        let mut base = sample();

        let mut overlay = IndexMap::new();
        overlay.insert("servers".into(), Value::from(vec!["c"]));
        base.merge(Value::Mapping(overlay));

        assert_eq!(
            base.get_path("servers"),
            Some(&Value::Sequence(vec![Value::from("c")]))
        );
    }

    #[test]
    fn test_merge_type_mismatch() {
        let mut base = sample();

        let mut overlay = IndexMap::new();
        overlay.insert("Database".into(), Value::from("connection-string"));
        base.merge(Value::Mapping(overlay));

        assert_eq!(
            base.get_path("Database").and_then(Value::as_str),
            Some("connection-string")
        );
    }

    #[test]
    fn test_display() {
        let value = Value::from(vec![Value::from(1i64), Value::from(true)]);
        assert_eq!(value.to_string(), "[1, true]");
        assert_eq!(value.type_name(), "sequence");
    }
}
