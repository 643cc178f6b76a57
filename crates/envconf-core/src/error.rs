//! Error types for envconf
//!
//! Errors carry a structured kind plus the configuration key and an
//! actionable help message where one is known.

use std::fmt;
use std::num::ParseIntError;

/// Result type alias for envconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for envconf operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Configuration key being read when the error occurred
    pub key: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause for loading failures
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// One or more `${NAME}` placeholders have no environment value
    #[error("Environment variables not found: {}", .names.join(", "))]
    UnresolvedPlaceholders { names: Vec<String> },

    /// A resolved value could not be coerced to the requested type
    #[error("Unable to load configuration value for '{key}'")]
    InvalidValue {
        key: String,
        #[source]
        source: ParseIntError,
    },

    /// Error parsing a YAML/JSON configuration file
    #[error("Parse error")]
    Parse,

    /// A required configuration file does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Reading a configuration file failed for another reason
    #[error("I/O error")]
    Io,
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create an unresolved mandatory placeholder error
    pub fn unresolved_placeholders(names: Vec<String>) -> Self {
        let help = format!(
            "Set {} in the environment, or use ${{?NAME}} for values that may be absent",
            names.join(", ")
        );
        Self::from_kind(ErrorKind::UnresolvedPlaceholders { names }).with_help(help)
    }

    /// Create an invalid value error for `key`, wrapping the integer parse failure
    pub fn invalid_value(key: impl Into<String>, source: ParseIntError) -> Self {
        let key = key.into();
        Self {
            key: Some(key.clone()),
            help: Some("Ensure the value is a base-10 integer".into()),
            ..Self::from_kind(ErrorKind::InvalidValue { key, source })
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Parse)
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::FileNotFound { path: path.into() }).with_help(
            "Check the path, or load the file as optional if it may be absent",
        )
    }

    /// Create an I/O error
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Io)
        }
        .with_source_location(SourceLocation {
            file: path.into(),
            line: None,
            column: None,
        })
    }

    /// Names of the unresolved mandatory placeholders, if this is that kind of error
    pub fn unresolved_names(&self) -> Option<&[String]> {
        match &self.kind {
            ErrorKind::UnresolvedPlaceholders { names } => Some(names),
            _ => None,
        }
    }

    /// Add key context to the error
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(key) = &self.key {
            write!(f, "\n  Key: {}", key)?;
        }

        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let ErrorKind::InvalidValue { source, .. } = &self.kind {
            write!(f, "\n  {}", source)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::InvalidValue { source, .. } => Some(source),
            _ => None,
        }
    }
}
