//! envconf-core: typed configuration access with environment placeholders
//!
//! Values are read from a [`ValueSource`], environment variable placeholders
//! (`${NAME}` mandatory, `${?NAME}` optional) are resolved, and the result is
//! coerced to a string, boolean or integer.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use envconf_core::{ConfigData, FixedEnvironment, MemorySource};
//!
//! let source = MemorySource::new()
//!     .with("Endpoint", "http://${HOST}:${?PORT}")
//!     .with("Port", "9004");
//! let env = FixedEnvironment::new()
//!     .with_var("HOST", "localhost")
//!     .with_var("PORT", "80");
//!
//! let config = ConfigData::new(Arc::new(source)).with_environment(Arc::new(env));
//! assert_eq!(config.get_string("Endpoint", "").unwrap(), "http://localhost:80");
//! assert_eq!(config.get_int("Port", 0).unwrap(), 9004);
//! assert!(config.get_bool("Verbose", true).unwrap());
//! ```

pub mod diagnostics;
pub mod env;
pub mod error;
pub mod placeholder;
pub mod source;
pub mod value;

mod accessor;

pub use accessor::{ConfigData, FALSY, TRUTHY};
pub use diagnostics::{Diagnostics, LogDiagnostics, MemoryDiagnostics};
pub use env::{EnvSnapshot, Environment, FixedEnvironment, ProcessEnvironment};
pub use error::{Error, ErrorKind, Result};
pub use placeholder::{PlaceholderKind, PlaceholderResolver, PlaceholderToken};
pub use source::{FileSource, FileSpec, MemorySource, ValueSource};
pub use value::Value;
