//! Environment variable placeholders
//!
//! Configuration values may reference environment variables:
//! - `${NAME}` - mandatory, resolution fails if `NAME` is not set
//! - `${?NAME}` - optional, left verbatim (with a warning) if `NAME` is not set
//!
//! `NAME` is an ASCII identifier (`[a-zA-Z_][a-zA-Z0-9_]*`). There is no
//! escaping and no nesting, and substituted values are never scanned again.

use std::ops::Range;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::diagnostics::{Diagnostics, LogDiagnostics, VARS_NOT_FOUND};
use crate::env::{EnvSnapshot, Environment, ProcessEnvironment};
use crate::error::{Error, Result};

static MANDATORY_PATTERN: OnceLock<Regex> = OnceLock::new();
static OPTIONAL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Whether an unresolved placeholder fails resolution or only warns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// `${NAME}`
    Mandatory,
    /// `${?NAME}`
    Optional,
}

impl PlaceholderKind {
    fn pattern(self) -> &'static Regex {
        match self {
            PlaceholderKind::Mandatory => MANDATORY_PATTERN
                .get_or_init(|| compile(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}")),
            PlaceholderKind::Optional => OPTIONAL_PATTERN
                .get_or_init(|| compile(r"\$\{\?([a-zA-Z_][a-zA-Z0-9_]*)\}")),
        }
    }

    /// The literal placeholder text for `name`
    pub fn render(self, name: &str) -> String {
        match self {
            PlaceholderKind::Mandatory => format!("${{{}}}", name),
            PlaceholderKind::Optional => format!("${{?{}}}", name),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("placeholder pattern is a valid regex")
}

/// One placeholder occurrence inside a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    /// Referenced variable name
    pub name: String,
    /// Mandatory or optional form
    pub kind: PlaceholderKind,
    /// Byte range of the whole placeholder in the scanned string
    pub span: Range<usize>,
}

/// Find all non-overlapping placeholders of one kind, in order
pub fn scan(input: &str, kind: PlaceholderKind) -> Vec<PlaceholderToken> {
    kind.pattern()
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(PlaceholderToken {
                name: caps.get(1)?.as_str().to_string(),
                kind,
                span: whole.range(),
            })
        })
        .collect()
}

/// Check if a string contains any placeholder of either kind
pub fn contains_placeholders(input: &str) -> bool {
    PlaceholderKind::Mandatory.pattern().is_match(input)
        || PlaceholderKind::Optional.pattern().is_match(input)
}

/// Distinct names in order of first appearance
fn distinct_names(tokens: &[PlaceholderToken]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for token in tokens {
        if !names.contains(&token.name.as_str()) {
            names.push(&token.name);
        }
    }
    names
}

/// Outcome of one resolution pass
struct Pass {
    tokens: Vec<PlaceholderToken>,
    unresolved: Vec<String>,
}

impl Pass {
    fn run(input: &str, kind: PlaceholderKind, env: &EnvSnapshot) -> Self {
        let tokens = scan(input, kind);
        let unresolved = distinct_names(&tokens)
            .into_iter()
            .filter(|name| !env.contains_key(*name))
            .map(str::to_string)
            .collect();
        Self { tokens, unresolved }
    }
}

/// Resolves `${NAME}` and `${?NAME}` placeholders against an [`Environment`]
#[derive(Clone)]
pub struct PlaceholderResolver {
    env: Arc<dyn Environment>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for PlaceholderResolver {
    fn default() -> Self {
        Self::new(Arc::new(ProcessEnvironment), Arc::new(LogDiagnostics))
    }
}

impl std::fmt::Debug for PlaceholderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderResolver").finish_non_exhaustive()
    }
}

impl PlaceholderResolver {
    /// Create a resolver reading from `env` and reporting to `diagnostics`
    pub fn new(env: Arc<dyn Environment>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { env, diagnostics }
    }

    /// Replace the environment provider
    pub fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    /// Replace the diagnostics sink
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Resolve every placeholder in `raw`.
    ///
    /// Mandatory placeholders are checked first: if any is unset, an error
    /// event naming all of them is reported and the call fails without
    /// returning a partial value. Unset optional placeholders are reported as
    /// a warning and kept verbatim. The environment is captured once per call.
    pub fn resolve(&self, raw: &str) -> Result<String> {
        if raw.is_empty() || !contains_placeholders(raw) {
            return Ok(raw.to_string());
        }

        let env = self.env.snapshot();

        let mandatory = Pass::run(raw, PlaceholderKind::Mandatory, &env);
        if !mandatory.unresolved.is_empty() {
            self.diagnostics
                .error(VARS_NOT_FOUND, &mandatory.unresolved.join(", "));
            return Err(Error::unresolved_placeholders(mandatory.unresolved));
        }

        let optional = Pass::run(raw, PlaceholderKind::Optional, &env);
        if !optional.unresolved.is_empty() {
            self.diagnostics
                .warn(VARS_NOT_FOUND, &optional.unresolved.join(", "));
        }

        let mut tokens = mandatory.tokens;
        tokens.extend(optional.tokens);
        tokens.sort_by_key(|t| t.span.start);

        Ok(substitute(raw, &tokens, &env))
    }
}

/// Rebuild `raw` with each token replaced by its variable's value.
///
/// Tokens must be sorted and non-overlapping. Tokens without a value are
/// copied through unchanged.
fn substitute(raw: &str, tokens: &[PlaceholderToken], env: &EnvSnapshot) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;

    for token in tokens {
        out.push_str(&raw[last..token.span.start]);
        match env.get(&token.name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&raw[token.span.clone()]),
        }
        last = token.span.end;
    }
    out.push_str(&raw[last..]);

    out
}
