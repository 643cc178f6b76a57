//! envconf CLI - read configuration values with environment placeholders
//!
//! Usage:
//!   envconf get appsettings.yaml Database:Port --type int
//!   envconf resolve 'http://${HOST}:${?PORT}'
//!   envconf dump appsettings.yaml --resolve
//!   envconf check appsettings.yaml local.json

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use envconf_core::{
    ConfigData, FileSource, FileSpec, PlaceholderResolver, ValueSource, FALSY, TRUTHY,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// envconf - Typed configuration values with environment placeholders
#[derive(Parser)]
#[command(name = "envconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log verbosity (-v debug, -vv trace); otherwise ENVCONF_LOG or "warn"
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one value, resolved and coerced
    Get {
        /// Configuration file(s), merged in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Key to read (e.g., Database:Port)
        key: String,

        /// Additional layer(s) that may be missing, merged after FILES
        #[arg(long)]
        optional: Vec<PathBuf>,

        /// Type to coerce the value to
        #[arg(short = 't', long = "type", value_enum, default_value_t = ValueType::String)]
        value_type: ValueType,

        /// Default used when the key is absent
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Resolve placeholders in a literal string against the environment
    Resolve {
        /// Text containing ${NAME} or ${?NAME} placeholders
        text: String,
    },

    /// Print every key in the configuration
    Dump {
        /// Configuration file(s), merged in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Additional layer(s) that may be missing, merged after FILES
        #[arg(long)]
        optional: Vec<PathBuf>,

        /// Resolve placeholders
        #[arg(short, long)]
        resolve: bool,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Quick syntax check of each file
    Check {
        /// Configuration file(s) to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ValueType {
    String,
    Bool,
    Int,
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Get {
            files,
            key,
            optional,
            value_type,
            default,
        } => cmd_get(files, optional, &key, value_type, default),

        Commands::Resolve { text } => cmd_resolve(&text),

        Commands::Dump {
            files,
            optional,
            resolve,
            format,
        } => cmd_dump(files, optional, resolve, &format),

        Commands::Check { files } => cmd_check(files),
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("ENVCONF_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Also bridges records from the `log` facade used by envconf-core
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_source(files: Vec<PathBuf>, optional: Vec<PathBuf>) -> Result<FileSource, String> {
    let specs: Vec<FileSpec> = files
        .into_iter()
        .map(FileSpec::required)
        .chain(optional.into_iter().map(FileSpec::optional))
        .collect();

    log::debug!("Loading {} configuration layer(s)", specs.len());
    FileSource::load_layers(specs).map_err(|e| format!("Failed to load configuration: {}", e))
}

fn parse_bool_default(value: &str) -> Option<bool> {
    let value = value.to_lowercase();
    if TRUTHY.contains(&value.as_str()) {
        Some(true)
    } else if FALSY.contains(&value.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn cmd_get(
    files: Vec<PathBuf>,
    optional: Vec<PathBuf>,
    key: &str,
    value_type: ValueType,
    default: Option<String>,
) -> ExitCode {
    let source = match load_source(files, optional) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };
    let config = ConfigData::new(Arc::new(source));

    let result = match value_type {
        ValueType::String => config.get_string(key, default.as_deref().unwrap_or("")),
        ValueType::Bool => {
            let default = match default.as_deref().map(parse_bool_default) {
                None => false,
                Some(Some(b)) => b,
                Some(None) => {
                    eprintln!("{}: default is not a boolean", "Error".red());
                    return ExitCode::from(2);
                }
            };
            config.get_bool(key, default).map(|b| b.to_string())
        }
        ValueType::Int => {
            let default = match default.as_deref().map(str::parse::<i32>) {
                None => 0,
                Some(Ok(i)) => i,
                Some(Err(e)) => {
                    eprintln!("{}: default is not an integer: {}", "Error".red(), e);
                    return ExitCode::from(2);
                }
            };
            config.get_int(key, default).map(|i| i.to_string())
        }
    };

    match result {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_resolve(text: &str) -> ExitCode {
    match PlaceholderResolver::default().resolve(text) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_dump(files: Vec<PathBuf>, optional: Vec<PathBuf>, resolve: bool, format: &str) -> ExitCode {
    let source = match load_source(files, optional) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };
    let config = ConfigData::new(source.clone());

    let mut entries = Vec::new();
    for key in source.keys() {
        let value = if resolve {
            match config.get_string(&key, "") {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e.with_key(key));
                    return ExitCode::from(1);
                }
            }
        } else {
            match source.lookup(&key) {
                Some(v) => v,
                None => continue,
            }
        };
        entries.push((key, value));
    }

    match format {
        "json" => {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();
            match serde_json::to_string_pretty(&map) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    return ExitCode::from(1);
                }
            }
        }
        "text" => {
            for (key, value) in entries {
                println!("{} = {}", key, value);
            }
        }
        other => {
            eprintln!("Unsupported format: {}. Use text or json.", other);
            return ExitCode::from(1);
        }
    }

    ExitCode::SUCCESS
}

fn cmd_check(files: Vec<PathBuf>) -> ExitCode {
    let mut all_valid = true;

    for file in files {
        let is_json = file
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        match FileSource::load(&file) {
            Ok(_) => {
                println!(
                    "{} {}: valid {}",
                    "✓".green(),
                    file.display(),
                    if is_json { "JSON" } else { "YAML" }
                );
            }
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_get_command() {
        let cli = Cli::try_parse_from([
            "envconf",
            "get",
            "base.yaml",
            "local.yaml",
            "Database:Port",
            "--type",
            "int",
            "--default",
            "5432",
        ])
        .unwrap();

        match cli.command {
            Commands::Get {
                files,
                key,
                value_type,
                default,
                ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(key, "Database:Port");
                assert_eq!(value_type, ValueType::Int);
                assert_eq!(default.as_deref(), Some("5432"));
            }
            _ => panic!("Expected get command"),
        }
    }

    #[test]
    fn test_parse_bool_default() {
        assert_eq!(parse_bool_default("Yes"), Some(true));
        assert_eq!(parse_bool_default("-1"), Some(true));
        assert_eq!(parse_bool_default("0"), Some(false));
        assert_eq!(parse_bool_default("maybe"), None);
    }

    #[test]
    fn test_load_source_optional_layer() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.yaml");
        std::fs::write(&base, "a: 1\n").unwrap();

        let source = load_source(vec![base], vec![dir.path().join("missing.yaml")]).unwrap();
        assert_eq!(source.keys(), vec!["a"]);
    }

    #[test]
    fn test_load_source_required_missing() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_source(vec![dir.path().join("missing.yaml")], vec![]).unwrap_err();
        assert!(err.contains("missing.yaml"));
    }
}
