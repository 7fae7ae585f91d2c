//! Helpers shared by every `from_env` configuration loader.

use std::fmt::Display;
use std::str::FromStr;

/// Error raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value \"{value}\": {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} entry \"{entry}\" must look like {expected}")]
    MalformedEntry {
        var: &'static str,
        entry: String,
        expected: &'static str,
    },
}

/// Read `var` through `lookup` and parse it, falling back to `default`
/// when unset.
pub fn parse_var<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

/// Read a string variable, falling back to `default` when unset.
pub fn string_var<F>(lookup: &F, var: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).unwrap_or_else(|| default.to_string())
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Reader over the process environment.
pub fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}
