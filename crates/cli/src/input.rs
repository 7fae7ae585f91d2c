use std::path::Path;

use anyhow::{bail, Context, Result};
use mcp_core::types::JsonMap;
use serde_json::Value;

/// Read a JSON object given inline (`{...}`) or as a path to a file.
pub fn json_object_arg(source: &str) -> Result<JsonMap> {
    let trimmed = source.trim_start();
    let text = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("Failed to read {source}"))?
    };
    parse_object(&text)
}

/// Parse an inline JSON object.
pub fn parse_object(text: &str) -> Result<JsonMap> {
    match serde_json::from_str::<Value>(text).context("Invalid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("Expected a JSON object, got {}", kind(&other)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Tests ----

    #[test]
    fn inline_object() {
        let map = json_object_arg(r#" {"model": "linear", "epochs": 5}"#).unwrap();
        assert_eq!(map["model"], "linear");
        assert_eq!(map["epochs"], 5);
    }

    #[test]
    fn reads_file_path() {
        let path = std::env::temp_dir().join(format!("mcp-cli-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"ticker": "AAPL"}"#).unwrap();

        let map = json_object_arg(path.to_str().unwrap()).unwrap();
        assert_eq!(map["ticker"], "AAPL");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = json_object_arg("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = parse_object("[1, 2]").unwrap_err();
        assert_eq!(err.to_string(), "Expected a JSON object, got an array");
    }
}
