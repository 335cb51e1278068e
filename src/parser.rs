//! Format parsers turning raw document bytes into JSON value trees.
//!
//! The loader does not care what is on disk, only that some registered
//! parser claims the path and produces a [`serde_json::Value`]. JSON and
//! YAML ship built in; proprietary dialects (design-tool archives and the
//! like) plug in through [`DocumentParser`].

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;

/// A format parser for one class of document files.
pub trait DocumentParser: Send + Sync {
    /// Parser name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether this parser claims the given path (usually by extension).
    fn can_parse(&self, path: &Path) -> bool;

    /// Parse raw bytes into a JSON value tree.
    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Value, LoadError>;
}

/// Parser for `.json` documents.
pub struct JsonParser;

impl DocumentParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn can_parse(&self, path: &Path) -> bool {
        matches!(extension(path).as_deref(), Some("json"))
    }

    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Value, LoadError> {
        serde_json::from_slice(bytes).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Parser for `.yaml`/`.yml` documents.
pub struct YamlParser;

impl DocumentParser for YamlParser {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn can_parse(&self, path: &Path) -> bool {
        matches!(extension(path).as_deref(), Some("yaml") | Some("yml"))
    }

    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Value, LoadError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_slice(bytes).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        yaml_to_json_value(&yaml).map_err(|message| LoadError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Ordered collection of parsers. The first parser claiming a path wins;
/// custom parsers registered with [`ParserRegistry::with_parser`] are tried
/// before the built-ins.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Registry with the built-in JSON and YAML parsers.
    pub fn standard() -> Self {
        ParserRegistry {
            parsers: vec![Box::new(JsonParser), Box::new(YamlParser)],
        }
    }

    /// Adds a custom parser with priority over the existing ones.
    pub fn with_parser(mut self, parser: Box<dyn DocumentParser>) -> Self {
        self.parsers.insert(0, parser);
        self
    }

    /// Parses a document with the first parser that claims its path.
    pub fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Value, LoadError> {
        match self.parsers.iter().find(|p| p.can_parse(path)) {
            Some(parser) => {
                tracing::debug!(path = %path.display(), parser = parser.name(), "parsing document");
                parser.parse(path, bytes)
            }
            None => Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        ParserRegistry::standard()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.parsers.iter().map(|p| p.name()).collect();
        f.debug_struct("ParserRegistry")
            .field("parsers", &names)
            .finish()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// YAML has a richer type system than JSON (tags, non-string keys), but
/// specification documents use the JSON-compatible subset. Numeric and
/// boolean mapping keys are stringified; anything stranger is rejected.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("unsupported YAML number: {n:?}"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => {
            // Ignore YAML tags, just convert the inner value.
            yaml_to_json_value(&tagged.value)
        }
    }
}
