//! Document decoding against caller-supplied shapes.
//!
//! The engine never hard-codes a dialect model. Whoever drives a run hands
//! it a [`SchemaDecoder`], and the same capability powers typed reference
//! resolution. Two general-purpose implementations ship here: one backed
//! by a JSON Schema, one backed by serde deserialization.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DecodeIssue, DecodeReport};

/// A decoding capability: checks a raw tree against a shape and produces
/// the typed form.
pub trait SchemaDecoder {
    type Output;

    /// Decoder name, used in reports.
    fn name(&self) -> &str;

    /// Decode a raw tree, reporting every violation on failure.
    fn decode(&self, raw: &Value) -> Result<Self::Output, DecodeReport>;

    /// Type-guard form of [`decode`](SchemaDecoder::decode).
    fn is(&self, raw: &Value) -> bool {
        self.decode(raw).is_ok()
    }
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Error compiling a JSON Schema into a decoder.
#[derive(Debug, thiserror::Error)]
#[error("invalid schema: {message}")]
pub struct InvalidSchema {
    pub message: String,
}

/// Decoder backed by a compiled JSON Schema.
///
/// `decode` validates the raw tree and yields it back unchanged; the
/// report carries one issue per schema violation, each with its JSON
/// Pointer instance path.
#[derive(Debug)]
pub struct JsonSchemaDecoder {
    name: String,
    validator: jsonschema::Validator,
}

impl JsonSchemaDecoder {
    /// Compile `schema` into a decoder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` if the schema itself does not compile.
    pub fn new(name: impl Into<String>, schema: &Value) -> Result<Self, InvalidSchema> {
        let validator = jsonschema::validator_for(schema).map_err(|e| InvalidSchema {
            message: e.to_string(),
        })?;
        Ok(JsonSchemaDecoder {
            name: name.into(),
            validator,
        })
    }
}

impl SchemaDecoder for JsonSchemaDecoder {
    type Output = Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, raw: &Value) -> Result<Value, DecodeReport> {
        let issues: Vec<DecodeIssue> = self
            .validator
            .iter_errors(raw)
            .map(|e| DecodeIssue {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if issues.is_empty() {
            Ok(raw.clone())
        } else {
            Err(DecodeReport::new(self.name.clone(), issues))
        }
    }
}

/// Decoder backed by serde deserialization into `T`.
pub struct TypedDecoder<T> {
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedDecoder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        TypedDecoder {
            name: name.into(),
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> SchemaDecoder for TypedDecoder<T> {
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, raw: &Value) -> Result<T, DecodeReport> {
        serde_json::from_value(raw.clone())
            .map_err(|e| DecodeReport::single(self.name.clone(), "", e.to_string()))
    }
}

/// Decoder that accepts any tree unchanged. Useful when a run only needs
/// loading and resolution, not shape checking.
pub struct AnyDecoder;

impl SchemaDecoder for AnyDecoder {
    type Output = Value;

    fn name(&self) -> &str {
        "any document"
    }

    fn decode(&self, raw: &Value) -> Result<Value, DecodeReport> {
        Ok(raw.clone())
    }
}
