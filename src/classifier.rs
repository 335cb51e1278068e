//! Specification-shaped document detection.
//!
//! Referenced documents are loaded indiscriminately, but only the ones
//! shaped like a specification in a supported dialect are decoded into the
//! typed document set. The root is exempt: it is always decoded.

use serde_json::Value;

/// Swagger version accepted by the classifier.
pub const SWAGGER_VERSION: &str = "2.0";

/// OpenAPI versions accepted by the classifier.
pub const OPENAPI_VERSIONS: &[&str] = &["3.0.0", "3.0.1", "3.0.2"];

/// AsyncAPI version accepted by the classifier.
pub const ASYNCAPI_VERSION: &str = "2.0.0";

/// Format version carried under `meta.version` by design-tool documents.
pub const DESIGN_META_VERSION: i64 = 121;

/// Whether a document carries one of the supported dialect discriminants.
///
/// The check is shallow and exact: a top-level `swagger: "2.0"`,
/// `openapi: "3.0.0" | "3.0.1" | "3.0.2"`, `asyncapi: "2.0.0"`, or a
/// nested `meta.version: 121`. Anything else is auxiliary data.
pub fn looks_like_spec(document: &Value) -> bool {
    is_swagger(document) || is_openapi(document) || is_asyncapi(document) || is_design_file(document)
}

fn is_swagger(document: &Value) -> bool {
    document.get("swagger").and_then(Value::as_str) == Some(SWAGGER_VERSION)
}

fn is_openapi(document: &Value) -> bool {
    document
        .get("openapi")
        .and_then(Value::as_str)
        .map_or(false, |version| OPENAPI_VERSIONS.contains(&version))
}

fn is_asyncapi(document: &Value) -> bool {
    document.get("asyncapi").and_then(Value::as_str) == Some(ASYNCAPI_VERSION)
}

fn is_design_file(document: &Value) -> bool {
    document
        .get("meta")
        .and_then(|meta| meta.get("version"))
        .and_then(Value::as_i64)
        == Some(DESIGN_META_VERSION)
}

/// Role a document plays in a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// The entry-point document; decoded unconditionally.
    Root,
    /// A referenced document shaped like a specification.
    Spec,
    /// A referenced document carried for resolution only.
    Data,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Root => "root",
            DocumentKind::Spec => "spec",
            DocumentKind::Data => "data",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // pad() keeps width specifiers working in aligned listings.
        f.pad(self.as_str())
    }
}

/// Classify one document of the graph.
pub fn classify(document: &Value, is_root: bool) -> DocumentKind {
    if is_root {
        DocumentKind::Root
    } else if looks_like_spec(document) {
        DocumentKind::Spec
    } else {
        DocumentKind::Data
    }
}
