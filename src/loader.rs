//! Transitive document loading.
//!
//! Builds the full closure of documents reachable from a root specification
//! through `$ref` strings. Stored trees keep their reference nodes verbatim;
//! dereferencing is the resolver's job, performed lazily on request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::LoadError;
use crate::parser::ParserRegistry;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// The loaded closure of a root specification document.
///
/// Documents are keyed by canonical identity (canonical absolute path, or
/// the URL for remote documents) in a `BTreeMap`, so iteration order is
/// stable across runs over the same inputs.
pub struct DocumentGraph {
    root_key: String,
    base_dir: PathBuf,
    cwd: PathBuf,
    documents: BTreeMap<String, Value>,
}

impl DocumentGraph {
    /// Load `spec` and every document transitively reachable from it.
    ///
    /// `spec` is resolved against `cwd` when relative. Each loaded document
    /// is scanned for `{"$ref": "<file>#<fragment>"}` nodes; non-empty file
    /// parts are resolved against the containing document's directory and
    /// loaded in turn. Already-seen documents are skipped, which is what
    /// lets circular file chains terminate.
    ///
    /// # Errors
    ///
    /// Fails if any reachable document is missing (`FileNotFound`),
    /// unreadable (`Read`), claimed by no parser (`UnsupportedFormat`), or
    /// unparseable (`Parse`). Fragments are not checked here; a `$ref` to a
    /// missing node inside an existing file surfaces later, at resolution.
    pub fn load(spec: &Path, cwd: &Path, parsers: &ParserRegistry) -> Result<Self, LoadError> {
        let spec_abs = if spec.is_absolute() {
            spec.to_path_buf()
        } else {
            cwd.join(spec)
        };
        if !spec_abs.exists() {
            return Err(LoadError::FileNotFound { path: spec_abs });
        }
        let root_path = spec_abs
            .canonicalize()
            .map_err(|source| LoadError::Read {
                path: spec_abs.clone(),
                source,
            })?;
        let base_dir = root_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let root_key = root_path.display().to_string();
        let mut graph = DocumentGraph {
            root_key: root_key.clone(),
            base_dir,
            // Canonical so display_key can strip it from canonical document keys.
            cwd: cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf()),
            documents: BTreeMap::new(),
        };

        let mut pending = vec![root_key];
        while let Some(key) = pending.pop() {
            if graph.documents.contains_key(&key) {
                continue;
            }
            let value = read_document(&key, parsers)?;

            let mut targets = Vec::new();
            collect_ref_targets(&value, &mut targets);
            tracing::debug!(
                document = %graph.display_key(&key),
                refs = targets.len(),
                "loaded document"
            );
            graph.documents.insert(key.clone(), value);

            for target in targets {
                let (file_part, _) = split_reference(&target);
                if file_part.is_empty() {
                    continue;
                }
                if let Some(next) = next_document_key(&key, file_part)? {
                    if !graph.documents.contains_key(&next) {
                        pending.push(next);
                    }
                }
            }
        }

        Ok(graph)
    }

    /// The root document's tree.
    pub fn root(&self) -> &Value {
        // Present by construction: load() inserts the root first.
        &self.documents[&self.root_key]
    }

    /// Canonical identity of the root document.
    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    /// Number of loaded documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in canonical-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.documents.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Document tree for a canonical identity.
    pub fn document(&self, key: &str) -> Option<&Value> {
        self.documents.get(key)
    }

    /// Externally visible key for a document: its identity relative to the
    /// working directory when it lies underneath it, the full identity
    /// otherwise (URLs always render in full).
    pub fn display_key(&self, key: &str) -> String {
        match Path::new(key).strip_prefix(&self.cwd) {
            Ok(rel) => rel.display().to_string(),
            Err(_) => key.to_string(),
        }
    }

    /// Raw node a reference string points at, or `None` when either the
    /// document or the fragment does not exist.
    ///
    /// An empty file part addresses the root document; relative file parts
    /// resolve against the root document's directory (the convention
    /// callers address the graph with, distinct from the containing-file
    /// resolution used while the closure was discovered). The fragment is
    /// a JSON Pointer.
    pub fn node(&self, reference: &str) -> Option<&Value> {
        let (file_part, fragment) = split_reference(reference);
        let document = if file_part.is_empty() {
            self.root()
        } else if is_url(file_part) {
            self.documents.get(file_part)?
        } else {
            let joined = self.base_dir.join(file_part);
            let canonical = joined.canonicalize().ok()?;
            self.documents.get(&canonical.display().to_string())?
        };
        navigate_pointer(document, fragment)
    }
}

impl std::fmt::Debug for DocumentGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentGraph")
            .field("root", &self.root_key)
            .field("documents", &self.documents.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Split a reference string into file part and fragment (without `#`).
///
/// `"types.json#/a/b"` splits into `("types.json", "/a/b")`; a missing
/// `#` means an empty fragment, a leading `#` an empty file part.
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.find('#') {
        Some(idx) => (&reference[..idx], &reference[idx + 1..]),
        None => (reference, ""),
    }
}

/// Navigate a JSON Pointer fragment (e.g., "/definitions/Pet" or "#/a/0").
///
/// Returns `None` when any step is missing. Object member names unescape
/// `~1` to `/` and `~0` to `~`; array steps must parse as indices.
pub fn navigate_pointer<'a>(document: &'a Value, fragment: &str) -> Option<&'a Value> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Some(document);
    }

    let mut current = document;
    for part in path.split('/') {
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Gather every `$ref` string in the tree, in document order.
fn collect_ref_targets(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(target) = map.get("$ref").and_then(Value::as_str) {
                out.push(target.to_string());
            }
            for nested in map.values() {
                collect_ref_targets(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_ref_targets(item, out);
            }
        }
        _ => {}
    }
}

/// Canonical identity of the document a reference's file part points at,
/// resolved from inside `containing`. `None` means the reference is
/// deliberately not followed (relative references inside remote documents).
fn next_document_key(containing: &str, file_part: &str) -> Result<Option<String>, LoadError> {
    if is_url(file_part) {
        #[cfg(feature = "remote")]
        {
            return Ok(Some(file_part.to_string()));
        }
        #[cfg(not(feature = "remote"))]
        {
            return Err(LoadError::FileNotFound {
                path: PathBuf::from(file_part),
            });
        }
    }
    if is_url(containing) {
        tracing::debug!(
            reference = file_part,
            document = containing,
            "not following relative reference inside remote document"
        );
        return Ok(None);
    }

    let dir = Path::new(containing)
        .parent()
        .unwrap_or_else(|| Path::new("/"));
    let joined = dir.join(file_part);
    if !joined.exists() {
        return Err(LoadError::FileNotFound { path: joined });
    }
    let canonical = joined.canonicalize().map_err(|source| LoadError::Read {
        path: joined.clone(),
        source,
    })?;
    Ok(Some(canonical.display().to_string()))
}

/// Read and parse one document by canonical identity.
fn read_document(key: &str, parsers: &ParserRegistry) -> Result<Value, LoadError> {
    if is_url(key) {
        #[cfg(feature = "remote")]
        {
            return fetch_document(key);
        }
        #[cfg(not(feature = "remote"))]
        {
            return Err(LoadError::FileNotFound {
                path: PathBuf::from(key),
            });
        }
    }

    let path = Path::new(key);
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => LoadError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    parsers.parse(path, &bytes)
}

/// Fetch a remote document over HTTP/HTTPS. Remote documents must be JSON.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
fn fetch_document(url: &str) -> Result<Value, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| LoadError::Network {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .map_err(|source| LoadError::Network {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before parsing
    let response = response
        .error_for_status()
        .map_err(|source| LoadError::Network {
            url: url.to_string(),
            source,
        })?;

    response.json().map_err(|source| LoadError::Network {
        url: url.to_string(),
        source,
    })
}
