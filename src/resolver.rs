//! Reference resolution over a loaded document graph.
//!
//! Generators receive a [`ResolveContext`]: single-hop typed resolution
//! plus a deep lookup that follows chains of references until something
//! matching the wanted shape turns up.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decoder::{json_type_name, SchemaDecoder};
use crate::error::{DecodeReport, ResolveError};
use crate::loader::DocumentGraph;

/// A reference node: an object carrying a `$ref` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub target: String,
}

impl Reference {
    pub fn new(target: impl Into<String>) -> Self {
        Reference {
            target: target.into(),
        }
    }
}

/// Decoder for [`Reference`] nodes. Fields besides `$ref` are ignored;
/// resolution only cares about the pointer.
pub struct ReferenceDecoder;

impl SchemaDecoder for ReferenceDecoder {
    type Output = Reference;

    fn name(&self) -> &str {
        "reference"
    }

    fn decode(&self, raw: &Value) -> Result<Reference, DecodeReport> {
        match raw.get("$ref") {
            Some(Value::String(target)) => Ok(Reference::new(target.clone())),
            Some(other) => Err(DecodeReport::single(
                "reference",
                "/$ref",
                format!("expected string, got {}", json_type_name(other)),
            )),
            None => Err(DecodeReport::single(
                "reference",
                "",
                format!("expected object with \"$ref\", got {}", json_type_name(raw)),
            )),
        }
    }
}

/// Reference-resolution capabilities handed to code generators.
///
/// A stateless view over a loaded graph. Lookups are pure, so resolving
/// the same reference twice always gives the same answer.
pub struct ResolveContext<'a> {
    graph: &'a DocumentGraph,
}

impl<'a> ResolveContext<'a> {
    pub fn new(graph: &'a DocumentGraph) -> Self {
        ResolveContext { graph }
    }

    /// The underlying document graph.
    pub fn graph(&self) -> &DocumentGraph {
        self.graph
    }

    /// Resolve one reference string and decode the node it points at.
    ///
    /// Strictly single-hop: when the target node is itself a reference,
    /// that reference node is what gets decoded. Follow chains with
    /// [`deep_lookup`](ResolveContext::deep_lookup) instead.
    ///
    /// # Errors
    ///
    /// `MissingReference` when no node exists at the pointer,
    /// `Mismatch` (carrying the full report) when the node exists but does
    /// not decode.
    pub fn resolve_ref<D: SchemaDecoder>(
        &self,
        reference: &str,
        decoder: &D,
    ) -> Result<D::Output, ResolveError> {
        let node = self
            .graph
            .node(reference)
            .ok_or_else(|| ResolveError::MissingReference {
                reference: reference.to_string(),
            })?;
        decoder.decode(node).map_err(|report| ResolveError::Mismatch {
            reference: reference.to_string(),
            report,
        })
    }

    /// Walk from `node` through reference indirections until a value
    /// decoding as `target` is found.
    ///
    /// At each step: a node decoding as `target` is the answer; otherwise
    /// a node decoding as `reference` is followed one hop and the walk
    /// continues; anything else ends the walk. Absence is an expected
    /// outcome, so dangling pointers and shape mismatches yield `None`
    /// rather than an error. A visited set of reference strings bounds the
    /// walk, so cycles of reference nodes terminate too.
    pub fn deep_lookup<T>(
        &self,
        node: &Value,
        target: &impl SchemaDecoder<Output = T>,
        reference: &impl SchemaDecoder<Output = Reference>,
    ) -> Option<T> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = node;
        loop {
            if let Ok(found) = target.decode(current) {
                return Some(found);
            }
            let next = reference.decode(current).ok()?;
            if !visited.insert(next.target.clone()) {
                tracing::debug!(reference = %next.target, "reference cycle, ending lookup");
                return None;
            }
            current = self.graph.node(&next.target)?;
        }
    }
}
