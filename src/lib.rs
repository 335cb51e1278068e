//! Multi-document specification resolution and code generation.
//!
//! Feed the engine a root document (Swagger 2.0, OpenAPI 3.0.x,
//! AsyncAPI 2.0.0, or a plugged-in design-tool dialect) and it loads every
//! document reachable through `$ref` strings, decodes the
//! specification-shaped ones with a [`SchemaDecoder`] you supply, and hands
//! a [`Language`] generator lazy reference resolution over the whole set.
//!
//! References are never inlined into the loaded trees. A generator follows
//! them on demand: [`ResolveContext::resolve_ref`] dereferences exactly one
//! hop and reports failures, [`ResolveContext::deep_lookup`] chases chains
//! of references (cycles included) and treats absence as a plain `None`.
//!
//! # Example
//!
//! ```
//! use spec_codegen::{looks_like_spec, ReferenceDecoder, SchemaDecoder};
//! use serde_json::json;
//!
//! // Referenced documents enter the typed set only when they look like a
//! // specification in a supported dialect.
//! assert!(looks_like_spec(&json!({"openapi": "3.0.1", "paths": {}})));
//! assert!(!looks_like_spec(&json!({"rows": [1, 2, 3]})));
//!
//! // Reference nodes decode through the same decoder interface as
//! // everything else.
//! let node = json!({"$ref": "types.json#/Pet"});
//! let reference = ReferenceDecoder.decode(&node).unwrap();
//! assert_eq!(reference.target, "types.json#/Pet");
//! ```
//!
//! # Generating
//!
//! A language is a pure function from the typed document set to a file
//! tree; the pipeline does the loading and the writing around it:
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use spec_codegen::{
//!     generate, AnyDecoder, FileTree, GenerateOptions, Language, ResolveContext,
//! };
//!
//! struct Manifest;
//!
//! impl Language<serde_json::Value> for Manifest {
//!     fn generate(
//!         &self,
//!         documents: &BTreeMap<String, serde_json::Value>,
//!         _ctx: &ResolveContext,
//!     ) -> Result<FileTree, Box<dyn std::error::Error + Send + Sync>> {
//!         let names = documents.keys().cloned().collect::<Vec<_>>().join("\n");
//!         Ok(FileTree::file("manifest.txt", names))
//!     }
//! }
//!
//! let options = GenerateOptions::new("api/spec.json", "generated");
//! generate(&options, &AnyDecoder, &Manifest)?;
//! # Ok::<(), spec_codegen::GenerateError>(())
//! ```

mod classifier;
mod decoder;
mod error;
mod filetree;
mod generate;
mod loader;
mod parser;
mod resolver;

pub use classifier::{
    classify, looks_like_spec, DocumentKind, ASYNCAPI_VERSION, DESIGN_META_VERSION,
    OPENAPI_VERSIONS, SWAGGER_VERSION,
};
pub use decoder::{
    json_type_name, AnyDecoder, InvalidSchema, JsonSchemaDecoder, SchemaDecoder, TypedDecoder,
};
pub use error::{
    DecodeIssue, DecodeReport, GenerateError, LoadError, ResolveError, WriteError,
};
pub use filetree::{write_file_tree, FileTree};
pub use generate::{decode_documents, generate, GenerateOptions, Language};
pub use loader::{is_url, navigate_pointer, split_reference, DocumentGraph};
pub use parser::{DocumentParser, JsonParser, ParserRegistry, YamlParser};
pub use resolver::{Reference, ReferenceDecoder, ResolveContext};
