//! The generation pipeline.
//!
//! Ties the stages together: load the document closure, gate referenced
//! documents through the classifier, decode the survivors with the
//! caller's decoder, hand the typed set and a resolve context to the
//! language generator, and write whatever it produced. Every stage
//! short-circuits, so a failed run leaves no partial output behind.

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::classifier;
use crate::decoder::SchemaDecoder;
use crate::error::{GenerateError, LoadError};
use crate::filetree::{write_file_tree, FileTree};
use crate::loader::DocumentGraph;
use crate::parser::ParserRegistry;
use crate::resolver::ResolveContext;

/// A code generator: turns the typed document set into a file tree,
/// following references through the context as needed. Pure; all disk
/// I/O belongs to the pipeline.
pub trait Language<A> {
    fn generate(
        &self,
        documents: &BTreeMap<String, A>,
        ctx: &ResolveContext,
    ) -> Result<FileTree, Box<dyn Error + Send + Sync>>;
}

/// Options for one generation run.
#[derive(Debug)]
pub struct GenerateOptions {
    /// Working directory relative spec paths and document keys resolve
    /// against. Defaults to the process working directory.
    pub cwd: Option<PathBuf>,
    /// Directory the generated tree is written into.
    pub out: PathBuf,
    /// Root specification document.
    pub spec: PathBuf,
    /// Format parsers used to read documents.
    pub parsers: ParserRegistry,
}

impl GenerateOptions {
    pub fn new(spec: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        GenerateOptions {
            cwd: None,
            out: out.into(),
            spec: spec.into(),
            parsers: ParserRegistry::standard(),
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Build the typed document set for a loaded graph: the root plus every
/// referenced document that looks like a specification, each decoded with
/// `decoder` and keyed by display key.
///
/// Referenced documents that fail the classifier are auxiliary data: they
/// stay out of the set (with an info event) and are never decoded. The
/// first document that fails to decode aborts with its full report.
pub fn decode_documents<D: SchemaDecoder>(
    graph: &DocumentGraph,
    decoder: &D,
) -> Result<BTreeMap<String, D::Output>, GenerateError> {
    let mut documents = BTreeMap::new();
    for (key, raw) in graph.iter() {
        let display_key = graph.display_key(key);
        let is_root = key == graph.root_key();
        if !is_root && !classifier::looks_like_spec(raw) {
            tracing::info!(document = %display_key, "skipping non-specification document");
            continue;
        }
        let decoded = decoder
            .decode(raw)
            .map_err(|report| GenerateError::Decode {
                document: display_key.clone(),
                report,
            })?;
        tracing::debug!(document = %display_key, "decoded document");
        documents.insert(display_key, decoded);
    }
    Ok(documents)
}

/// Run the full pipeline for `options`.
///
/// # Errors
///
/// Any stage failure aborts the run: `Load` for the closure, `Decode` for
/// the first document rejected by the decoder, `Language` for generator
/// failures, `Write` if the finished tree cannot be written. The output
/// directory is not touched before the write stage.
pub fn generate<D, L>(
    options: &GenerateOptions,
    decoder: &D,
    language: &L,
) -> Result<(), GenerateError>
where
    D: SchemaDecoder,
    L: Language<D::Output>,
{
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().map_err(|source| {
            GenerateError::Load(LoadError::Read {
                path: PathBuf::from("."),
                source,
            })
        })?,
    };
    let out = absolutize(&options.out, &cwd);

    tracing::info!(spec = %options.spec.display(), "loading document closure");
    let graph = DocumentGraph::load(&options.spec, &cwd, &options.parsers)?;
    tracing::debug!(documents = graph.len(), "closure loaded");

    let documents = decode_documents(&graph, decoder)?;
    tracing::info!(documents = documents.len(), "typed document set ready");

    let ctx = ResolveContext::new(&graph);
    let tree = language
        .generate(&documents, &ctx)
        .map_err(|source| GenerateError::Language { source })?;

    tracing::info!(out = %out.display(), "writing generated files");
    write_file_tree(&out, &tree)?;
    Ok(())
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
