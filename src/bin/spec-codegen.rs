//! Specification resolution CLI
//!
//! Command-line interface over the document engine: inspect a closure,
//! resolve references against it, and run the generation pipeline with the
//! built-in bundling generator.

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use spec_codegen::{
    classify, generate, AnyDecoder, DocumentGraph, FileTree, GenerateError, GenerateOptions,
    JsonSchemaDecoder, Language, ParserRegistry, ReferenceDecoder, ResolveContext, SchemaDecoder,
};

#[derive(Parser)]
#[command(name = "spec-codegen")]
#[command(about = "Resolve multi-document API specifications and generate code")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every document reachable from a root specification
    Graph {
        /// Root specification document
        spec: PathBuf,

        /// Working directory; relative spec paths and displayed keys resolve against it
        #[arg(long)]
        base: Option<PathBuf>,

        /// Output the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a reference against the loaded closure
    Resolve {
        /// Root specification document
        spec: PathBuf,

        /// Reference to resolve, e.g. "types.json#/definitions/Pet"
        #[arg(long = "ref")]
        reference: String,

        /// JSON Schema the resolved node must match
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Follow chains of references until a node matches the schema
        #[arg(long, requires = "schema")]
        deep: bool,

        /// Working directory; relative spec paths and displayed keys resolve against it
        #[arg(long)]
        base: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Decode the typed document set and write it out as JSON files
    Generate {
        /// Root specification document
        spec: PathBuf,

        /// Output directory for generated files
        #[arg(long, short)]
        out: PathBuf,

        /// JSON Schema every typed document must match
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Working directory; relative spec paths and displayed keys resolve against it
        #[arg(long)]
        base: Option<PathBuf>,

        /// Pretty-print generated JSON files
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Graph { spec, base, json } => run_graph(&spec, base, json),

        Commands::Resolve {
            spec,
            reference,
            schema,
            deep,
            base,
            output,
            pretty,
        } => run_resolve(&spec, &reference, schema, deep, base, output, pretty),

        Commands::Generate {
            spec,
            out,
            schema,
            base,
            pretty,
        } => run_generate(spec, out, schema, base, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load_graph(spec: &Path, base: Option<PathBuf>) -> Result<(DocumentGraph, PathBuf), u8> {
    let cwd = match base {
        Some(dir) => dir,
        None => std::env::current_dir().map_err(|e| {
            eprintln!("Error: cannot determine working directory: {}", e);
            3u8
        })?,
    };

    let graph = DocumentGraph::load(spec, &cwd, &ParserRegistry::standard()).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    Ok((graph, cwd))
}

fn run_graph(spec: &Path, base: Option<PathBuf>, json: bool) -> Result<(), u8> {
    let (graph, _cwd) = load_graph(spec, base)?;

    if json {
        let documents: Vec<Value> = graph
            .iter()
            .map(|(key, document)| {
                serde_json::json!({
                    "document": graph.display_key(key),
                    "kind": classify(document, key == graph.root_key()),
                })
            })
            .collect();
        println!("{}", serde_json::json!({ "documents": documents }));
    } else {
        for (key, document) in graph.iter() {
            let kind = classify(document, key == graph.root_key());
            println!("{:<5} {}", kind, graph.display_key(key));
        }
    }
    Ok(())
}

fn run_resolve(
    spec: &Path,
    reference: &str,
    schema: Option<PathBuf>,
    deep: bool,
    base: Option<PathBuf>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let (graph, _cwd) = load_graph(spec, base)?;
    let ctx = ResolveContext::new(&graph);

    let resolved: Value = match schema {
        Some(schema_path) => {
            let decoder = load_schema_decoder(&schema_path)?;
            if deep {
                let start = serde_json::json!({ "$ref": reference });
                match ctx.deep_lookup(&start, &decoder, &ReferenceDecoder) {
                    Some(value) => value,
                    None => {
                        eprintln!(
                            "Error: no value matching {} is reachable from {}",
                            decoder.name(),
                            reference
                        );
                        return Err(1);
                    }
                }
            } else {
                ctx.resolve_ref(reference, &decoder).map_err(|e| {
                    eprintln!("Error: {}", e);
                    e.exit_code() as u8
                })?
            }
        }
        None => ctx.resolve_ref(reference, &AnyDecoder).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
    };

    let rendered = render_json(&resolved, pretty)?;
    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", rendered);
        }
    }
    Ok(())
}

fn run_generate(
    spec: PathBuf,
    out: PathBuf,
    schema: Option<PathBuf>,
    base: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let out_display = out.display().to_string();
    let mut options = GenerateOptions::new(spec, out);
    options.cwd = base;

    let language = BundleLanguage { pretty };
    let result = match schema {
        Some(schema_path) => {
            let decoder = load_schema_decoder(&schema_path)?;
            generate(&options, &decoder, &language)
        }
        None => generate(&options, &AnyDecoder, &language),
    };

    result.map_err(|e| {
        match &e {
            GenerateError::Decode { document, report } => {
                eprintln!("Error: document {} does not decode as {}:", document, report.decoder);
                for issue in &report.issues {
                    eprintln!("  {}", issue);
                }
            }
            other => eprintln!("Error: {}", other),
        }
        e.exit_code() as u8
    })?;

    println!("Generated into {}", out_display);
    Ok(())
}

/// Load a JSON Schema file and compile it into a decoder. The file goes
/// through the same parser registry as the documents, so YAML schemas work.
fn load_schema_decoder(path: &Path) -> Result<JsonSchemaDecoder, u8> {
    let bytes = std::fs::read(path).map_err(|e| {
        eprintln!("Error: cannot read {}: {}", path.display(), e);
        3u8
    })?;
    let schema = ParserRegistry::standard()
        .parse(path, &bytes)
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("schema")
        .to_string();
    JsonSchemaDecoder::new(name, &schema).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })
}

fn render_json(value: &Value, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

/// Renders each typed document as a JSON file under a `documents/`
/// directory, mirroring nested keys as nested directories.
struct BundleLanguage {
    pretty: bool,
}

impl Language<Value> for BundleLanguage {
    fn generate(
        &self,
        documents: &BTreeMap<String, Value>,
        _ctx: &ResolveContext,
    ) -> Result<FileTree, Box<dyn Error + Send + Sync>> {
        let mut children: Vec<FileTree> = Vec::new();
        for (key, document) in documents {
            let rendered = if self.pretty {
                serde_json::to_string_pretty(document)?
            } else {
                serde_json::to_string(document)?
            };
            let parts: Vec<&str> = key
                .split(['/', '\\'])
                .filter(|part| !part.is_empty() && !part.ends_with(':'))
                .collect();
            insert_file(&mut children, &parts, rendered);
        }
        Ok(FileTree::directory("documents", children))
    }
}

/// Place content at a nested path inside the tree, creating intermediate
/// directories as needed.
fn insert_file(children: &mut Vec<FileTree>, parts: &[&str], content: String) {
    match parts {
        [] => {}
        [name] => children.push(FileTree::file(*name, content)),
        [dir, rest @ ..] => {
            let existing = children.iter_mut().find(|child| {
                matches!(child, FileTree::Directory { name, .. } if name == dir)
            });
            match existing {
                Some(FileTree::Directory { children: nested, .. }) => {
                    insert_file(nested, rest, content);
                }
                _ => {
                    let mut nested = Vec::new();
                    insert_file(&mut nested, rest, content);
                    children.push(FileTree::directory(*dir, nested));
                }
            }
        }
    }
}
