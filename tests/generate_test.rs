//! Integration tests for the generation pipeline.

use serde_json::{json, Value};
use spec_codegen::{
    generate, AnyDecoder, DocumentParser, FileTree, GenerateError, GenerateOptions,
    JsonSchemaDecoder, Language, LoadError, ParserRegistry, ResolveContext, TypedDecoder,
};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Writes a manifest listing the typed document keys, one per line.
struct ManifestLanguage;

impl<A> Language<A> for ManifestLanguage {
    fn generate(
        &self,
        documents: &BTreeMap<String, A>,
        _ctx: &ResolveContext,
    ) -> Result<FileTree, Box<dyn Error + Send + Sync>> {
        let manifest = documents.keys().cloned().collect::<Vec<_>>().join("\n");
        Ok(FileTree::directory(
            "listing",
            vec![FileTree::file("manifest.txt", manifest)],
        ))
    }
}

// === Pipeline Tests ===

mod pipeline {
    use super::*;

    #[test]
    fn generates_from_a_multi_document_fixture() {
        let out = TempDir::new().unwrap();
        let options = GenerateOptions::new("petstore.json", out.path().join("gen"))
            .with_cwd(fixture_dir("petstore"));

        generate(&options, &AnyDecoder, &ManifestLanguage).unwrap();

        let manifest = fs::read_to_string(out.path().join("gen/listing/manifest.txt")).unwrap();
        assert_eq!(
            manifest,
            "definitions.yaml\npetstore.json\nshared/errors.json"
        );
    }

    #[test]
    fn typed_documents_deserialize_into_structs() {
        #[derive(Debug, Clone, serde::Deserialize)]
        struct DescribedDocument {
            info: DocumentInfo,
        }

        #[derive(Debug, Clone, serde::Deserialize)]
        struct DocumentInfo {
            title: String,
        }

        struct TitleLanguage;

        impl Language<DescribedDocument> for TitleLanguage {
            fn generate(
                &self,
                documents: &BTreeMap<String, DescribedDocument>,
                _ctx: &ResolveContext,
            ) -> Result<FileTree, Box<dyn Error + Send + Sync>> {
                let titles = documents
                    .values()
                    .map(|doc| doc.info.title.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(FileTree::file("titles.txt", titles))
            }
        }

        let out = TempDir::new().unwrap();
        let options = GenerateOptions::new("petstore.json", out.path().join("gen"))
            .with_cwd(fixture_dir("petstore"));
        let decoder: TypedDecoder<DescribedDocument> = TypedDecoder::new("described document");

        generate(&options, &decoder, &TitleLanguage).unwrap();

        let titles = fs::read_to_string(out.path().join("gen/titles.txt")).unwrap();
        assert_eq!(
            titles,
            "Petstore shared definitions\nSwagger Petstore\nShared error responses"
        );
    }

    #[test]
    fn languages_can_follow_references() {
        struct PetRequiredLanguage;

        impl Language<Value> for PetRequiredLanguage {
            fn generate(
                &self,
                _documents: &BTreeMap<String, Value>,
                ctx: &ResolveContext,
            ) -> Result<FileTree, Box<dyn Error + Send + Sync>> {
                let pet = ctx.resolve_ref("definitions.yaml#/definitions/Pet", &AnyDecoder)?;
                let required = pet["required"]
                    .as_array()
                    .map(|names| {
                        names
                            .iter()
                            .filter_map(Value::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                Ok(FileTree::file("pet-required.txt", required))
            }
        }

        let out = TempDir::new().unwrap();
        let options = GenerateOptions::new("petstore.json", out.path().join("gen"))
            .with_cwd(fixture_dir("petstore"));

        generate(&options, &AnyDecoder, &PetRequiredLanguage).unwrap();

        let required = fs::read_to_string(out.path().join("gen/pet-required.txt")).unwrap();
        assert_eq!(required, "id, name");
    }

    #[test]
    fn output_is_identical_across_runs() {
        let out = TempDir::new().unwrap();
        for run in ["first", "second"] {
            let options = GenerateOptions::new("petstore.json", out.path().join(run))
                .with_cwd(fixture_dir("petstore"));
            generate(&options, &AnyDecoder, &ManifestLanguage).unwrap();
        }

        let first = fs::read(out.path().join("first/listing/manifest.txt")).unwrap();
        let second = fs::read(out.path().join("second/listing/manifest.txt")).unwrap();
        assert_eq!(first, second);
    }
}

// === Failure Tests ===

mod failures {
    use super::*;

    #[test]
    fn decode_failure_leaves_no_output() {
        let out = TempDir::new().unwrap();
        let gen_dir = out.path().join("gen");
        let options =
            GenerateOptions::new("petstore.json", &gen_dir).with_cwd(fixture_dir("petstore"));
        let swagger_only = JsonSchemaDecoder::new(
            "swagger document",
            &json!({ "type": "object", "required": ["swagger"] }),
        )
        .unwrap();

        let err = generate(&options, &swagger_only, &ManifestLanguage).unwrap_err();

        match &err {
            GenerateError::Decode { document, .. } => assert_eq!(document, "shared/errors.json"),
            other => panic!("expected decode failure, got {:?}", other),
        }
        assert_eq!(err.exit_code(), 1);
        assert!(!gen_dir.exists());
    }

    #[test]
    fn language_failure_leaves_no_output() {
        struct FailingLanguage;

        impl Language<Value> for FailingLanguage {
            fn generate(
                &self,
                _documents: &BTreeMap<String, Value>,
                _ctx: &ResolveContext,
            ) -> Result<FileTree, Box<dyn Error + Send + Sync>> {
                Err("template rendering broke".into())
            }
        }

        let out = TempDir::new().unwrap();
        let gen_dir = out.path().join("gen");
        let options =
            GenerateOptions::new("petstore.json", &gen_dir).with_cwd(fixture_dir("petstore"));

        let err = generate(&options, &AnyDecoder, &FailingLanguage).unwrap_err();

        assert!(matches!(err, GenerateError::Language { .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("template rendering broke"));
        assert!(!gen_dir.exists());
    }

    #[test]
    fn missing_spec_is_a_load_error() {
        let out = TempDir::new().unwrap();
        let options = GenerateOptions::new("missing.json", out.path().join("gen"))
            .with_cwd(fixture_dir("petstore"));

        let err = generate(&options, &AnyDecoder, &ManifestLanguage).unwrap_err();

        assert!(matches!(
            err,
            GenerateError::Load(LoadError::FileNotFound { .. })
        ));
        assert_eq!(err.exit_code(), 3);
    }
}

// === Custom Parser Tests ===

mod custom_parsers {
    use super::*;

    struct PropsParser;

    impl DocumentParser for PropsParser {
        fn name(&self) -> &'static str {
            "props"
        }

        fn can_parse(&self, path: &Path) -> bool {
            path.extension().map_or(false, |ext| ext == "props")
        }

        fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Value, LoadError> {
            let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let mut object = serde_json::Map::new();
            for line in text.lines().filter(|line| !line.trim().is_empty()) {
                let (key, value) = line.split_once('=').ok_or_else(|| LoadError::Parse {
                    path: path.to_path_buf(),
                    message: format!("expected key=value, got {:?}", line),
                })?;
                object.insert(
                    key.trim().to_string(),
                    Value::String(value.trim().to_string()),
                );
            }
            Ok(Value::Object(object))
        }
    }

    #[test]
    fn registered_dialects_flow_through_the_pipeline() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("service.props"),
            "swagger=2.0\ntitle=Props service\n",
        )
        .unwrap();

        let out = TempDir::new().unwrap();
        let mut options =
            GenerateOptions::new("service.props", out.path().join("gen")).with_cwd(dir.path());
        options.parsers = ParserRegistry::standard().with_parser(Box::new(PropsParser));

        generate(&options, &AnyDecoder, &ManifestLanguage).unwrap();

        let manifest = fs::read_to_string(out.path().join("gen/listing/manifest.txt")).unwrap();
        assert_eq!(manifest, "service.props");
    }

    #[test]
    fn unregistered_extensions_are_unsupported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("service.props"), "swagger=2.0\n").unwrap();

        let out = TempDir::new().unwrap();
        let options =
            GenerateOptions::new("service.props", out.path().join("gen")).with_cwd(dir.path());

        let err = generate(&options, &AnyDecoder, &ManifestLanguage).unwrap_err();

        assert!(matches!(
            err,
            GenerateError::Load(LoadError::UnsupportedFormat { .. })
        ));
        assert_eq!(err.exit_code(), 2);
    }
}
