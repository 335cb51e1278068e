//! Error types for document loading, decoding, resolution, and generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading the transitive document closure.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("no registered parser for {path}")]
    UnsupportedFormat { path: PathBuf },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::Read { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::Network { .. } => 3,
            LoadError::Parse { .. } | LoadError::UnsupportedFormat { .. } => 2,
        }
    }
}

/// Errors during single-hop reference resolution.
///
/// Deep lookup absorbs these into "no match"; they surface only when a
/// caller resolves a specific reference and needs to know why it failed.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("missing reference target: {reference}")]
    MissingReference { reference: String },

    #[error("reference {reference} resolved, but the target {report}")]
    Mismatch {
        reference: String,
        report: DecodeReport,
    },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::MissingReference { .. } => 2,
            ResolveError::Mismatch { .. } => 1,
        }
    }
}

/// Errors while writing a generated file tree.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        3
    }
}

/// Errors from the generation pipeline. Any variant aborts the run before
/// output is written.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("document {document} {report}")]
    Decode {
        document: String,
        report: DecodeReport,
    },

    #[error("code generation failed: {source}")]
    Language {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerateError::Load(e) => e.exit_code(),
            GenerateError::Decode { .. } => 1,
            GenerateError::Language { .. } => 2,
            GenerateError::Write(e) => e.exit_code(),
        }
    }
}

/// Single decode violation with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecodeIssue {
    /// JSON Pointer (RFC 6901) to the invalid node.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for DecodeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Full report of a failed decode: every violation, not just the first.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecodeReport {
    /// Name of the decoder the value was checked against.
    pub decoder: String,
    /// All path-qualified violations.
    pub issues: Vec<DecodeIssue>,
}

impl DecodeReport {
    pub fn new(decoder: impl Into<String>, issues: Vec<DecodeIssue>) -> Self {
        DecodeReport {
            decoder: decoder.into(),
            issues,
        }
    }

    /// Report with a single violation.
    pub fn single(
        decoder: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DecodeReport::new(
            decoder,
            vec![DecodeIssue {
                path: path.into(),
                message: message.into(),
            }],
        )
    }
}

impl std::fmt::Display for DecodeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "does not decode as {} ({} issue(s))",
            self.decoder,
            self.issues.len()
        )?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeReport {}
