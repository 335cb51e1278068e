//! Generated output as an in-memory file tree.
//!
//! Generators return one of these instead of touching the disk; the
//! pipeline writes it out in a single pass once generation has succeeded.

use std::fs;
use std::path::Path;

use crate::error::WriteError;

/// A generated artifact: a file with contents, or a directory of further
/// artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTree {
    File { name: String, content: String },
    Directory { name: String, children: Vec<FileTree> },
}

impl FileTree {
    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        FileTree::File {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<FileTree>) -> Self {
        FileTree::Directory {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FileTree::File { name, .. } => name,
            FileTree::Directory { name, .. } => name,
        }
    }
}

/// Write a generated tree under `out_dir`, creating directories as needed
/// and overwriting files that already exist.
///
/// # Errors
///
/// Returns `WriteError` when a directory cannot be created or a file
/// cannot be written.
pub fn write_file_tree(out_dir: &Path, tree: &FileTree) -> Result<(), WriteError> {
    fs::create_dir_all(out_dir).map_err(|source| WriteError::CreateDir {
        path: out_dir.to_path_buf(),
        source,
    })?;
    write_entry(out_dir, tree)
}

fn write_entry(dir: &Path, entry: &FileTree) -> Result<(), WriteError> {
    match entry {
        FileTree::File { name, content } => {
            let path = dir.join(name);
            tracing::debug!(path = %path.display(), bytes = content.len(), "writing file");
            fs::write(&path, content).map_err(|source| WriteError::WriteFile { path, source })
        }
        FileTree::Directory { name, children } => {
            let path = dir.join(name);
            fs::create_dir_all(&path).map_err(|source| WriteError::CreateDir {
                path: path.clone(),
                source,
            })?;
            for child in children {
                write_entry(&path, child)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_a_nested_tree() {
        let out = TempDir::new().unwrap();
        let tree = FileTree::directory(
            "client",
            vec![
                FileTree::file("mod.rs", "pub mod models;\n"),
                FileTree::directory("models", vec![FileTree::file("pet.rs", "pub struct Pet;\n")]),
            ],
        );

        write_file_tree(out.path(), &tree).unwrap();

        let top = fs::read_to_string(out.path().join("client/mod.rs")).unwrap();
        assert_eq!(top, "pub mod models;\n");
        let nested = fs::read_to_string(out.path().join("client/models/pet.rs")).unwrap();
        assert_eq!(nested, "pub struct Pet;\n");
    }

    #[test]
    fn overwrites_existing_files() {
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("api.ts"), "old contents").unwrap();

        let tree = FileTree::file("api.ts", "new contents");
        write_file_tree(out.path(), &tree).unwrap();

        assert_eq!(
            fs::read_to_string(out.path().join("api.ts")).unwrap(),
            "new contents"
        );
    }

    #[test]
    fn creates_a_missing_out_directory() {
        let base = TempDir::new().unwrap();
        let out = base.path().join("deep/out");

        write_file_tree(&out, &FileTree::file("a.txt", "a")).unwrap();
        assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "a");
    }

    #[test]
    fn blocked_directory_is_a_write_error() {
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("taken"), "a plain file").unwrap();

        let tree = FileTree::directory("taken", vec![FileTree::file("x", "y")]);
        let err = write_file_tree(out.path(), &tree).unwrap_err();
        assert!(matches!(err, WriteError::CreateDir { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn names_are_exposed() {
        assert_eq!(FileTree::file("a", "").name(), "a");
        assert_eq!(FileTree::directory("d", vec![]).name(), "d");
    }
}
