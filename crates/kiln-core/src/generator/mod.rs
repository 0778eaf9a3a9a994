//! Generated project model and the file renderer.
//!
//! A [`GeneratedProject`] is an ordered list of [`GeneratedFile`]s with unique, relative,
//! forward-slash paths. Rendering is a pure function of the resolved options, so two
//! renders of the same request produce the same [`fingerprint`](GeneratedProject::fingerprint).

pub mod render;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::RenderError;

pub use render::ProjectRenderer;

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    /// Relative to the project root, `/`-separated.
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// The ordered file set of one generated project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GeneratedProject {
    files: Vec<GeneratedFile>,
}

impl GeneratedProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file, rejecting unsafe paths and duplicates.
    pub fn push(&mut self, file: GeneratedFile) -> Result<(), RenderError> {
        if !is_safe_path(&file.path) {
            return Err(RenderError::InvalidPath(file.path));
        }
        if self.get(&file.path).is_some() {
            return Err(RenderError::PathCollision(file.path));
        }
        self.files.push(file);
        Ok(())
    }

    pub fn extend(&mut self, other: GeneratedProject) -> Result<(), RenderError> {
        for file in other.files {
            self.push(file)?;
        }
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<GeneratedFile> {
        self.files
    }

    /// Hex SHA-256 over every path and content, in order.
    ///
    /// Each part is length-prefixed, so moving bytes between a path and its content
    /// changes the digest.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for file in &self.files {
            for part in [file.path.as_bytes(), file.content.as_bytes()] {
                hasher.update((part.len() as u64).to_be_bytes());
                hasher.update(part);
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Relative, forward-slash separated, no empty or `.`/`..` segments.
fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && !path.contains(':')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_rejects_collision() {
        let mut project = GeneratedProject::new();
        project.push(GeneratedFile::new("aiken.toml", "a")).unwrap();
        let err = project.push(GeneratedFile::new("aiken.toml", "b")).unwrap_err();
        assert_eq!(err, RenderError::PathCollision("aiken.toml".into()));
        assert_eq!(project.len(), 1);
    }

    #[test]
    fn test_push_rejects_unsafe_paths() {
        let mut project = GeneratedProject::new();
        for bad in ["", "/etc/passwd", "lib/../x.ak", "lib\\x.ak", "lib//x.ak", "./x", "C:/x"] {
            assert!(
                matches!(project.push(GeneratedFile::new(bad, "")), Err(RenderError::InvalidPath(_))),
                "{bad}"
            );
        }
        assert!(project.is_empty());
        project.push(GeneratedFile::new(".aikido.toml", "")).unwrap();
    }

    #[test]
    fn test_fingerprint_tracks_content_and_order() {
        let mut a = GeneratedProject::new();
        a.push(GeneratedFile::new("a", "1")).unwrap();
        a.push(GeneratedFile::new("b", "2")).unwrap();

        let mut same = GeneratedProject::new();
        same.push(GeneratedFile::new("a", "1")).unwrap();
        same.push(GeneratedFile::new("b", "2")).unwrap();
        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut swapped = GeneratedProject::new();
        swapped.push(GeneratedFile::new("b", "2")).unwrap();
        swapped.push(GeneratedFile::new("a", "1")).unwrap();
        assert_ne!(a.fingerprint(), swapped.fingerprint());

        let mut shifted = GeneratedProject::new();
        shifted.push(GeneratedFile::new("a1", "")).unwrap();
        shifted.push(GeneratedFile::new("b", "2")).unwrap();
        assert_ne!(a.fingerprint(), shifted.fingerprint());
    }
}
