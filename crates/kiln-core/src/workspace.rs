//! Writing generated projects to disk.
//!
//! The CLI writes into a caller-chosen directory; the verifier materializes into a
//! private temporary directory that disappears with the returned [`TempDir`].
//!
//! Project writes are staged in a hidden sibling directory and renamed into place, so a
//! failed write never leaves a half-populated project behind.

use std::path::Path;

use tempfile::TempDir;

use crate::error::{KilnError, Result};
use crate::generator::GeneratedProject;

/// Fail with [`KilnError::ProjectExists`] when `dir` exists and is not empty.
pub fn ensure_writable(dir: &Path) -> Result<()> {
    if dir.exists() && std::fs::read_dir(dir)?.next().is_some() {
        return Err(KilnError::ProjectExists(dir.to_path_buf()));
    }
    Ok(())
}

/// Write every file of `project` under `dir`.
///
/// `dir` must be absent or empty. The tree is written to a sibling staging directory
/// first and renamed to `dir` once complete.
pub fn write_project(project: &GeneratedProject, dir: &Path) -> Result<()> {
    ensure_writable(dir)?;
    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new().prefix(".kiln-").tempdir_in(parent)?;
    write_files(project, staging.path())?;

    // The staging directory is private to the user; give the project its surroundings' mode.
    let permissions = if dir.exists() {
        let permissions = std::fs::metadata(dir)?.permissions();
        std::fs::remove_dir(dir)?;
        permissions
    } else {
        std::fs::metadata(parent)?.permissions()
    };
    std::fs::rename(staging.path(), dir)?;
    std::fs::set_permissions(dir, permissions)?;
    tracing::debug!(dir = %dir.display(), files = project.len(), "wrote project");
    Ok(())
}

/// Materialize `project` into a fresh temporary directory.
pub fn materialize_temp(project: &GeneratedProject) -> Result<TempDir> {
    let dir = tempfile::Builder::new().prefix("kiln-verify-").tempdir()?;
    write_files(project, dir.path())?;
    tracing::debug!(dir = %dir.path().display(), files = project.len(), "materialized project");
    Ok(dir)
}

fn write_files(project: &GeneratedProject, dir: &Path) -> Result<()> {
    for file in project.files() {
        // Paths were checked on push: relative, `/`-separated, no `..`.
        let path = file
            .path
            .split('/')
            .fold(dir.to_path_buf(), |acc, segment| acc.join(segment));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &file.content)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratedFile;

    fn project() -> GeneratedProject {
        let mut project = GeneratedProject::new();
        project.push(GeneratedFile::new("aiken.toml", "name = \"a/b\"\n")).unwrap();
        project
            .push(GeneratedFile::new("lib/a/b/types.ak", "pub type T {\n  A\n}\n"))
            .unwrap();
        project
    }

    #[test]
    fn test_write_project_creates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("b");
        write_project(&project(), &target).unwrap();
        let types = std::fs::read_to_string(target.join("lib/a/b/types.ak")).unwrap();
        assert!(types.starts_with("pub type T"));
    }

    #[test]
    fn test_write_project_refuses_non_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.txt"), "x").unwrap();
        let err = write_project(&project(), dir.path()).unwrap_err();
        assert!(matches!(err, KilnError::ProjectExists(_)));
        assert!(!dir.path().join("aiken.toml").exists());
    }

    #[test]
    fn test_write_project_into_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_project(&project(), dir.path()).unwrap();
        assert!(dir.path().join("aiken.toml").is_file());
    }

    #[test]
    fn test_write_project_leaves_no_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("b");
        write_project(&project(), &target).unwrap();
        assert!(target.join("aiken.toml").is_file());
        let siblings: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(siblings, vec![std::ffi::OsString::from("b")]);
    }

    #[test]
    fn test_failed_write_leaves_target_absent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("b");
        let mut project = project();
        // A file and a directory at the same path: the second write fails mid-tree.
        project.push(GeneratedFile::new("lib/a", "clash")).unwrap();
        assert!(write_project(&project, &target).is_err());
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_ensure_writable() {
        let dir = tempfile::tempdir().unwrap();
        ensure_writable(&dir.path().join("absent")).unwrap();
        ensure_writable(dir.path()).unwrap();
        std::fs::write(dir.path().join("keep.txt"), "x").unwrap();
        assert!(matches!(
            ensure_writable(dir.path()),
            Err(KilnError::ProjectExists(_))
        ));
    }

    #[test]
    fn test_materialize_temp_cleans_up() {
        let dir = materialize_temp(&project()).unwrap();
        let root = dir.path().to_path_buf();
        assert!(root.join("aiken.toml").is_file());
        drop(dir);
        assert!(!root.exists());
    }
}
