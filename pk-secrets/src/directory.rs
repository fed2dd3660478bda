//! Directory-to-address expansion.

use crate::address::{AddressSyntaxError, SecretAddress};
use pk_core::PkError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("`{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("path `{}` is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Address(#[from] AddressSyntaxError),
}

impl From<DirectoryError> for PkError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotADirectory(_) | DirectoryError::NonUtf8Path(_) => {
                PkError::Usage(err.to_string())
            }
            DirectoryError::Walk(e) => match e.into_io_error() {
                Some(io) => PkError::Io(io),
                None => PkError::Engine("directory walk hit a filesystem loop".to_string()),
            },
            DirectoryError::Address(e) => e.into(),
        }
    }
}

/// Expand a directory into one address per regular file, recursively.
///
/// Secret paths are relative to `root` and use forward slashes regardless of
/// the host path convention. Symlinks are not followed.
pub fn expand_directory(
    root: &Path,
    vault_name: &str,
) -> Result<Vec<SecretAddress>, DirectoryError> {
    if !root.is_dir() {
        return Err(DirectoryError::NotADirectory(root.to_path_buf()));
    }

    let mut addresses = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative,
            // Every entry of a walk rooted at `root` sits under it.
            Err(_) => continue,
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component.as_os_str().to_str() {
                Some(segment) => segments.push(segment),
                None => return Err(DirectoryError::NonUtf8Path(entry.path().to_path_buf())),
            }
        }
        addresses.push(SecretAddress::new(vault_name, segments.join("/"))?);
    }

    debug!(
        count = addresses.len(),
        root = %root.display(),
        "expanded directory into secret addresses"
    );
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("should create parent dirs");
        }
        fs::write(path, content).expect("should write file");
    }

    #[test]
    fn flat_directory_yields_one_address_per_file() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        for name in ["secret-1", "secret-2", "secret-3"] {
            touch(&temp_dir.path().join(name), name);
        }

        let mut paths: Vec<String> = expand_directory(temp_dir.path(), "V")
            .expect("should expand")
            .iter()
            .map(|a| format!("{a}"))
            .collect();
        paths.sort();

        assert_eq!(paths, ["V:secret-1", "V:secret-2", "V:secret-3"]);
    }

    #[test]
    fn nested_files_keep_relative_forward_slash_paths() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        touch(&temp_dir.path().join("a").join("b").join("deep"), "x");
        touch(&temp_dir.path().join("top"), "y");

        let addresses = expand_directory(temp_dir.path(), "V").expect("should expand");
        let mut paths: Vec<&str> = addresses.iter().map(|a| a.secret_path()).collect();
        paths.sort();

        assert_eq!(paths, ["a/b/deep", "top"]);
        assert!(addresses.iter().all(|a| a.env_var_name().is_none()));
        assert!(addresses.iter().all(|a| a.vault_name() == "V"));
    }

    #[test]
    fn directories_themselves_are_not_addresses() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        fs::create_dir(temp_dir.path().join("empty")).expect("should create subdir");
        touch(&temp_dir.path().join("file"), "x");

        let addresses = expand_directory(temp_dir.path(), "V").expect("should expand");
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].secret_path(), "file");
    }

    #[test]
    fn non_directory_input_is_rejected() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let file = temp_dir.path().join("file");
        touch(&file, "x");

        assert!(matches!(
            expand_directory(&file, "V"),
            Err(DirectoryError::NotADirectory(_))
        ));
        assert!(matches!(
            expand_directory(&temp_dir.path().join("missing"), "V"),
            Err(DirectoryError::NotADirectory(_))
        ));
    }

    #[test]
    fn expansion_has_no_duplicates() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        for i in 0..20 {
            touch(&temp_dir.path().join(format!("s{i}")), "x");
        }

        let addresses = expand_directory(temp_dir.path(), "V").expect("should expand");
        let mut paths: Vec<&str> = addresses.iter().map(|a| a.secret_path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 20);
    }
}
