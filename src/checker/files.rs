use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::DEFAULT_MAX_FILE_BYTES;
use crate::error::{FraudCheckError, Result};

/// Lists the files a detector should scan.
pub trait FileLister: Send + Sync {
    /// Absolute paths under `root` matching any of `globs` and none of `excludes`.
    fn list(&self, root: &Path, globs: &[String], excludes: &[String]) -> Result<Vec<PathBuf>>;
}

pub trait FileReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String>;
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| FraudCheckError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| FraudCheckError::InvalidGlob {
        pattern: patterns.join(","),
        source,
    })
}

/// Recursive directory walk filtered through `globset`.
#[derive(Debug, Clone, Copy)]
pub struct GlobFileLister {
    max_depth: usize,
}

impl Default for GlobFileLister {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

impl GlobFileLister {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    fn walk(
        &self,
        root: &Path,
        dir: &Path,
        depth: usize,
        include: &GlobSet,
        exclude: &GlobSet,
        out: &mut Vec<PathBuf>,
    ) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                // `dir/**` excludes only match paths below the directory
                if exclude.is_match(rel) || exclude.is_match(rel.join("_")) {
                    continue;
                }
                if depth + 1 >= self.max_depth {
                    tracing::debug!(dir = %path.display(), "maximum walk depth reached");
                    continue;
                }
                if let Err(e) = self.walk(root, &path, depth + 1, include, exclude, out) {
                    tracing::warn!(dir = %path.display(), error = %e, "skipping unreadable directory");
                }
            } else if file_type.is_file() && include.is_match(rel) && !exclude.is_match(rel) {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl FileLister for GlobFileLister {
    fn list(&self, root: &Path, globs: &[String], excludes: &[String]) -> Result<Vec<PathBuf>> {
        let include = build_globset(globs)?;
        let exclude = build_globset(excludes)?;
        let listing_error = |source| FraudCheckError::Listing {
            root: root.to_path_buf(),
            source,
        };
        let root = root.canonicalize().map_err(listing_error)?;

        let mut files = Vec::new();
        self.walk(&root, &root, 0, &include, &exclude, &mut files)
            .map_err(listing_error)?;
        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Reads UTF-8 files no larger than the configured limit.
#[derive(Debug, Clone, Copy)]
pub struct FsFileReader {
    max_bytes: u64,
}

impl Default for FsFileReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl FsFileReader {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl FileReader for FsFileReader {
    fn read(&self, path: &Path) -> Result<String> {
        let read_error = |source| FraudCheckError::FileRead {
            path: path.to_path_buf(),
            source,
        };
        let size = std::fs::metadata(path).map_err(read_error)?.len();
        if size > self.max_bytes {
            return Err(FraudCheckError::FileTooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_bytes,
            });
        }
        std::fs::read_to_string(path).map_err(read_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lists_matching_files_and_prunes_excludes() {
        let td = tempfile::tempdir().unwrap();
        let root = td.path();
        std::fs::create_dir_all(root.join("tests/system")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("tests/system/flow.ts"), "").unwrap();
        std::fs::write(root.join("app.stest.ts"), "").unwrap();
        std::fs::write(root.join("app.utest.ts"), "").unwrap();
        std::fs::write(root.join("node_modules/pkg/x.stest.ts"), "").unwrap();

        let files = GlobFileLister::default()
            .list(
                root,
                &strings(&["**/*.stest.{ts,js}", "**/tests/system/**/*.{ts,js}"]),
                &strings(&["**/node_modules/**"]),
            )
            .unwrap();
        let rel: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(rel, vec!["app.stest.ts", "flow.ts"]);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = build_globset(&strings(&["a/{b"])).unwrap_err();
        assert!(matches!(err, FraudCheckError::InvalidGlob { .. }));
    }

    #[test]
    fn reader_enforces_size_limit() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("big.utest.ts");
        std::fs::write(&path, "x".repeat(64)).unwrap();
        assert!(matches!(
            FsFileReader::new(16).read(&path),
            Err(FraudCheckError::FileTooLarge { size: 64, limit: 16, .. })
        ));
        assert_eq!(FsFileReader::default().read(&path).unwrap().len(), 64);
        assert!(matches!(
            FsFileReader::default().read(&td.path().join("missing.ts")),
            Err(FraudCheckError::FileRead { .. })
        ));
    }
}
