//! Document discovery and text extraction.
//!
//! [`DirectoryLoader`] walks a source directory recursively, keeps files
//! matching a glob pattern, and extracts their text with bounded parallelism.
//! PDF parsing is blocking work and runs on the blocking pool; everything
//! else is read as UTF-8 text.
//!
//! Per-file failures are isolated: a corrupt file is skipped, logged, and
//! counted, never aborting the rest of the batch. Use
//! [`DirectoryLoader::load_strict`] to abort on the first failure instead.
//! Result ordering is not guaranteed and must not be relied upon downstream.

mod pdf;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use walkdir::WalkDir;

use crate::config::{DEFAULT_GLOB, DEFAULT_MAX_CONCURRENCY};
use crate::types::IngestError;

/// One source document: extracted text plus provenance metadata.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
    pub metadata: serde_json::Value,
}

/// A file whose extraction failed and was skipped.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl LoadFailure {
    fn new(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            path,
            reason: reason.into(),
        }
    }
}

/// Everything a load pass produced: the documents plus the skipped files.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<SourceDocument>,
    pub failures: Vec<LoadFailure>,
}

/// Recursive, bounded-parallel document loader.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
    glob: String,
    max_concurrency: usize,
    show_progress: bool,
}

impl DirectoryLoader {
    /// Creates a loader rooted at `root` with the default pattern
    /// (`**/*.pdf`) and concurrency cap.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            glob: DEFAULT_GLOB.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            show_progress: true,
        }
    }

    /// Sets the file pattern (`**/*.pdf` style, see [`glob_matches`]).
    #[must_use]
    pub fn with_glob(mut self, pattern: impl Into<String>) -> Self {
        self.glob = pattern.into();
        self
    }

    /// Caps the number of simultaneously running extraction tasks.
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Toggles per-file progress events (INFO level). The discovery and
    /// completion summaries are always emitted.
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Loads every matching file, skipping files whose extraction fails.
    pub async fn load(&self) -> Result<LoadOutcome, IngestError> {
        let files = self.matching_files()?;
        let total = files.len();
        tracing::info!(
            root = %self.root.display(),
            pattern = %self.glob,
            files = total,
            "discovered source files"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for path in files {
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return Err(LoadFailure::new(path, "loader semaphore closed")),
                };
                load_one(path).await
            });
        }

        let mut outcome = LoadOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(document)) => {
                    if self.show_progress {
                        tracing::info!(
                            path = %document.path.display(),
                            bytes = document.text.len(),
                            completed = outcome.documents.len() + outcome.failures.len() + 1,
                            total,
                            "loaded document"
                        );
                    }
                    outcome.documents.push(document);
                }
                Ok(Err(failure)) => {
                    tracing::warn!(
                        path = %failure.path.display(),
                        reason = %failure.reason,
                        "skipping file after extraction failure"
                    );
                    outcome.failures.push(failure);
                }
                Err(err) => {
                    return Err(IngestError::Extraction {
                        path: self.root.clone(),
                        reason: format!("loader task panicked: {err}"),
                    });
                }
            }
        }

        tracing::info!(
            loaded = outcome.documents.len(),
            skipped = outcome.failures.len(),
            "document loading complete"
        );
        Ok(outcome)
    }

    /// Loads every matching file, aborting on the first extraction failure.
    pub async fn load_strict(&self) -> Result<Vec<SourceDocument>, IngestError> {
        let outcome = self.load().await?;
        if let Some(failure) = outcome.failures.into_iter().next() {
            return Err(IngestError::Extraction {
                path: failure.path,
                reason: failure.reason,
            });
        }
        Ok(outcome.documents)
    }

    fn matching_files(&self) -> Result<Vec<PathBuf>, IngestError> {
        if !self.root.is_dir() {
            return Err(IngestError::DirectoryNotFound(self.root.clone()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
        {
            if glob_matches(&self.glob, entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

async fn load_one(path: PathBuf) -> Result<SourceDocument, LoadFailure> {
    let is_pdf = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        let worker_path = path.clone();
        match tokio::task::spawn_blocking(move || pdf::extract_pdf_text(&worker_path)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => return Err(LoadFailure::new(path, err.to_string())),
            Err(err) => {
                return Err(LoadFailure::new(
                    path,
                    format!("extraction task panicked: {err}"),
                ));
            }
        }
    } else {
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) => return Err(LoadFailure::new(path, err.to_string())),
        }
    };

    let metadata = serde_json::json!({
        "source": path.display().to_string(),
        "file_name": path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or_default(),
    });

    Ok(SourceDocument {
        path,
        text,
        metadata,
    })
}

/// Matches the `**/*.ext` pattern family used throughout this pipeline:
/// a trailing `*.ext` matches on file extension (case-insensitive), a bare
/// `*` or `**` matches every file, and anything else matches by exact file
/// name. Directory components before the final `/` are ignored because the
/// walk is always recursive.
fn glob_matches(pattern: &str, path: &Path) -> bool {
    let file_part = pattern.rsplit('/').next().unwrap_or(pattern);
    match file_part.strip_prefix("*.") {
        Some(ext) => path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|found| found.eq_ignore_ascii_case(ext)),
        None if file_part == "*" || file_part == "**" => true,
        None => path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| name == file_part),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn glob_matches_extension_recursively() {
        assert!(glob_matches("**/*.pdf", Path::new("a/b/c/report.pdf")));
        assert!(glob_matches("**/*.pdf", Path::new("REPORT.PDF")));
        assert!(!glob_matches("**/*.pdf", Path::new("a/notes.txt")));
        assert!(glob_matches("*.txt", Path::new("notes.txt")));
        assert!(glob_matches("**/*", Path::new("anything.bin")));
        assert!(glob_matches("README.md", Path::new("docs/README.md")));
        assert!(!glob_matches("README.md", Path::new("docs/CHANGELOG.md")));
    }

    #[tokio::test]
    async fn missing_directory_fails_before_any_work() {
        let loader = DirectoryLoader::new("/definitely/not/a/real/dir");
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, IngestError::DirectoryNotFound(_)));
    }

    #[tokio::test]
    async fn every_matching_file_yields_one_document() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha document").unwrap();
        std::fs::write(nested.join("b.txt"), "beta document").unwrap();
        std::fs::write(dir.path().join("ignored.bin"), "binary").unwrap();

        let loader = DirectoryLoader::new(dir.path()).with_glob("**/*.txt");
        let outcome = loader.load().await.unwrap();

        assert_eq!(outcome.documents.len(), 2);
        assert!(outcome.failures.is_empty());
        for document in &outcome.documents {
            assert!(!document.text.is_empty());
            assert_eq!(
                document.metadata["source"],
                document.path.display().to_string()
            );
        }
    }

    #[tokio::test]
    async fn progress_toggle_does_not_change_the_outcome() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha document").unwrap();
        std::fs::write(dir.path().join("b.txt"), "beta document").unwrap();

        let quiet = DirectoryLoader::new(dir.path())
            .with_glob("**/*.txt")
            .with_progress(false);
        let outcome = quiet.load().await.unwrap();

        assert_eq!(outcome.documents.len(), 2);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "valid text").unwrap();
        // Invalid UTF-8 makes read_to_string fail for this file only.
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let loader = DirectoryLoader::new(dir.path()).with_glob("**/*.txt");
        let outcome = loader.load().await.unwrap();

        assert_eq!(outcome.documents.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].path.ends_with("bad.txt"));
    }

    #[tokio::test]
    async fn strict_mode_aborts_on_first_failure() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "valid text").unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let loader = DirectoryLoader::new(dir.path()).with_glob("**/*.txt");
        let err = loader.load_strict().await.unwrap_err();
        assert!(matches!(err, IngestError::Extraction { .. }));
    }

    #[tokio::test]
    async fn corrupt_pdf_reports_extraction_failure() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();

        let loader = DirectoryLoader::new(dir.path());
        let outcome = loader.load().await.unwrap();

        assert!(outcome.documents.is_empty());
        assert_eq!(outcome.failures.len(), 1);
    }
}
