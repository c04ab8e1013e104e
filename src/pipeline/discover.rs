//! Input discovery: find every PDF beneath the input root and load it.
//!
//! Discovery is recursive and matches the `pdf` extension case-insensitively.
//! Symlinked directories are not descended into; symlinked files are listed.
//! Only the root must be readable: a subdirectory that cannot be listed is
//! logged and skipped. Results are sorted by path so two runs over the same
//! tree visit documents in the same order. Loading checks the `%PDF` magic bytes before pdfium
//! ever sees the file, so a stray renamed JPEG fails with a readable error.

use crate::error::{ConversionError, PipelineError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A discovered source document, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    /// File stem, used to name artifacts.
    pub id: String,
    pub path: PathBuf,
}

/// A document with its bytes loaded.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl Document {
    /// Build a document from bytes already in memory.
    pub fn from_bytes(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        let id = id.into();
        Self {
            path: PathBuf::from(format!("{id}.pdf")),
            id,
            bytes,
        }
    }
}

/// Recursively collect `.pdf` files under `root`, sorted by path.
pub fn discover_documents(root: &Path) -> Result<Vec<DocumentSource>, PipelineError> {
    if !root.is_dir() {
        return Err(PipelineError::InputNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if dir.as_path() == root => {
                return Err(PipelineError::DiscoveryFailed {
                    path: dir,
                    source: e,
                })
            }
            Err(e) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
        };
        for entry in entries {
            let (path, file_type) = match entry.and_then(|e| Ok((e.path(), e.file_type()?))) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_symlink() {
                if path.is_file() && has_pdf_extension(&path) {
                    found.push(path);
                } else {
                    debug!("Not following symlink {}", path.display());
                }
            } else if has_pdf_extension(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    debug!("Discovered {} PDF files under {}", found.len(), root.display());

    Ok(found
        .into_iter()
        .map(|path| DocumentSource {
            id: document_id(&path),
            path,
        })
        .collect())
}

/// Read a discovered document and verify its magic bytes.
pub async fn load_document(source: &DocumentSource) -> Result<Document, ConversionError> {
    let bytes = tokio::fs::read(&source.path)
        .await
        .map_err(|e| ConversionError::Unreadable {
            document: source.id.clone(),
            detail: e.to_string(),
        })?;

    if !bytes.starts_with(b"%PDF") {
        return Err(ConversionError::NotAPdf {
            document: source.id.clone(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }

    Ok(Document {
        id: source.id.clone(),
        path: source.path.clone(),
        bytes,
    })
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// The file name without its final extension.
fn document_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn finds_pdfs_recursively_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.pdf"), b"%PDF-1.7");
        touch(&dir.path().join("fraktur/A.PDF"), b"%PDF-1.4");
        touch(&dir.path().join("fraktur/deep/c.Pdf"), b"%PDF-1.4");
        touch(&dir.path().join("notes.txt"), b"hello");
        touch(&dir.path().join("scan.pdf.bak"), b"%PDF-1.4");

        let docs = discover_documents(dir.path()).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "A", "c"]);
    }

    #[test]
    fn discovery_order_is_sorted_by_path() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.pdf", "m.pdf", "a.pdf"] {
            touch(&dir.path().join(name), b"%PDF");
        }
        let docs = discover_documents(dir.path()).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = discover_documents(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("sub/a.pdf"), b"%PDF");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

        let docs = discover_documents(dir.path()).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_pdf_files_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        touch(&elsewhere.path().join("real.pdf"), b"%PDF");
        std::os::unix::fs::symlink(
            elsewhere.path().join("real.pdf"),
            dir.path().join("linked.pdf"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            elsewhere.path().join("gone.pdf"),
            dir.path().join("dangling.pdf"),
        )
        .unwrap();

        let docs = discover_documents(dir.path()).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["linked"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.pdf"), b"%PDF");
        touch(&dir.path().join("locked/b.pdf"), b"%PDF");
        touch(&dir.path().join("open/c.pdf"), b"%PDF");
        let locked = dir.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through mode 000.
        let readable = std::fs::read_dir(&locked).is_ok();
        let result = discover_documents(dir.path());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let docs = result.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        if readable {
            assert_eq!(ids, vec!["a", "b", "c"]);
        } else {
            assert_eq!(ids, vec!["a", "c"]);
        }
    }

    #[test]
    fn id_keeps_inner_dots() {
        assert_eq!(document_id(Path::new("/x/Flugblatt.1919.05.pdf")), "Flugblatt.1919.05");
    }

    #[tokio::test]
    async fn load_rejects_non_pdf_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        touch(&path, b"\x89PNG\r\n");
        let source = DocumentSource {
            id: "fake".into(),
            path,
        };
        let err = load_document(&source).await.unwrap_err();
        assert!(matches!(err, ConversionError::NotAPdf { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn load_reports_unreadable_file() {
        let source = DocumentSource {
            id: "gone".into(),
            path: PathBuf::from("/definitely/not/here/gone.pdf"),
        };
        let err = load_document(&source).await.unwrap_err();
        assert!(matches!(err, ConversionError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn load_accepts_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        touch(&path, b"%PDF-1.7\n%%EOF");
        let doc = load_document(&DocumentSource {
            id: "ok".into(),
            path,
        })
        .await
        .unwrap();
        assert_eq!(doc.id, "ok");
        assert!(doc.bytes.starts_with(b"%PDF"));
    }
}
