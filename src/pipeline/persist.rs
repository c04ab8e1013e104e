//! Artifact persistence: one file per successful page.
//!
//! Artifacts land flat in the output directory as
//! `{document}_page_{n}.{txt|json}`. Existing files are overwritten; a rerun
//! replaces rather than accumulates. Each write goes to a sibling `.tmp` file
//! first and is renamed into place, so an interrupted run never leaves a
//! half-written artifact behind.

use crate::config::PipelineKind;
use crate::error::{PageError, PipelineError};
use crate::output::PageArtifact;
use crate::pipeline::normalize::ArtifactContent;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes artifacts for one batch.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    kind: PipelineKind,
}

impl ArtifactWriter {
    /// Create the output directory (and parents) and return a writer for it.
    pub async fn create(
        output_dir: impl Into<PathBuf>,
        kind: PipelineKind,
    ) -> Result<Self, PipelineError> {
        let output_dir = output_dir.into();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| PipelineError::OutputDirFailed {
                path: output_dir.clone(),
                source: e,
            })?;
        Ok(Self { output_dir, kind })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `{output_dir}/{document}_page_{page}.{ext}`
    pub fn artifact_path(&self, document: &str, page: usize) -> PathBuf {
        self.output_dir
            .join(format!("{document}_page_{page}.{}", self.kind.extension()))
    }

    /// Write one page's artifact atomically.
    pub async fn write(
        &self,
        document: &str,
        page: usize,
        content: &ArtifactContent,
    ) -> Result<PageArtifact, PageError> {
        let path = self.artifact_path(document, page);
        let write_failed = |detail: String| PageError::WriteFailed {
            path: path.clone(),
            detail,
        };

        let bytes = content.to_bytes().map_err(|e| write_failed(e.to_string()))?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| write_failed(e.to_string()))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_failed(e.to_string()));
        }

        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(PageArtifact {
            path,
            fallback: content.is_fallback(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityAnnotations, ParseFailureRecord};

    #[tokio::test]
    async fn creates_nested_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("answers/run1");
        let writer = ArtifactWriter::create(&out, PipelineKind::Transcribe)
            .await
            .unwrap();
        assert!(writer.output_dir().is_dir());
    }

    #[tokio::test]
    async fn uncreatable_output_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let err = ArtifactWriter::create(blocker.join("sub"), PipelineKind::Transcribe)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::OutputDirFailed { .. }));
    }

    #[test]
    fn path_follows_naming_scheme() {
        let writer = ArtifactWriter {
            output_dir: PathBuf::from("/out"),
            kind: PipelineKind::ExtractEntities,
        };
        assert_eq!(
            writer.artifact_path("Flugblatt.1919", 12),
            PathBuf::from("/out/Flugblatt.1919_page_12.json")
        );
    }

    #[tokio::test]
    async fn overwrites_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::create(dir.path(), PipelineKind::Transcribe)
            .await
            .unwrap();

        writer
            .write("doc", 1, &ArtifactContent::Text("first run".into()))
            .await
            .unwrap();
        let artifact = writer
            .write("doc", 1, &ArtifactContent::Text("second".into()))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), "second");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["doc_page_1.txt"]);
    }

    #[tokio::test]
    async fn fallback_record_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::create(dir.path(), PipelineKind::ExtractEntities)
            .await
            .unwrap();

        let ok = writer
            .write("doc", 1, &ArtifactContent::Entities(EntityAnnotations::default()))
            .await
            .unwrap();
        let fallback = writer
            .write(
                "doc",
                2,
                &ArtifactContent::ParseFailure(ParseFailureRecord {
                    error: "bad".into(),
                    raw_text: "nope".into(),
                }),
            )
            .await
            .unwrap();

        assert!(!ok.fallback);
        assert!(fallback.fallback);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&fallback.path).unwrap()).unwrap();
        assert_eq!(json["raw_text"], "nope");
    }
}
