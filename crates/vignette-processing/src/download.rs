//! Two-phase save hook for download records.
//!
//! A download is saved twice. The first save records the file size. The second
//! attaches a preview, and only runs when previews are wanted and none exists yet.
//! Both phases return updated record values; persisting them is the caller's job.

use crate::error::PreviewError;
use crate::orchestrator::PreviewOrchestrator;
use vignette_core::{Download, ErrorMetadata, PreviewRequest, SourceFile};

/// Result of the preview phase of a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub download: Download,
    /// True when `download.preview` changed and the record must be saved again.
    pub preview_created: bool,
}

impl SaveOutcome {
    fn unchanged(download: Download) -> Self {
        Self {
            download,
            preview_created: false,
        }
    }
}

/// First save phase: record the current size of the attached file.
pub async fn prepare_download(
    mut download: Download,
    source: &dyn SourceFile,
) -> Result<Download, PreviewError> {
    let size = source
        .size()
        .await
        .map_err(|e| PreviewError::Materialize {
            name: source.name().to_string(),
            source: e,
        })?;

    download.file.size = size;
    download.file_size = size;
    Ok(download)
}

/// Second save phase: generate and attach a preview if one is wanted.
#[tracing::instrument(skip_all, fields(download_id = %download.id))]
pub async fn attach_preview(
    orchestrator: &PreviewOrchestrator,
    download: Download,
    source: &dyn SourceFile,
) -> Result<SaveOutcome, PreviewError> {
    run(orchestrator, download, PreviewRequest::new(source)).await
}

/// Replace the preview of `download` with a freshly generated one.
///
/// The previous asset is not deleted; it stays in the store until the store's own
/// retention removes it.
#[tracing::instrument(skip_all, fields(download_id = %download.id))]
pub async fn regenerate_preview(
    orchestrator: &PreviewOrchestrator,
    download: Download,
    source: &dyn SourceFile,
) -> Result<SaveOutcome, PreviewError> {
    run(orchestrator, download, PreviewRequest::new(source).regenerate(true)).await
}

async fn run(
    orchestrator: &PreviewOrchestrator,
    mut download: Download,
    request: PreviewRequest<'_>,
) -> Result<SaveOutcome, PreviewError> {
    let generated = orchestrator
        .generate(request, download.preview.as_ref(), download.show_preview)
        .await;

    match generated {
        Ok(Some(derived)) => {
            tracing::info!(
                asset_id = %derived.asset.id,
                filename = %derived.filename,
                "Attached preview to download"
            );
            download.preview = Some(derived.asset);
            Ok(SaveOutcome {
                download,
                preview_created: true,
            })
        }
        Ok(None) => Ok(SaveOutcome::unchanged(download)),
        Err(err) => {
            err.log_level().emit(
                err.error_code(),
                &format!(
                    "Preview generation failed for {}: {}",
                    download.caption_or_basename(),
                    err
                ),
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::PreviewConverter;
    use crate::error::FaultKind;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::path::Path;
    use std::sync::Arc;
    use vignette_core::{FileRef, InMemorySourceFile, PreviewResult};
    use vignette_storage::InMemoryAssetStore;

    struct StaticConverter(Option<&'static [u8]>);

    #[async_trait]
    impl PreviewConverter for StaticConverter {
        async fn convert(
            &self,
            _input: &Path,
            output_basename: &str,
        ) -> Result<PreviewResult, PreviewError> {
            Ok(match self.0 {
                Some(bytes) => PreviewResult::Success {
                    image: Bytes::from_static(bytes),
                    filename: output_basename.to_string(),
                },
                None => PreviewResult::NotApplicable,
            })
        }
    }

    struct Fixture {
        _scratch: tempfile::TempDir,
        store: Arc<InMemoryAssetStore>,
        orchestrator: PreviewOrchestrator,
    }

    fn fixture(output: Option<&'static [u8]>) -> Fixture {
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryAssetStore::new());
        let orchestrator =
            PreviewOrchestrator::new(Arc::new(StaticConverter(output)), store.clone(), scratch.path());
        Fixture {
            _scratch: scratch,
            store,
            orchestrator,
        }
    }

    fn source() -> InMemorySourceFile {
        InMemorySourceFile::new("filer_public/ab/report.pdf", &b"%PDF-1.4 content"[..])
    }

    fn download() -> Download {
        Download::new(FileRef {
            name: "filer_public/ab/report.pdf".to_string(),
            original_name: "report.pdf".to_string(),
            size: 0,
        })
    }

    #[tokio::test]
    async fn prepare_records_file_size() {
        let prepared = prepare_download(download(), &source()).await.unwrap();
        assert_eq!(prepared.file_size, 16);
        assert_eq!(prepared.file.size, 16);
        assert!(prepared.preview.is_none());
    }

    #[tokio::test]
    async fn attaches_preview_on_first_save() {
        let f = fixture(Some(b"jpeg"));

        let outcome = attach_preview(&f.orchestrator, download(), &source())
            .await
            .unwrap();

        assert!(outcome.preview_created);
        let preview = outcome.download.preview.expect("preview attached");
        assert_eq!(preview.filename, "report.pdf.jpg");
        assert_eq!(f.store.asset_count(), 1);
    }

    #[tokio::test]
    async fn later_saves_do_not_regenerate() {
        let f = fixture(Some(b"jpeg"));

        let first = attach_preview(&f.orchestrator, download(), &source())
            .await
            .unwrap();
        let second = attach_preview(&f.orchestrator, first.download.clone(), &source())
            .await
            .unwrap();

        assert!(!second.preview_created);
        assert_eq!(second.download, first.download);
        assert_eq!(f.store.asset_count(), 1);
    }

    #[tokio::test]
    async fn hidden_preview_is_never_generated() {
        let f = fixture(Some(b"jpeg"));
        let mut hidden = download();
        hidden.show_preview = false;

        let outcome = attach_preview(&f.orchestrator, hidden.clone(), &source())
            .await
            .unwrap();

        assert!(!outcome.preview_created);
        assert_eq!(outcome.download, hidden);
        assert_eq!(f.store.asset_count(), 0);
    }

    #[tokio::test]
    async fn declined_conversion_leaves_record_unchanged() {
        let f = fixture(None);

        let outcome = attach_preview(&f.orchestrator, download(), &source())
            .await
            .unwrap();

        assert!(!outcome.preview_created);
        assert!(outcome.download.preview.is_none());
    }

    #[tokio::test]
    async fn regeneration_swaps_in_a_new_asset() {
        let f = fixture(Some(b"jpeg"));

        let first = attach_preview(&f.orchestrator, download(), &source())
            .await
            .unwrap();
        let old = first.download.preview.clone().unwrap();

        let regenerated = regenerate_preview(&f.orchestrator, first.download, &source())
            .await
            .unwrap();

        assert!(regenerated.preview_created);
        let new = regenerated.download.preview.unwrap();
        assert_ne!(new.id, old.id);
        assert_eq!(new.collection_id, old.collection_id);
        assert_eq!(f.store.asset_count(), 2);
    }

    #[tokio::test]
    async fn storage_fault_leaves_record_retryable() {
        let f = fixture(Some(b"jpeg"));
        f.store.fail_uploads(true);

        let err = attach_preview(&f.orchestrator, download(), &source())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FaultKind::Storage);

        f.store.fail_uploads(false);
        let retried = attach_preview(&f.orchestrator, download(), &source())
            .await
            .unwrap();
        assert!(retried.preview_created);
    }
}
