//! Preview orchestration: gate → materialize → convert → store.

use crate::converter::{ExternalConverter, PreviewConverter};
use crate::error::PreviewError;
use crate::tools::warn_missing_tools;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use vignette_core::constants::PREVIEW_COLLECTION_NAME;
use vignette_core::models::extension_of;
use vignette_core::{
    AssetRef, DerivedAsset, PreviewConfig, PreviewRequest, PreviewResult, SourceFile,
};
use vignette_storage::AssetStore;

/// Produces and stores previews for source files.
///
/// Holds no per-call state. Every invocation owns its own scratch file and
/// directory, so one orchestrator can serve concurrent saves.
pub struct PreviewOrchestrator {
    converter: Arc<dyn PreviewConverter>,
    store: Arc<dyn AssetStore>,
    temp_root: PathBuf,
}

impl PreviewOrchestrator {
    pub fn new(
        converter: Arc<dyn PreviewConverter>,
        store: Arc<dyn AssetStore>,
        temp_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            converter,
            store,
            temp_root: temp_root.into(),
        }
    }

    /// Build an orchestrator around the external tools named in `config`.
    pub fn from_config(
        config: &PreviewConfig,
        store: Arc<dyn AssetStore>,
    ) -> Result<Self, PreviewError> {
        let converter = ExternalConverter::new(config)?;
        warn_missing_tools(config);
        Ok(Self::new(Arc::new(converter), store, config.temp_root()))
    }

    /// Generate a preview unless one is unwanted or already exists.
    ///
    /// Returns `Ok(None)` when nothing was generated: previews are switched off,
    /// one exists already, or the tool could not render the file.
    pub async fn maybe_generate_preview(
        &self,
        source: &dyn SourceFile,
        existing_preview: Option<&AssetRef>,
        show_preview: bool,
    ) -> Result<Option<DerivedAsset>, PreviewError> {
        self.generate(PreviewRequest::new(source), existing_preview, show_preview)
            .await
    }

    #[tracing::instrument(
        skip_all,
        fields(
            source = %request.source.name(),
            regenerate = request.regenerate,
            has_preview = existing_preview.is_some(),
        )
    )]
    pub async fn generate(
        &self,
        request: PreviewRequest<'_>,
        existing_preview: Option<&AssetRef>,
        show_preview: bool,
    ) -> Result<Option<DerivedAsset>, PreviewError> {
        if !show_preview {
            tracing::debug!("Previews disabled for this file");
            return Ok(None);
        }
        if existing_preview.is_some() && !request.regenerate {
            tracing::debug!("Preview already exists");
            return Ok(None);
        }

        let staged = self.materialize(request.source).await?;
        let result = self
            .converter
            .convert(staged.path(), &request.output_basename)
            .await?;
        drop(staged);

        match result {
            PreviewResult::Success { image, filename } => {
                let collection = self
                    .store
                    .get_or_create_collection(PREVIEW_COLLECTION_NAME)
                    .await?;
                let asset = self
                    .store
                    .create_asset(image.clone(), &filename, &collection)
                    .await?;

                tracing::info!(
                    asset_id = %asset.id,
                    collection = %collection.name,
                    filename = %filename,
                    size_bytes = image.len(),
                    "Stored preview"
                );

                Ok(Some(DerivedAsset {
                    asset,
                    collection,
                    filename,
                    bytes: image,
                }))
            }
            PreviewResult::NotApplicable => {
                tracing::debug!("No preview available for this file");
                Ok(None)
            }
        }
    }

    /// Copy the source into a private scratch file that keeps its extension.
    async fn materialize(&self, source: &dyn SourceFile) -> Result<NamedTempFile, PreviewError> {
        let suffix = extension_of(source.name())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let staged = tempfile::Builder::new()
            .prefix("vignette-source-")
            .suffix(&suffix)
            .tempfile_in(&self.temp_root)
            .map_err(|e| PreviewError::TempResource {
                what: "file",
                source: e,
            })?;

        let handle = staged.reopen().map_err(|e| PreviewError::TempResource {
            what: "file",
            source: e,
        })?;

        let copy_error = |e: std::io::Error| PreviewError::Materialize {
            name: source.name().to_string(),
            source: e,
        };

        let mut reader = source.open().await.map_err(copy_error)?;
        let mut file = tokio::fs::File::from_std(handle);
        let copied = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(copy_error)?;
        file.flush().await.map_err(copy_error)?;

        tracing::debug!(
            path = %staged.path().display(),
            size_bytes = copied,
            "Materialized source file"
        );

        Ok(staged)
    }
}
