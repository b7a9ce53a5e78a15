use bytes::Bytes;

use crate::constants::PREVIEW_EXTENSION;
use crate::models::source::SourceFile;

/// One request to produce a preview for a source file.
pub struct PreviewRequest<'a> {
    pub source: &'a dyn SourceFile,
    /// File name the stored preview will carry, `<original-name>.jpg`.
    pub output_basename: String,
    /// Replace an existing preview instead of leaving it alone.
    pub regenerate: bool,
}

impl<'a> PreviewRequest<'a> {
    pub fn new(source: &'a dyn SourceFile) -> Self {
        Self {
            output_basename: preview_filename(source.original_name()),
            source,
            regenerate: false,
        }
    }

    pub fn regenerate(mut self, regenerate: bool) -> Self {
        self.regenerate = regenerate;
        self
    }
}

impl std::fmt::Debug for PreviewRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRequest")
            .field("source", &self.source.name())
            .field("output_basename", &self.output_basename)
            .field("regenerate", &self.regenerate)
            .finish()
    }
}

/// File name of the preview for a source uploaded as `original_name`.
pub fn preview_filename(original_name: &str) -> String {
    format!("{}.{}", original_name, PREVIEW_EXTENSION)
}

/// Outcome of running a conversion tool.
///
/// A tool declining to produce an image is a normal outcome, not an error.
/// Infrastructure failures travel separately as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewResult {
    Success { image: Bytes, filename: String },
    NotApplicable,
}
