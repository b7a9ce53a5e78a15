use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::asset::AssetRef;
use crate::models::source::basename;

/// The file attached to a download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Stored name, possibly including directories
    pub name: String,
    /// Name the file was uploaded with
    pub original_name: String,
    pub size: u64,
}

/// A downloadable attachment and its optional preview.
///
/// Persisting this record is the caller's job; the pipeline only ever returns
/// updated values of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub id: Uuid,
    pub file: FileRef,
    /// Size recorded at the last save, kept for display without touching the store
    pub file_size: u64,
    #[serde(default)]
    pub caption: String,
    pub show_preview: bool,
    pub preview: Option<AssetRef>,
}

impl Download {
    pub fn new(file: FileRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_size: file.size,
            file,
            caption: String::new(),
            show_preview: true,
            preview: None,
        }
    }

    pub fn basename(&self) -> &str {
        basename(&self.file.name)
    }

    pub fn caption_or_basename(&self) -> &str {
        if self.caption.is_empty() {
            self.basename()
        } else {
            &self.caption
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download() -> Download {
        Download::new(FileRef {
            name: "filer_public/3c/91/annual-report.pdf".to_string(),
            original_name: "Annual Report.pdf".to_string(),
            size: 2048,
        })
    }

    #[test]
    fn caption_falls_back_to_basename() {
        let mut d = download();
        assert_eq!(d.basename(), "annual-report.pdf");
        assert_eq!(d.caption_or_basename(), "annual-report.pdf");

        d.caption = "Annual report 2024".to_string();
        assert_eq!(d.caption_or_basename(), "Annual report 2024");
    }
}
