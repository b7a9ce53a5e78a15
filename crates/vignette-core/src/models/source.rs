//! Source files handed to the preview pipeline.
//!
//! The pipeline only ever borrows read access to a source: it opens it once, copies
//! the bytes into a private scratch file and lets go.

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Reader over the full content of a source file.
pub type SourceReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// A file a preview may be generated for.
#[async_trait]
pub trait SourceFile: Send + Sync {
    /// Stored name of the file. Its extension decides which converter runs.
    fn name(&self) -> &str;

    /// Name the file was uploaded with. Preview file names are derived from it.
    fn original_name(&self) -> &str {
        basename(self.name())
    }

    /// Size of the content in bytes.
    async fn size(&self) -> io::Result<u64>;

    /// Open the content for reading from the start.
    async fn open(&self) -> io::Result<SourceReader>;
}

/// Final path segment of `name`, or `name` itself when it has none.
pub fn basename(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

/// Extension of `name` as written, without the leading dot.
pub fn extension_of(name: &str) -> Option<&str> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Source file backed by a path on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalSourceFile {
    path: PathBuf,
    name: String,
    original_name: String,
}

impl LocalSourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.to_string_lossy().into_owned();
        let original_name = basename(&name).to_string();
        Self {
            path,
            name,
            original_name,
        }
    }

    /// Override the name the preview file name is derived from.
    pub fn with_original_name(mut self, original_name: impl Into<String>) -> Self {
        self.original_name = original_name.into();
        self
    }
}

#[async_trait]
impl SourceFile for LocalSourceFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn original_name(&self) -> &str {
        &self.original_name
    }

    async fn size(&self) -> io::Result<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    async fn open(&self) -> io::Result<SourceReader> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(Box::pin(file))
    }
}

/// Source file held entirely in memory
#[derive(Debug, Clone)]
pub struct InMemorySourceFile {
    name: String,
    original_name: String,
    data: Bytes,
}

impl InMemorySourceFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let original_name = basename(&name).to_string();
        Self {
            name,
            original_name,
            data: data.into(),
        }
    }

    pub fn with_original_name(mut self, original_name: impl Into<String>) -> Self {
        self.original_name = original_name.into();
        self
    }
}

#[async_trait]
impl SourceFile for InMemorySourceFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn original_name(&self) -> &str {
        &self.original_name
    }

    async fn size(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn open(&self) -> io::Result<SourceReader> {
        Ok(Box::pin(io::Cursor::new(self.data.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename("filer_public/2f/ab/report.pdf"), "report.pdf");
        assert_eq!(basename("report.pdf"), "report.pdf");
    }

    #[test]
    fn extension_keeps_original_case() {
        assert_eq!(extension_of("scan.PDF"), Some("PDF"));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("dir.d/file"), None);
    }

    #[tokio::test]
    async fn in_memory_source_reads_back_content() {
        let source = InMemorySourceFile::new("uploads/photo.png", &b"png bytes"[..]);
        assert_eq!(source.original_name(), "photo.png");
        assert_eq!(source.size().await.unwrap(), 9);

        let mut buf = Vec::new();
        source.open().await.unwrap().read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"png bytes");
    }

    #[tokio::test]
    async fn local_source_uses_file_name_as_original_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let source = LocalSourceFile::new(&path);
        assert_eq!(source.original_name(), "notes.txt");
        assert_eq!(source.size().await.unwrap(), 5);

        let renamed = source.with_original_name("Meeting notes.txt");
        assert_eq!(renamed.original_name(), "Meeting notes.txt");
    }
}
