//! Watchlist data sources
//!
//! A source hands back the raw document. Any file handle or connection it
//! opens is released before `fetch` returns, on success and on failure.

use crate::document::DocumentFormat;
use crate::error::LoadError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Raw document as fetched from a source
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub body: String,
    pub format: DocumentFormat,
}

#[async_trait]
pub trait WatchlistSource: Send + Sync {
    /// Human-readable origin, used in logs and errors
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<SourceDocument, LoadError>;
}

/// Document read from the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: DocumentFormat,
}

impl FileSource {
    /// Format inferred from the file extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);
        Self { path, format }
    }

    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }
}

#[async_trait]
impl WatchlistSource for FileSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn fetch(&self) -> Result<SourceDocument, LoadError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LoadError::unavailable(self.describe(), e))?;

        debug!("Read {} bytes from {}", body.len(), self.path.display());
        Ok(SourceDocument {
            body,
            format: self.format,
        })
    }
}

/// Document held in memory
#[derive(Debug, Clone)]
pub struct StaticSource {
    label: String,
    document: SourceDocument,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, body: impl Into<String>, format: DocumentFormat) -> Self {
        Self {
            label: label.into(),
            document: SourceDocument {
                body: body.into(),
                format,
            },
        }
    }

    pub fn xml(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(label, body, DocumentFormat::Xml)
    }
}

#[async_trait]
impl WatchlistSource for StaticSource {
    fn describe(&self) -> String {
        format!("static:{}", self.label)
    }

    async fn fetch(&self) -> Result<SourceDocument, LoadError> {
        Ok(self.document.clone())
    }
}

/// Document downloaded over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    format: DocumentFormat,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, format: DocumentFormat, timeout: Duration) -> Result<Self, LoadError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::unavailable(url.clone(), e))?;

        Ok(Self { url, format, client })
    }
}

#[async_trait]
impl WatchlistSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<SourceDocument, LoadError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LoadError::unavailable(self.describe(), e))?;

        let body = response
            .text()
            .await
            .map_err(|e| LoadError::unavailable(self.describe(), e))?;

        debug!("Downloaded {} bytes from {}", body.len(), self.url);
        Ok(SourceDocument {
            body,
            format: self.format,
        })
    }
}
