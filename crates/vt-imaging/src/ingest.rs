//! Upload ingestion: validate, name, and persist a new original.

use std::path::Path;

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use serde::Serialize;
use vt_core::{ItemId, MediaError, MediaType, Result};

use crate::store::OriginalStore;

/// Metadata of a freshly persisted original.
#[derive(Debug, Clone, Serialize)]
pub struct OriginalImage {
    pub storage_name: String,
    pub media_type: MediaType,
    pub size_bytes: u64,
    pub owner: ItemId,
}

/// Generate a unique storage name: `<unix millis>-<random u64>.<ext>`.
///
/// The extension is taken from `original_filename` when it is an alias of
/// `media_type` (e.g. `.jpeg` for JPEG), otherwise the canonical extension is
/// used. The random component keeps concurrent uploads in the same
/// millisecond apart.
pub fn generate_storage_name(media_type: MediaType, original_filename: Option<&str>) -> String {
    let ext = original_filename
        .and_then(|f| Path::new(f).extension())
        .and_then(|e| e.to_str())
        .filter(|e| MediaType::from_extension(e) == Some(media_type))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| media_type.extension().to_string());

    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        rand::random::<u64>(),
        ext
    )
}

/// Accepts uploads and writes them into the [`OriginalStore`].
#[derive(Debug, Clone)]
pub struct Ingestor {
    store: OriginalStore,
    max_bytes: u64,
}

impl Ingestor {
    pub fn new(store: OriginalStore, max_bytes: u64) -> Self {
        Self { store, max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Start an upload for `owner`.
    ///
    /// Rejects the declared media type or a declared length over the ceiling
    /// before any byte is accepted.
    pub fn begin(
        &self,
        owner: ItemId,
        declared_mime: &str,
        original_filename: Option<&str>,
        declared_len: Option<u64>,
    ) -> Result<Upload> {
        let media_type =
            MediaType::from_mime(declared_mime).ok_or_else(|| MediaError::UnsupportedMediaType {
                declared: declared_mime.to_string(),
            })?;

        if declared_len.is_some_and(|len| len > self.max_bytes) {
            return Err(MediaError::PayloadTooLarge { limit: self.max_bytes }.into());
        }

        Ok(Upload {
            owner,
            media_type,
            original_filename: original_filename.map(str::to_owned),
            max_bytes: self.max_bytes,
            buf: BytesMut::new(),
        })
    }

    /// Persist a completed upload and return its metadata.
    ///
    /// The caller must only record the attachment link after this returns
    /// `Ok`.
    pub async fn commit(&self, upload: Upload) -> Result<OriginalImage> {
        if upload.buf.is_empty() {
            return Err(vt_core::Error::Validation("uploaded file is empty".into()));
        }

        let storage_name =
            generate_storage_name(upload.media_type, upload.original_filename.as_deref());
        let data = upload.buf.freeze();

        self.store.persist(&storage_name, &data).await?;

        tracing::info!(
            storage_name = %storage_name,
            media_type = %upload.media_type,
            size_bytes = data.len(),
            owner = %upload.owner,
            "Stored original"
        );

        Ok(OriginalImage {
            storage_name,
            media_type: upload.media_type,
            size_bytes: data.len() as u64,
            owner: upload.owner,
        })
    }

    /// Validate and persist a complete in-memory upload.
    pub async fn ingest(
        &self,
        owner: ItemId,
        declared_mime: &str,
        original_filename: Option<&str>,
        data: Bytes,
    ) -> Result<OriginalImage> {
        let mut upload =
            self.begin(owner, declared_mime, original_filename, Some(data.len() as u64))?;
        upload.push(&data)?;
        self.commit(upload).await
    }
}

/// An upload being received, held in memory until committed.
#[derive(Debug)]
pub struct Upload {
    owner: ItemId,
    media_type: MediaType,
    original_filename: Option<String>,
    max_bytes: u64,
    buf: BytesMut,
}

impl Upload {
    /// Append a received chunk, enforcing the size ceiling.
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        let total = self.buf.len() as u64 + chunk.len() as u64;
        if total > self.max_bytes {
            return Err(MediaError::PayloadTooLarge { limit: self.max_bytes }.into());
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
