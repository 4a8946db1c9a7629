//! Delivery of originals and derivatives.

use bytes::Bytes;
use tokio::fs::File;
use vt_core::config::ImageConfig;
use vt_core::{ItemId, MediaType, Result};

use crate::derivative::DerivativeSpec;
use crate::ingest::{Ingestor, OriginalImage};
use crate::store::OriginalStore;
use crate::transform::{TransformLimits, Transformer};

/// Encoding of every derivative.
pub const OUTPUT_MEDIA_TYPE: MediaType = MediaType::Jpeg;

/// An opened original, ready to stream.
#[derive(Debug)]
pub struct OriginalFile {
    pub file: File,
    pub len: u64,
    /// `None` when the storage name carries no recognised extension.
    pub media_type: Option<MediaType>,
}

/// A rendered derivative.
#[derive(Debug, Clone)]
pub struct Derivative {
    pub bytes: Bytes,
    pub media_type: MediaType,
}

/// Store, ingestor and transformer sharing one configuration.
#[derive(Debug, Clone)]
pub struct ImagePipeline {
    store: OriginalStore,
    ingestor: Ingestor,
    transformer: Transformer,
    default_derivative: String,
}

impl ImagePipeline {
    pub fn new(cfg: &ImageConfig) -> Self {
        let store = OriginalStore::new(cfg.storage_dir.clone());
        Self {
            ingestor: Ingestor::new(store.clone(), cfg.max_upload_bytes),
            transformer: Transformer::new(TransformLimits::from(cfg)),
            default_derivative: cfg.default_derivative.clone(),
            store,
        }
    }

    pub fn store(&self) -> &OriginalStore {
        &self.store
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    /// `{dimensions}/{quality}` used for default derivative links.
    pub fn default_derivative(&self) -> &str {
        &self.default_derivative
    }

    /// Validate and store an in-memory upload.
    pub async fn ingest(
        &self,
        owner: ItemId,
        declared_mime: &str,
        original_filename: Option<&str>,
        data: Bytes,
    ) -> Result<OriginalImage> {
        self.ingestor
            .ingest(owner, declared_mime, original_filename, data)
            .await
    }

    /// Open an original for verbatim delivery.
    pub async fn open_original(&self, name: &str) -> Result<OriginalFile> {
        let (file, len) = self.store.open(name).await?;
        Ok(OriginalFile {
            file,
            len,
            media_type: OriginalStore::media_type_of(name),
        })
    }

    /// Parse a derivative request and render it from the stored original.
    pub async fn render_derivative(
        &self,
        dimensions: &str,
        quality: &str,
        name: &str,
    ) -> Result<Derivative> {
        let spec = DerivativeSpec::parse(dimensions, quality, name, &self.store).await?;
        let original = self.store.read(&spec.source_name).await?;
        let bytes = self.transformer.transform(original, spec).await?;
        Ok(Derivative {
            bytes: Bytes::from(bytes),
            media_type: OUTPUT_MEDIA_TYPE,
        })
    }
}
