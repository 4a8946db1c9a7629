//! vt-imaging: original image storage and on-demand derivatives.
//!
//! Uploaded originals are written once into an [`OriginalStore`] by the
//! [`Ingestor`]. Derivatives are never stored: each request is parsed into a
//! [`DerivativeSpec`], rendered by the [`Transformer`] from the immutable
//! original, and returned to the caller. [`ImagePipeline`] ties the pieces
//! together for the HTTP layer.

pub mod derivative;
pub mod ingest;
pub mod pipeline;
pub mod store;
pub mod transform;

pub use derivative::{parse_dimensions, parse_quality, DerivativeSpec};
pub use ingest::{generate_storage_name, Ingestor, OriginalImage, Upload};
pub use pipeline::{Derivative, ImagePipeline, OriginalFile, OUTPUT_MEDIA_TYPE};
pub use store::OriginalStore;
pub use transform::{render, TransformLimits, Transformer};
