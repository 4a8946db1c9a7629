//! Decode, resize and re-encode originals into derivatives.
//!
//! [`render`] is the pure, CPU-bound step. [`Transformer`] runs it on the
//! blocking pool behind a concurrency limit and a wall-clock budget so a
//! hostile request cannot starve the runtime or take the process down.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageError, ImageReader, Limits};
use tokio::sync::Semaphore;
use vt_core::config::ImageConfig;
use vt_core::MediaError;

use crate::derivative::DerivativeSpec;

/// Resource bounds applied to every transform.
#[derive(Debug, Clone, Copy)]
pub struct TransformLimits {
    /// Largest `width * height` a derivative may have.
    pub max_output_pixels: u64,
    /// Allocation ceiling handed to the decoder.
    pub max_decode_bytes: u64,
    pub timeout: Duration,
    pub max_concurrent: usize,
}

impl From<&ImageConfig> for TransformLimits {
    fn from(cfg: &ImageConfig) -> Self {
        Self {
            max_output_pixels: cfg.max_output_pixels,
            max_decode_bytes: cfg.max_decode_bytes,
            timeout: Duration::from_secs(cfg.transform_timeout_secs.max(1)),
            max_concurrent: cfg.max_concurrent_transforms.max(1),
        }
    }
}

impl Default for TransformLimits {
    fn default() -> Self {
        Self::from(&ImageConfig::default())
    }
}

/// Render a derivative: exact `width x height`, baseline JPEG at `quality`.
///
/// Aspect ratio is not preserved. The output depends only on the input bytes
/// and the requested size and quality.
pub fn render(
    original: &[u8],
    spec: &DerivativeSpec,
    limits: &TransformLimits,
) -> Result<Vec<u8>, MediaError> {
    if spec.pixels() > limits.max_output_pixels {
        return Err(MediaError::TransformFailed(format!(
            "requested {}x{} exceeds the {} pixel limit",
            spec.width, spec.height, limits.max_output_pixels
        )));
    }

    let mut reader = ImageReader::new(Cursor::new(original))
        .with_guessed_format()
        .map_err(|e| MediaError::DecodeError(e.to_string()))?;
    let mut decode_limits = Limits::default();
    decode_limits.max_alloc = Some(limits.max_decode_bytes);
    reader.limits(decode_limits);

    let img = reader.decode().map_err(|e| match e {
        ImageError::Limits(e) => {
            MediaError::TransformFailed(format!("original too large to decode: {e}"))
        }
        other => MediaError::DecodeError(other.to_string()),
    })?;

    let resized = img.resize_exact(spec.width, spec.height, FilterType::Lanczos3);
    let rgb = resized.to_rgb8();

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, spec.quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| MediaError::TransformFailed(format!("encode failed: {e}")))?;

    Ok(out)
}

/// Runs [`render`] off the async executor with bounded concurrency.
#[derive(Debug, Clone)]
pub struct Transformer {
    limits: TransformLimits,
    permits: Arc<Semaphore>,
}

impl Transformer {
    pub fn new(limits: TransformLimits) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limits.max_concurrent.max(1))),
            limits,
        }
    }

    /// Render a derivative on the blocking pool.
    ///
    /// Timeouts and panics inside the worker surface as
    /// [`MediaError::TransformFailed`]. On timeout the worker is left to
    /// finish in the background; it still holds its permit until then.
    pub async fn transform(
        &self,
        original: Vec<u8>,
        spec: DerivativeSpec,
    ) -> Result<Vec<u8>, MediaError> {
        let started = Instant::now();
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| MediaError::TransformFailed("transform pool closed".into()))?;

        let limits = self.limits;
        let (width, height, quality) = (spec.width, spec.height, spec.quality);
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            render(&original, &spec, &limits)
        });

        let result = match tokio::time::timeout(self.limits.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                tracing::error!(error = %join_err, "Transform worker panicked");
                Err(MediaError::TransformFailed("transform worker aborted".into()))
            }
            Err(_) => Err(MediaError::TransformFailed(format!(
                "transform exceeded {:?} budget",
                self.limits.timeout
            ))),
        };

        tracing::debug!(
            width,
            height,
            quality,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Rendered derivative"
        );
        result
    }
}
