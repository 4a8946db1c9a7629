//! Parsing of derivative requests (`{dimensions}/{quality}/{filename}`).
//!
//! The parser validates shape only. Whether a request is feasible to render
//! is decided by the transform engine.

use vt_core::MediaError;

use crate::store::OriginalStore;

/// A validated derivative request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivativeSpec {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub source_name: String,
}

impl DerivativeSpec {
    /// Parse the three path tokens of a derivative request.
    ///
    /// Dimensions are checked first, then quality, then the existence of the
    /// original. No decoding happens here.
    pub async fn parse(
        dimensions: &str,
        quality: &str,
        filename: &str,
        store: &OriginalStore,
    ) -> Result<Self, MediaError> {
        let (width, height) = parse_dimensions(dimensions)?;
        let quality = parse_quality(quality)?;

        if !store.exists(filename).await {
            return Err(MediaError::not_found(filename));
        }

        Ok(Self {
            width,
            height,
            quality,
            source_name: filename.to_string(),
        })
    }

    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Parse a dimensions token: `N` (square) or `WxH` with a case-insensitive `x`.
pub fn parse_dimensions(token: &str) -> Result<(u32, u32), MediaError> {
    let mut parts = token.split(['x', 'X']);
    let first = parts.next().unwrap_or_default();
    let second = parts.next();
    if parts.next().is_some() {
        return Err(MediaError::dimensions(token, "expected N or WxH"));
    }

    let width = parse_side(token, first)?;
    let height = match second {
        Some(h) => parse_side(token, h)?,
        None => width,
    };
    Ok((width, height))
}

fn parse_side(token: &str, part: &str) -> Result<u32, MediaError> {
    if part.is_empty() {
        return Err(MediaError::dimensions(token, "expected N or WxH"));
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MediaError::dimensions(
            token,
            "width and height must be positive integers",
        ));
    }
    let value: u32 = part
        .parse()
        .map_err(|_| MediaError::dimensions(token, "value is too large"))?;
    if value == 0 {
        return Err(MediaError::dimensions(token, "width and height must be greater than zero"));
    }
    Ok(value)
}

/// Parse a quality token: an integer in `1..=100`.
pub fn parse_quality(token: &str) -> Result<u8, MediaError> {
    let invalid = || MediaError::InvalidQuality {
        token: token.to_string(),
    };
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match token.parse::<u32>() {
        Ok(q) if (1..=100).contains(&q) => Ok(q as u8),
        _ => Err(invalid()),
    }
}
