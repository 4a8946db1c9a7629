//! Media-domain enums for stored originals and attachments.
//!
//! All enums serialize in lowercase (via `serde(rename_all = "lowercase")`) and
//! implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// MediaType
// ---------------------------------------------------------------------------

/// Media types accepted for uploaded originals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
}

impl MediaType {
    /// All accepted media types.
    pub const ALL: [MediaType; 3] = [MediaType::Jpeg, MediaType::Png, MediaType::Gif];

    /// Resolve a declared MIME type (`image/jpeg`, `image/png`, `image/gif`).
    ///
    /// Parameters such as `; charset=...` are ignored and matching is
    /// case-insensitive. `image/jpg` is accepted as a common alias.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Resolve a file extension (without the leading dot, case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// The MIME type sent as `Content-Type`.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    /// Canonical file extension (without the leading dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
            Self::Gif => write!(f, "gif"),
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// AttachmentKind
// ---------------------------------------------------------------------------

/// Kind tag carried by attachment link rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            other => Err(format!("unknown attachment kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mime_accepts_known_types() {
        assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("IMAGE/PNG"), Some(MediaType::Png));
        assert_eq!(MediaType::from_mime("image/gif; name=x"), Some(MediaType::Gif));
        assert_eq!(MediaType::from_mime("image/jpg"), Some(MediaType::Jpeg));
    }

    #[test]
    fn from_mime_rejects_others() {
        assert_eq!(MediaType::from_mime("image/webp"), None);
        assert_eq!(MediaType::from_mime("text/plain"), None);
        assert_eq!(MediaType::from_mime(""), None);
    }

    #[test]
    fn extension_round_trip() {
        for mt in MediaType::ALL {
            assert_eq!(MediaType::from_extension(mt.extension()), Some(mt));
        }
        assert_eq!(MediaType::from_extension("JPEG"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_extension("bmp"), None);
    }

    #[test]
    fn display_and_parse() {
        for mt in MediaType::ALL {
            assert_eq!(mt.to_string().parse::<MediaType>().unwrap(), mt);
        }
        assert_eq!(AttachmentKind::Image.to_string(), "image");
        assert!("video".parse::<AttachmentKind>().is_err());
    }
}
