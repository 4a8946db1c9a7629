//! Runtime configuration, read from a JSON file.
//!
//! Every field has a default, so `{}` is a complete config. The loaded value
//! is passed explicitly to whatever needs it; there is no global.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Upload ceiling applied when the config does not override it (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub images: ImageConfig,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Validation(format!("invalid config: {e}")))
    }

    /// Read `path`, or use defaults when no path is given or the file is
    /// missing. A file that exists but does not parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(Error::Io { source }),
        }
    }

    /// Settings that will run but are probably a mistake.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; the OS will pick a port".into());
        }

        if self.auth.secret.is_empty() {
            warnings.push(
                "auth.secret is empty; a random secret will be generated and tokens will not survive a restart"
                    .into(),
            );
        } else if self.auth.secret.len() < 32 {
            warnings.push("auth.secret is shorter than 32 characters".into());
        }

        if self.auth.token_ttl_secs == 0 {
            warnings.push("auth.token_ttl_secs is 0; every token will be expired on issue".into());
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            warnings.push(format!(
                "auth.bcrypt_cost {} is outside the supported range 4..=31",
                self.auth.bcrypt_cost
            ));
        }

        if self.images.max_upload_bytes == 0 {
            warnings.push("images.max_upload_bytes is 0; every upload will be rejected".into());
        }

        if self.images.max_concurrent_transforms == 0 {
            warnings.push("images.max_concurrent_transforms is 0; using 1".into());
        }

        warnings
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5050,
            db_path: PathBuf::from("./data/vitrine.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret used to sign and verify bearer tokens.
    pub secret: String,
    /// Lifetime of an issued token.
    pub token_ttl_secs: u64,
    /// bcrypt work factor for stored password hashes.
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_secs: 3600,
            bcrypt_cost: 12,
        }
    }
}

/// Image storage and derivative rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Directory holding uploaded originals.
    pub storage_dir: PathBuf,
    /// Upload ceiling in bytes.
    pub max_upload_bytes: u64,
    /// `{dimensions}/{quality}` used when rendering default derivative links.
    pub default_derivative: String,
    /// Largest `width * height` a derivative may request.
    pub max_output_pixels: u64,
    /// Memory ceiling handed to the decoder.
    pub max_decode_bytes: u64,
    /// Wall-clock budget for a single decode/resize/encode.
    pub transform_timeout_secs: u64,
    /// Number of derivatives rendered at the same time.
    pub max_concurrent_transforms: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data/uploads/images"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_derivative: "500X500/50".into(),
            max_output_pixels: 40_000_000,
            max_decode_bytes: 512 * 1024 * 1024,
            transform_timeout_secs: 30,
            max_concurrent_transforms: num_cpus::get().max(1),
        }
    }
}
