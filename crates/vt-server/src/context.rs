//! Application context shared by all request handlers (via Axum state).

use std::sync::Arc;

use vt_core::config::Config;
use vt_db::pool::DbPool;
use vt_imaging::ImagePipeline;

use crate::token::{generate_secret, TokenSigner};

/// Cheaply cloneable: every field is a pool handle or an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Original store, ingestion and derivative rendering.
    pub images: Arc<ImagePipeline>,
    /// Bearer token signer.
    pub tokens: TokenSigner,
}

impl AppContext {
    /// Build the context from a loaded configuration.
    ///
    /// An empty `auth.secret` is replaced by a random one for the lifetime
    /// of the process.
    pub fn new(db: DbPool, mut config: Config) -> Self {
        if config.auth.secret.is_empty() {
            tracing::warn!("auth.secret is not set; generated an ephemeral signing secret");
            config.auth.secret = generate_secret();
        }

        let tokens = TokenSigner::new(&config.auth.secret, config.auth.token_ttl_secs);
        let images = Arc::new(ImagePipeline::new(&config.images));

        Self {
            db,
            config: Arc::new(config),
            images,
            tokens,
        }
    }
}
