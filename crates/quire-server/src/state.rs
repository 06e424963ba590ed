use std::sync::Arc;

use quire_append::{Appender, StoreImageSource};
use quire_assembler::Assembler;
use quire_store::{BlobStore, ObjectBlobStore};

use crate::config::QuireConfig;
use crate::error::ServerResult;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub appender: Appender,
    pub image_prefixes: Arc<Vec<String>>,
}

impl AppState {
    /// Open the configured store and wire an [`Appender`] over it.
    pub fn from_config(config: &QuireConfig) -> ServerResult<Self> {
        let store: Arc<dyn BlobStore> = Arc::new(ObjectBlobStore::from_url(
            &config.store_url,
            config.public_base_url.clone(),
        )?);
        Ok(Self::with_store(config, store))
    }

    /// Wire an [`Appender`] over an already-open store.
    pub fn with_store(config: &QuireConfig, store: Arc<dyn BlobStore>) -> Self {
        let images = Arc::new(StoreImageSource::new(store.clone(), config.images_root.clone()));
        let appender = Appender::new(
            store,
            images,
            config.layout(),
            config.lock.policy(),
            Assembler::new(config.assembler()),
        );
        Self {
            appender,
            image_prefixes: Arc::new(config.image_prefixes()),
        }
    }
}
