//! Application state shared by all handlers.

use mailimage_core::Config;
use mailimage_db::{EntryRepository, MetadataStore};
use mailimage_services::{Gallery, ImageThumbnailer, Storage, ThumbnailCache};
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<Config>,
    pub gallery: Gallery,
    pub thumbnails: ThumbnailCache,
}

impl AppState {
    pub fn new(config: Arc<Config>, gallery: Gallery, thumbnails: ThumbnailCache) -> Self {
        Self {
            config,
            gallery,
            thumbnails,
        }
    }

    /// Wire the read paths over already opened store handles.
    pub fn from_stores(
        config: Arc<Config>,
        store: Arc<dyn MetadataStore>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let entries = EntryRepository::new(store, config.token_length, config.token_expiry);
        let gallery = Gallery::new(
            storage.clone(),
            entries.clone(),
            config.storage_path.clone(),
        );
        let thumbnails = ThumbnailCache::new(
            storage,
            entries,
            Arc::new(ImageThumbnailer::new(
                config.thumbnail_width,
                config.thumbnail_height,
            )),
        );
        Self::new(config, gallery, thumbnails)
    }
}
