pub mod config;
pub mod debounce;
pub mod models;
pub mod render;
pub mod resolver;
pub mod store;
pub mod ticketmaster;
mod utils;
pub mod widget;

use std::sync::Arc;

use config::{AppConfig, ConfigError};
use resolver::EventResolver;
use store::{KeyValueStore, SqliteStore, StoreError};
use ticketmaster::{DiscoveryClient, HttpTransport};
use widget::SearchWidget;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cache unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Wires the live Discovery client and the on-disk cache into a search widget.
pub fn open_widget(config: &AppConfig) -> Result<SearchWidget<HttpTransport>, SetupError> {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open_default()?);
    let client = DiscoveryClient::from_config(config)?;
    let resolver = EventResolver::new(client, store, config.featured_city.clone());
    Ok(SearchWidget::new(resolver))
}
