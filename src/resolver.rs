use std::sync::Arc;

use serde_json::Value;

use crate::models::{normalize_events, CacheKey, EventRecord, Query};
use crate::store::KeyValueStore;
use crate::ticketmaster::{DiscoveryClient, FetchError, SearchFilter, Stage, Transport};

/// Resolves a search into events, consulting the local cache for named queries.
pub struct EventResolver<T> {
    client: DiscoveryClient<T>,
    store: Arc<dyn KeyValueStore>,
    featured_city: String,
}

impl<T: Transport> EventResolver<T> {
    pub fn new(
        client: DiscoveryClient<T>,
        store: Arc<dyn KeyValueStore>,
        featured_city: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            featured_city: featured_city.into(),
        }
    }

    pub fn client(&self) -> &DiscoveryClient<T> {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub async fn resolve(&self, query: Option<&Query>) -> Result<Vec<EventRecord>, FetchError> {
        let raw = self.resolve_raw(query).await?;
        Ok(normalize_events(&raw)?)
    }

    /// Returns the upstream event objects exactly as cached or received.
    pub async fn resolve_raw(&self, query: Option<&Query>) -> Result<Vec<Value>, FetchError> {
        let key = CacheKey::for_query(query);

        let Some(query) = query else {
            let filter = SearchFilter::City(self.featured_city.clone());
            return self.client.search(&filter, Stage::Primary).await;
        };

        if let Some(cached) = self.store.get(key.as_str())? {
            tracing::debug!(%key, "cache hit");
            return serde_json::from_str(&cached).map_err(|err| FetchError::Parse(err.to_string()));
        }
        tracing::debug!(%key, "cache miss");

        let keyword = SearchFilter::Keyword(query.as_str().to_string());
        let mut events = self.client.search(&keyword, Stage::Primary).await?;

        if events.is_empty() {
            tracing::info!(%query, "keyword search empty, retrying as city");
            let city = SearchFilter::City(query.as_str().to_string());
            events = self.client.search(&city, Stage::CityFallback).await?;
        }

        let payload =
            serde_json::to_string(&events).map_err(|err| FetchError::Parse(err.to_string()))?;
        self.store.set(key.as_str(), &payload)?;

        Ok(events)
    }

    /// Wipes the whole backing store, including keys this resolver never wrote.
    pub fn clear_cache(&self) -> Result<(), FetchError> {
        self.store.clear()?;
        Ok(())
    }
}
