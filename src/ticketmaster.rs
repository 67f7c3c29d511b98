use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::models::MalformedEvent;
use crate::store::StoreError;

static CLIENT: Lazy<Client> = Lazy::new(|| {
    let user_agent = std::env::var("EVENT_FINDER_USER_AGENT")
        .unwrap_or_else(|_| concat!("event-finder/", env!("CARGO_PKG_VERSION")).to_string());
    Client::builder()
        .timeout(Duration::from_secs(20))
        .user_agent(user_agent)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!("falling back to default http client: {err}");
            Client::new()
        })
});

/// Which request in the resolution sequence produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Primary,
    CityFallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Primary => f.write_str("fetch failed"),
            Stage::CityFallback => f.write_str("fetch failed for city"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid API key")]
    Auth,
    #[error("{stage} (status {status})")]
    Status { stage: Stage, status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("cache error: {0}")]
    Cache(#[from] StoreError),
    #[error(transparent)]
    MalformedEvent(#[from] MalformedEvent),
}

pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Performs a single HTTP GET. Non-2xx statuses are returned, not raised.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url) -> Result<HttpReply, FetchError>;
}

pub struct HttpTransport;

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url) -> Result<HttpReply, FetchError> {
        let response = CLIENT
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| FetchError::Transport(err.without_url().to_string()))?;
        Ok(HttpReply { status, body })
    }
}

/// Location filter for one Discovery API search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    City(String),
    Keyword(String),
}

impl SearchFilter {
    fn param(&self) -> (&'static str, &str) {
        match self {
            SearchFilter::City(city) => ("city", city.as_str()),
            SearchFilter::Keyword(keyword) => ("keyword", keyword.as_str()),
        }
    }
}

pub struct DiscoveryClient<T> {
    transport: T,
    base_url: Url,
    api_key: String,
    classification: String,
    country_code: String,
    page_size: u32,
}

impl DiscoveryClient<HttpTransport> {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::with_transport(HttpTransport, config)
    }
}

impl<T: Transport> DiscoveryClient<T> {
    pub fn with_transport(transport: T, config: &AppConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| ConfigError::InvalidBaseUrl(format!("{}: {err}", config.base_url)))?;
        Ok(Self {
            transport,
            base_url,
            api_key: config.api_key()?.to_string(),
            classification: config.classification.clone(),
            country_code: config.country_code.clone(),
            page_size: config.page_size,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn search_url(&self, filter: &SearchFilter) -> Url {
        let (name, value) = filter.param();
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("classificationName", &self.classification)
            .append_pair(name, value)
            .append_pair("countryCode", &self.country_code)
            .append_pair("size", &self.page_size.to_string())
            .append_pair("apikey", &self.api_key);
        url
    }

    /// Runs one search and returns the raw `_embedded.events` array.
    pub async fn search(
        &self,
        filter: &SearchFilter,
        stage: Stage,
    ) -> Result<Vec<Value>, FetchError> {
        let url = self.search_url(filter);
        tracing::debug!(?filter, ?stage, "requesting discovery events");

        let reply = self.transport.get(url).await?;
        if reply.status == StatusCode::UNAUTHORIZED.as_u16() {
            tracing::warn!(?stage, "discovery api rejected the api key");
            return Err(FetchError::Auth);
        }
        if !(200..300).contains(&reply.status) {
            tracing::warn!(?stage, status = reply.status, "discovery api request failed");
            return Err(FetchError::Status {
                stage,
                status: reply.status,
            });
        }

        extract_events(&reply.body)
    }
}

/// Pulls `_embedded.events` out of a response body; absent levels mean no events.
pub fn extract_events(body: &str) -> Result<Vec<Value>, FetchError> {
    let payload: Value =
        serde_json::from_str(body).map_err(|err| FetchError::Parse(err.to_string()))?;
    let events = payload
        .get("_embedded")
        .and_then(|embedded| embedded.get("events"))
        .and_then(|events| events.as_array())
        .cloned()
        .unwrap_or_default();
    Ok(events)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_keyword_url_with_fixed_params() {
        let client =
            DiscoveryClient::with_transport(ScriptedTransport::new(), &test_config()).expect("client");
        let url = client.search_url(&SearchFilter::Keyword("AC/DC & Friends".to_string()));

        assert_eq!(url.path(), "/discovery/v2/events.json");
        assert_eq!(query_value(&url, "classificationName").as_deref(), Some("music"));
        assert_eq!(query_value(&url, "keyword").as_deref(), Some("AC/DC & Friends"));
        assert_eq!(query_value(&url, "countryCode").as_deref(), Some("US"));
        assert_eq!(query_value(&url, "size").as_deref(), Some("10"));
        assert_eq!(query_value(&url, "apikey").as_deref(), Some("test-key"));
        assert_eq!(query_value(&url, "city"), None);
    }

    #[test]
    fn client_requires_api_key() {
        let result = DiscoveryClient::with_transport(ScriptedTransport::new(), &AppConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn bad_base_url_is_rejected_up_front() {
        let config = AppConfig {
            base_url: "not a url".to_string(),
            ..test_config()
        };
        let result = DiscoveryClient::with_transport(ScriptedTransport::new(), &config);
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl(ref msg)) if msg.contains("not a url")));
    }

    #[test]
    fn extract_tolerates_missing_levels() {
        assert!(extract_events("{}").expect("empty object").is_empty());
        assert!(extract_events(r#"{"_embedded":{}}"#).expect("no events").is_empty());
        assert!(extract_events(r#"{"page":{"totalElements":0}}"#)
            .expect("page only")
            .is_empty());
        let events = extract_events(&events_body(&["a", "b"]).to_string()).expect("events");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn extract_rejects_malformed_json() {
        assert!(matches!(extract_events("<html>"), Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn maps_statuses_to_errors() {
        let transport = ScriptedTransport::new()
            .reply(401, json!({"fault": "invalid key"}))
            .reply(500, json!({}))
            .reply(404, json!({}));
        let client = DiscoveryClient::with_transport(transport, &test_config()).expect("client");
        let filter = SearchFilter::City("Boise".to_string());

        assert!(matches!(
            client.search(&filter, Stage::Primary).await,
            Err(FetchError::Auth)
        ));
        let err = client
            .search(&filter, Stage::Primary)
            .await
            .expect_err("500");
        assert_eq!(err.to_string(), "fetch failed (status 500)");
        let err = client
            .search(&filter, Stage::CityFallback)
            .await
            .expect_err("404");
        assert_eq!(err.to_string(), "fetch failed for city (status 404)");
    }
}
