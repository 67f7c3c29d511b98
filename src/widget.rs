use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::debounce::Debouncer;
use crate::models::{EventRecord, Query};
use crate::resolver::EventResolver;
use crate::ticketmaster::{FetchError, Stage, Transport};

const FEATURED_FAILED: &str = "Failed to load featured events.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading,
    Events(Vec<EventRecord>),
    NoResults,
    Error(String),
}

impl ViewState {
    fn from_events(events: Vec<EventRecord>) -> Self {
        if events.is_empty() {
            ViewState::NoResults
        } else {
            ViewState::Events(events)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ViewState::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
}

/// Search box controller: validates input, runs the resolver, publishes view state.
///
/// Searches are not serialized. When two overlap, whichever finishes last
/// overwrites the published state.
pub struct SearchWidget<T> {
    resolver: EventResolver<T>,
    state: watch::Sender<ViewState>,
    debouncer: Mutex<Debouncer>,
}

impl<T: Transport + 'static> SearchWidget<T> {
    pub fn new(resolver: EventResolver<T>) -> Self {
        Self::with_debouncer(resolver, Debouncer::default())
    }

    pub fn with_debouncer(resolver: EventResolver<T>, debouncer: Debouncer) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            resolver,
            state,
            debouncer: Mutex::new(debouncer),
        }
    }

    pub fn resolver(&self) -> &EventResolver<T> {
        &self.resolver
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub async fn submit(&self, input: &str) -> ViewState {
        let query = match Query::parse(input) {
            Ok(query) => query,
            Err(err) => return self.publish(ViewState::Error(err.to_string())),
        };

        self.publish(ViewState::Loading);
        let next = match self.resolver.resolve(Some(&query)).await {
            Ok(events) => ViewState::from_events(events),
            Err(err) => {
                tracing::warn!(%query, "search failed: {err}");
                ViewState::Error(user_message(&err))
            }
        };
        self.publish(next)
    }

    /// Empties the whole cache and shows featured events.
    pub async fn clear(&self) -> ViewState {
        self.publish(ViewState::Idle);
        if let Err(err) = self.resolver.clear_cache() {
            tracing::warn!("failed to clear cache: {err}");
            return self.publish(ViewState::Error(FEATURED_FAILED.to_string()));
        }

        self.featured().await
    }

    /// Shows featured events. Never reads or writes the cache.
    pub async fn featured(&self) -> ViewState {
        self.publish(ViewState::Loading);
        let next = match self.resolver.resolve(None).await {
            Ok(events) => ViewState::from_events(events),
            Err(err) => {
                tracing::warn!("featured events failed: {err}");
                ViewState::Error(FEATURED_FAILED.to_string())
            }
        };
        self.publish(next)
    }

    pub async fn load(&self) -> ViewState {
        self.clear().await
    }

    /// Debounced key handler. Only an Enter press that survives the quiet
    /// window triggers a search. A later key press cancels it while it is
    /// still waiting, never once the search has started.
    pub fn key_press(self: &Arc<Self>, key: Key, input: impl Into<String>) {
        let widget = Arc::clone(self);
        let input = input.into();
        let task = async move {
            if key == Key::Enter {
                widget.submit(&input).await;
            }
        };

        match self.debouncer.lock() {
            Ok(mut debouncer) => debouncer.schedule(task),
            Err(poisoned) => poisoned.into_inner().schedule(task),
        }
    }

    fn publish(&self, state: ViewState) -> ViewState {
        self.state.send_replace(state.clone());
        state
    }
}

pub fn user_message(err: &FetchError) -> String {
    match err {
        FetchError::Auth => "Invalid API key. Please check your Ticketmaster API key.".to_string(),
        FetchError::Status {
            stage: Stage::Primary,
            ..
        } => "Failed to fetch events. Please try again later.".to_string(),
        FetchError::Status {
            stage: Stage::CityFallback,
            ..
        } => "Failed to fetch events for city. Please try again.".to_string(),
        other => other.to_string(),
    }
}
