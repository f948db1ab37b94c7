//! Fetch orchestration for a single dashboard.
//!
//! A [`WeatherSession`] turns location changes into a published
//! [`WeatherState`]. Every request is tagged with a generation number and a
//! result is committed only while its generation is still the latest, so the
//! last requested location always wins regardless of settle order.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    cache::LocationCache,
    error::WeatherError,
    model::{CacheEntry, WeatherSnapshot},
    provider::WeatherFetcher,
};

/// When a cached entry is still good enough to skip the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// `None` keeps entries forever.
    pub max_age: Option<Duration>,
}

impl CachePolicy {
    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        let Some(max_age) = self.max_age else {
            return true;
        };

        chrono::Duration::from_std(max_age).map_or(true, |max| entry.age(Utc::now()) <= max)
    }
}

/// What the dashboard renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    /// Most recently requested location.
    pub location: Option<String>,
    /// Last successfully loaded snapshot. Survives later failures.
    pub data: Option<WeatherSnapshot>,
    pub loading: bool,
    pub error: Option<WeatherError>,
    generation: u64,
}

/// Handle for one issued request, consumed by [`WeatherSession::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    location: String,
    bypass_cache: bool,
}

impl Ticket {
    pub fn location(&self) -> &str {
        &self.location
    }
}

pub struct WeatherSession<F: ?Sized, C: ?Sized> {
    fetcher: Arc<F>,
    cache: Arc<C>,
    policy: CachePolicy,
    state: watch::Sender<WeatherState>,
}

impl<F, C> WeatherSession<F, C>
where
    F: WeatherFetcher + ?Sized,
    C: LocationCache + ?Sized + 'static,
{
    pub fn new(fetcher: Arc<F>, cache: Arc<C>, policy: CachePolicy) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        Self { fetcher, cache, policy, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    /// Records a location change: clears the error and enters `loading`.
    ///
    /// Previous `data` stays visible until the new request commits.
    pub fn request(&self, location: impl Into<String>) -> Ticket {
        self.issue(location.into(), false)
    }

    /// Like [`request`](Self::request), but the ticket always goes to the network.
    pub fn request_uncached(&self, location: impl Into<String>) -> Ticket {
        self.issue(location.into(), true)
    }

    fn issue(&self, location: String, bypass_cache: bool) -> Ticket {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.location = Some(location.clone());
            state.loading = true;
            state.error = None;
            generation = state.generation;
        });

        debug!(%location, generation, "location requested");
        Ticket { generation, location, bypass_cache }
    }

    /// Loads the ticket's location from cache or network and commits the
    /// outcome, unless a newer request has been issued meanwhile.
    pub async fn resolve(&self, ticket: Ticket) {
        if !ticket.bypass_cache {
            if let Some(entry) = self.cached(&ticket.location).await {
                self.commit(&ticket, Ok(entry.snapshot));
                return;
            }
        }

        let result = self.fetcher.fetch(&ticket.location).await;

        if let Err(err) = &result {
            info!(location = %ticket.location, error = %err, "fetch failed");
        }

        let fetched = result.as_ref().ok().cloned();
        if self.commit(&ticket, result) {
            if let Some(snapshot) = fetched {
                self.store(ticket.location, snapshot).await;
            }
        }
    }

    /// `request` followed by `resolve`.
    pub async fn set_location(&self, location: impl Into<String>) {
        let ticket = self.request(location);
        self.resolve(ticket).await;
    }

    /// Refetches the current location, ignoring any cached entry.
    ///
    /// Does nothing before the first request.
    pub async fn refresh(&self) {
        let location = self.state.borrow().location.clone();
        if let Some(location) = location {
            let ticket = self.request_uncached(location);
            self.resolve(ticket).await;
        }
    }

    /// Cache reads and writes may touch the disk, so they run on the blocking pool.
    async fn cached(&self, location: &str) -> Option<CacheEntry> {
        let cache = Arc::clone(&self.cache);
        let key = location.to_string();

        let entry = match tokio::task::spawn_blocking(move || cache.get(&key)).await {
            Ok(entry) => entry?,
            Err(err) => {
                warn!(location, error = %err, "cache lookup task failed");
                return None;
            }
        };

        if self.policy.is_fresh(&entry) {
            debug!(location, stored_at = %entry.stored_at, "cache hit");
            Some(entry)
        } else {
            debug!(location, stored_at = %entry.stored_at, "cache entry expired");
            None
        }
    }

    async fn store(&self, location: String, snapshot: WeatherSnapshot) {
        let cache = Arc::clone(&self.cache);

        if let Err(err) = tokio::task::spawn_blocking(move || cache.put(&location, &snapshot)).await {
            warn!(error = %err, "cache write task failed");
        }
    }

    /// Applies `result` if `ticket` is still current. Returns whether it was applied.
    fn commit(&self, ticket: &Ticket, result: Result<WeatherSnapshot, WeatherError>) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }

            match result {
                Ok(snapshot) => state.data = Some(snapshot),
                Err(err) => state.error = Some(err),
            }
            state.loading = false;
            true
        });

        if !applied {
            warn!(location = %ticket.location, "discarding result of superseded request");
        }

        applied
    }
}

impl<F, C> std::fmt::Debug for WeatherSession<F, C>
where
    F: std::fmt::Debug + ?Sized,
    C: ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherSession")
            .field("fetcher", &self.fetcher)
            .field("policy", &self.policy)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
