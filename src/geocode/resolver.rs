use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt as _;
use futures::future::{LocalBoxFuture, Shared};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::parcel::{ParcelKey, parcel_key};
use crate::core::types::Coordinate;
use crate::geocode::provider::GeocodeProvider;

/// Session-scoped parcel-key → coordinate map.
///
/// Append-only by contract: once a key is populated it is never evicted or
/// overwritten for the rest of the session. Addresses do not move, so there
/// is no TTL and no invalidation. Shared via `Rc` between the resolver and
/// the filter engine; only the resolver writes.
#[derive(Debug, Default)]
pub struct SessionGeocodeCache {
    entries: RefCell<HashMap<ParcelKey, Coordinate>>,
}

impl SessionGeocodeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &ParcelKey) -> Option<Coordinate> {
        self.entries.borrow().get(key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: &ParcelKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub(crate) fn insert(&self, key: ParcelKey, coordinate: Coordinate) {
        self.entries.borrow_mut().entry(key).or_insert(coordinate);
    }
}

/// Feature flag disabling the network fallback providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkFallback {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub network_fallback: NetworkFallback,
    /// Attempts per provider before moving down the chain. Errors retry up
    /// to this bound; a clean "unknown" answer does not.
    #[serde(default = "default_attempts_per_provider")]
    pub attempts_per_provider: u8,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            network_fallback: NetworkFallback::default(),
            attempts_per_provider: default_attempts_per_provider(),
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn with_network_fallback(mut self, network_fallback: NetworkFallback) -> Self {
        self.network_fallback = network_fallback;
        self
    }

    #[must_use]
    pub fn with_attempts_per_provider(mut self, attempts: u8) -> Self {
        self.attempts_per_provider = attempts;
        self
    }
}

fn default_attempts_per_provider() -> u8 {
    1
}

type SharedLookup = Shared<LocalBoxFuture<'static, Option<Coordinate>>>;

/// Resolves free-text addresses to coordinates through the provider chain.
///
/// Cache hits short-circuit; concurrent misses for one parcel key coalesce
/// onto a single in-flight chain execution. The resolver is the only writer
/// of the session cache.
pub struct GeocodeResolver {
    cache: Rc<SessionGeocodeCache>,
    client: Option<Rc<dyn GeocodeProvider>>,
    network: Vec<Rc<dyn GeocodeProvider>>,
    config: ResolverConfig,
    in_flight: RefCell<HashMap<ParcelKey, SharedLookup>>,
}

impl GeocodeResolver {
    #[must_use]
    pub fn new(cache: Rc<SessionGeocodeCache>, config: ResolverConfig) -> Self {
        Self {
            cache,
            client: None,
            network: Vec::new(),
            config,
            in_flight: RefCell::new(HashMap::new()),
        }
    }

    /// Installs the client-side capability tried before any network provider.
    #[must_use]
    pub fn with_client_provider(mut self, provider: Rc<dyn GeocodeProvider>) -> Self {
        self.client = Some(provider);
        self
    }

    /// Appends a network fallback endpoint; order of registration is the
    /// order of attempts.
    #[must_use]
    pub fn with_network_provider(mut self, provider: Rc<dyn GeocodeProvider>) -> Self {
        self.network.push(provider);
        self
    }

    #[must_use]
    pub fn cache(&self) -> &Rc<SessionGeocodeCache> {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Resolves a raw address to a coordinate, or `None` when every provider
    /// comes up empty. Never errors: absence is a valid outcome and the
    /// caller omits the cluster rather than retrying in the hot path.
    pub async fn resolve(&self, raw_address: &str) -> Option<Coordinate> {
        let key = parcel_key(raw_address);
        if key.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit);
        }

        let lookup = self.join_or_start_lookup(&key, raw_address);
        let resolved = lookup.await;
        self.in_flight.borrow_mut().remove(&key);
        resolved
    }

    /// Check-then-insert happens before any await, so two `resolve` calls
    /// issued back-to-back for one key share a single chain execution.
    fn join_or_start_lookup(&self, key: &ParcelKey, raw_address: &str) -> SharedLookup {
        let mut in_flight = self.in_flight.borrow_mut();
        if let Some(pending) = in_flight.get(key) {
            debug!(key = %key, "joining in-flight geocode");
            return pending.clone();
        }

        let chain = run_provider_chain(
            key.clone(),
            raw_address.to_owned(),
            Rc::clone(&self.cache),
            self.client.clone(),
            self.network.clone(),
            self.config,
        )
        .boxed_local()
        .shared();
        in_flight.insert(key.clone(), chain.clone());
        chain
    }
}

async fn run_provider_chain(
    key: ParcelKey,
    address: String,
    cache: Rc<SessionGeocodeCache>,
    client: Option<Rc<dyn GeocodeProvider>>,
    network: Vec<Rc<dyn GeocodeProvider>>,
    config: ResolverConfig,
) -> Option<Coordinate> {
    let network_enabled = config.network_fallback == NetworkFallback::Enabled;
    let attempts = config.attempts_per_provider.max(1);

    let providers = client
        .iter()
        .chain(network.iter().filter(|_| network_enabled));

    for provider in providers {
        for attempt in 1..=attempts {
            match provider.locate(&address).await {
                Ok(Some(coordinate)) => {
                    debug!(key = %key, provider = provider.name(), "geocode resolved");
                    cache.insert(key, coordinate);
                    return Some(coordinate);
                }
                // The provider answered "unknown"; retrying won't change that.
                Ok(None) => break,
                Err(err) => {
                    debug!(
                        key = %key,
                        provider = provider.name(),
                        attempt,
                        error = %err,
                        "geocode provider failed"
                    );
                }
            }
        }
    }

    debug!(key = %key, "geocode exhausted all providers");
    None
}
