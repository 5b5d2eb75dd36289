use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use thiserror::Error;

use crate::core::parcel::parcel_key;
use crate::core::types::Coordinate;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("lookup failed: {0}")]
    Lookup(String),
}

pub type ProviderResult = Result<Option<Coordinate>, ProviderError>;

/// Forward-geocoding capability.
///
/// `Ok(None)` means the provider answered and does not know the address;
/// `Err` covers transport and availability failures. The resolver treats
/// both as "try the next provider" — nothing a provider returns can fail a
/// draw pass. Implementations own their transport timeouts.
pub trait GeocodeProvider {
    fn name(&self) -> &str;

    fn locate(&self, address: &str) -> LocalBoxFuture<'_, ProviderResult>;
}

/// Client-side geocoding capability backed by a preloaded table.
///
/// Hosts that ship their own gazetteer (the common case for a brokerage
/// working a handful of districts) seed this once per session; lookups are
/// keyed at parcel granularity so unit details do not fragment the table.
#[derive(Debug, Default)]
pub struct TableGeocoder {
    entries: HashMap<String, Coordinate>,
}

impl TableGeocoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(mut self, address: &str, coordinate: Coordinate) -> Self {
        self.insert(address, coordinate);
        self
    }

    pub fn insert(&mut self, address: &str, coordinate: Coordinate) {
        self.entries
            .insert(parcel_key(address).into_string(), coordinate);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeocodeProvider for TableGeocoder {
    fn name(&self) -> &str {
        "table"
    }

    fn locate(&self, address: &str) -> LocalBoxFuture<'_, ProviderResult> {
        let hit = self.entries.get(parcel_key(address).as_str()).copied();
        futures::future::ready(Ok(hit)).boxed_local()
    }
}

type ProviderFactory = Box<dyn FnOnce() -> Option<Rc<dyn GeocodeProvider>>>;

/// Client-side capability whose backing library loads on first lookup.
///
/// The warm-up runs once per session. A warm-up that comes back empty spends
/// the factory for good and every lookup answers `Unavailable`, which the
/// resolver treats as "try the next provider".
pub struct LazyGeocoder {
    factory: RefCell<Option<ProviderFactory>>,
    loaded: RefCell<Option<Rc<dyn GeocodeProvider>>>,
}

impl LazyGeocoder {
    #[must_use]
    pub fn new(factory: impl FnOnce() -> Option<Rc<dyn GeocodeProvider>> + 'static) -> Self {
        Self {
            factory: RefCell::new(Some(Box::new(factory))),
            loaded: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.borrow().is_some()
    }

    fn warm_up(&self) {
        if self.loaded.borrow().is_some() {
            return;
        }
        let factory = self.factory.borrow_mut().take();
        if let Some(factory) = factory {
            *self.loaded.borrow_mut() = factory();
        }
    }
}

impl GeocodeProvider for LazyGeocoder {
    fn name(&self) -> &str {
        "lazy-client"
    }

    fn locate(&self, address: &str) -> LocalBoxFuture<'_, ProviderResult> {
        self.warm_up();
        let Some(provider) = self.loaded.borrow().as_ref().map(Rc::clone) else {
            return futures::future::ready(Err(ProviderError::Unavailable(
                "client geocoder failed to load".to_owned(),
            )))
            .boxed_local();
        };
        let address = address.to_owned();
        async move { provider.locate(&address).await }.boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{GeocodeProvider, LazyGeocoder, TableGeocoder};
    use crate::core::types::Coordinate;

    #[test]
    fn table_lookup_is_keyed_at_parcel_granularity() {
        let table =
            TableGeocoder::new().with_entry("성내동 55-3", Coordinate::new(37.53, 127.12));

        let hit = pollster::block_on(table.locate("성내동 55-3 지층 101호")).expect("table");
        assert_eq!(hit, Some(Coordinate::new(37.53, 127.12)));

        let miss = pollster::block_on(table.locate("천호동 166-82")).expect("table");
        assert!(miss.is_none());
    }

    #[test]
    fn lazy_warm_up_runs_once_and_serves_lookups() {
        let builds = Rc::new(Cell::new(0));
        let counter = Rc::clone(&builds);
        let lazy = LazyGeocoder::new(move || {
            counter.set(counter.get() + 1);
            let table =
                TableGeocoder::new().with_entry("성내동 55-3", Coordinate::new(37.53, 127.12));
            Some(Rc::new(table) as Rc<dyn GeocodeProvider>)
        });
        assert!(!lazy.is_loaded());

        let hit = pollster::block_on(lazy.locate("성내동 55-3")).expect("lookup");
        let miss = pollster::block_on(lazy.locate("천호동 166-82")).expect("lookup");

        assert_eq!(hit, Some(Coordinate::new(37.53, 127.12)));
        assert!(miss.is_none());
        assert!(lazy.is_loaded());
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn failed_warm_up_stays_unavailable() {
        let lazy = LazyGeocoder::new(|| None);
        assert!(pollster::block_on(lazy.locate("성내동 55-3")).is_err());
        // The factory is spent; later lookups do not retry the load.
        assert!(pollster::block_on(lazy.locate("성내동 55-3")).is_err());
        assert!(!lazy.is_loaded());
    }
}
