pub mod provider;
pub mod resolver;

pub use provider::{GeocodeProvider, LazyGeocoder, ProviderError, ProviderResult, TableGeocoder};
pub use resolver::{GeocodeResolver, NetworkFallback, ResolverConfig, SessionGeocodeCache};
