use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::core::cluster::group_listings;
use crate::core::listing::{Listing, ListingId};
use crate::core::parcel::ParcelKey;
use crate::core::types::Coordinate;
use crate::error::MapResult;
use crate::filter::{FilterState, ViewportFilterEngine};
use crate::geocode::{GeocodeResolver, SessionGeocodeCache};
use crate::surface::{
    BackendKind, FitOutcome, MapBackend, MapEvent, Marker, MarkerId, VendorCredentials,
    build_backend,
};

use super::diagnostics::DiagnosticsSnapshot;
use super::engine_config::MapEngineConfig;
use super::scheduler::{DrawTrigger, FitDecision, RedrawScheduler, SchedulerState, SettleDecision};

/// Marker click payload: the clicked cluster's member listings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSelection {
    pub key: ParcelKey,
    pub members: Vec<ListingId>,
}

#[derive(Debug, Clone)]
struct MarkerBinding {
    key: ParcelKey,
    members: Vec<ListingId>,
}

struct EngineState {
    listings: Vec<Listing>,
    filter: FilterState,
    /// `None` while a backend initializes or after its library failed to
    /// load; every operation degrades to a no-op against an absent surface.
    backend: Option<Box<dyn MapBackend>>,
    backend_kind: BackendKind,
    vendor_credentials: Option<VendorCredentials>,
    scheduler: RedrawScheduler,
    auto_fit: bool,
    bindings: HashMap<MarkerId, MarkerBinding>,
    selections: Vec<ClusterSelection>,
    resolution_failures: u64,
    draw_passes: u64,
    stale_passes: u64,
}

/// Facade over the listings-map core: filtering, clustering, geocoding and
/// marker redraw against the active surface.
///
/// A cheap-clone handle over `Rc` state: draw passes never hold a borrow
/// across a suspension point, so a host may overlap an in-flight pass with
/// a backend switch and the superseded pass discards its effects.
#[derive(Clone)]
pub struct MapEngine {
    state: Rc<RefCell<EngineState>>,
    resolver: Rc<GeocodeResolver>,
    filter_engine: Rc<ViewportFilterEngine>,
}

impl MapEngine {
    /// Builds the engine around a resolver the host has wired with its
    /// provider chain. The initial backend is constructed but not brought
    /// up; call [`MapEngine::init_surface`] before the first draw.
    pub fn new(config: MapEngineConfig, resolver: GeocodeResolver) -> MapResult<Self> {
        config.initial_filter.validate()?;

        let filter_engine = ViewportFilterEngine::new(Rc::clone(resolver.cache()));
        let backend = build_backend(config.backend, config.vendor_credentials.as_ref());
        let state = EngineState {
            listings: Vec::new(),
            filter: config.initial_filter,
            backend: Some(backend),
            backend_kind: config.backend,
            vendor_credentials: config.vendor_credentials,
            scheduler: RedrawScheduler::new(),
            auto_fit: config.auto_fit,
            bindings: HashMap::new(),
            selections: Vec::new(),
            resolution_failures: 0,
            draw_passes: 0,
            stale_passes: 0,
        };

        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            resolver: Rc::new(resolver),
            filter_engine: Rc::new(filter_engine),
        })
    }

    /// Brings the active surface up. A library that fails to load leaves the
    /// surface empty and reported, never crashes the page.
    pub async fn init_surface(&self) {
        let backend = self.state.borrow_mut().backend.take();
        let Some(mut backend) = backend else {
            return;
        };
        backend.init().await;
        let ready = backend.is_ready();
        let kind = backend.kind();
        self.state.borrow_mut().backend = Some(backend);
        if !ready {
            warn!(?kind, "map surface failed to initialize; staying empty");
        }
    }

    /// Replaces the full listing set and redraws with auto-fit.
    pub async fn set_listings(&self, listings: Vec<Listing>) {
        self.state.borrow_mut().listings = listings;
        self.run_draw_pass(DrawTrigger::DataChanged).await;
    }

    /// Swaps in a fresh filter snapshot and redraws with auto-fit.
    pub async fn set_filter(&self, filter: FilterState) -> MapResult<()> {
        filter.validate()?;
        self.state.borrow_mut().filter = filter;
        self.run_draw_pass(DrawTrigger::FilterChanged).await;
        Ok(())
    }

    /// Switches the active rendering backend at runtime.
    ///
    /// The previous handle is destroyed and its markers cleared before the
    /// new surface draws anything; the geocode cache carries over untouched.
    /// Any draw pass still in flight for the old surface goes stale.
    pub async fn switch_backend(&self, kind: BackendKind) {
        {
            let mut state = self.state.borrow_mut();
            if state.backend_kind == kind
                && state.backend.as_ref().is_some_and(|backend| backend.is_ready())
            {
                return;
            }
            if let Some(backend) = state.backend.as_mut() {
                backend.clear_markers();
                backend.destroy();
            }
            state.bindings.clear();
            debug!(from = ?state.backend_kind, to = ?kind, "switching map backend");
            let credentials = state.vendor_credentials.clone();
            state.backend = Some(build_backend(kind, credentials.as_ref()));
            state.backend_kind = kind;
        }
        self.init_surface().await;
        self.run_draw_pass(DrawTrigger::BackendSwitched).await;
    }

    /// Drains surface events: settle events route through the scheduler
    /// (guarded redraws), marker clicks become cluster selections, returned
    /// to the caller in arrival order.
    pub async fn pump(&self) -> Vec<ClusterSelection> {
        let events = {
            let mut state = self.state.borrow_mut();
            state
                .backend
                .as_mut()
                .map(|backend| backend.take_events())
                .unwrap_or_default()
        };

        for event in events {
            match event {
                MapEvent::ViewportSettled => {
                    let decision = self.state.borrow_mut().scheduler.on_viewport_settled();
                    match decision {
                        SettleDecision::Redraw => {
                            self.run_draw_pass(DrawTrigger::ViewportSettled).await;
                        }
                        SettleDecision::FitCompleted => {
                            debug!("programmatic fit settled; guard released");
                        }
                        SettleDecision::Ignored => {}
                    }
                }
                MapEvent::MarkerClicked { marker } => {
                    let mut state = self.state.borrow_mut();
                    let binding = state.bindings.get(&marker).cloned();
                    if let Some(binding) = binding {
                        state.selections.push(ClusterSelection {
                            key: binding.key,
                            members: binding.members,
                        });
                    }
                }
            }
        }

        self.state.borrow_mut().selections.drain(..).collect()
    }

    /// Forwards a user pan gesture to the active surface.
    pub fn pan_by(&self, delta_lat: f64, delta_lng: f64) {
        if let Some(backend) = self.state.borrow_mut().backend.as_mut() {
            backend.pan_by(delta_lat, delta_lng);
        }
    }

    /// Forwards a user zoom gesture to the active surface.
    pub fn set_zoom(&self, zoom: f64) {
        if let Some(backend) = self.state.borrow_mut().backend.as_mut() {
            backend.set_zoom(zoom);
        }
    }

    /// Forwards a user marker click to the active surface.
    pub fn click_marker(&self, id: MarkerId) {
        if let Some(backend) = self.state.borrow_mut().backend.as_mut() {
            backend.click_marker(id);
        }
    }

    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.state.borrow().backend_kind
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.state
            .borrow()
            .backend
            .as_ref()
            .map_or(0, |backend| backend.marker_count())
    }

    /// Snapshot of the markers currently drawn on the active surface.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        self.state
            .borrow()
            .backend
            .as_ref()
            .map(|backend| backend.markers())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn filter(&self) -> FilterState {
        self.state.borrow().filter.clone()
    }

    #[must_use]
    pub fn cache(&self) -> Rc<SessionGeocodeCache> {
        Rc::clone(self.resolver.cache())
    }

    #[must_use]
    pub fn scheduler_state(&self) -> SchedulerState {
        self.state.borrow().scheduler.state()
    }

    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        let state = self.state.borrow();
        DiagnosticsSnapshot {
            marker_count: state
                .backend
                .as_ref()
                .map_or(0, |backend| backend.marker_count()),
            resolution_failures: state.resolution_failures,
            draw_passes: state.draw_passes,
            stale_passes: state.stale_passes,
            cache_entries: self.resolver.cache().len(),
            surface_ready: state
                .backend
                .as_ref()
                .is_some_and(|backend| backend.is_ready()),
            scheduler_state: state.scheduler.state(),
        }
    }

    /// One Drawing pass: filter, cluster, resolve, draw, optionally fit.
    ///
    /// Borrows are dropped before every await; after each resume the pass
    /// re-checks its epoch and discards its remaining effects when a newer
    /// pass or a backend switch has superseded it.
    async fn run_draw_pass(&self, trigger: DrawTrigger) {
        let (pass, visible, surface_ready) = {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;
            let pass = state.scheduler.begin_pass(trigger);

            if let Some(backend) = state.backend.as_mut() {
                backend.clear_markers();
            }
            state.bindings.clear();

            let surface_ready = state
                .backend
                .as_ref()
                .is_some_and(|backend| backend.is_ready());
            // Bounds are read fresh here and dropped with the pass.
            let bounds = state.backend.as_ref().and_then(|backend| backend.bounds());
            let visible =
                self.filter_engine
                    .filter(&state.listings, &state.filter, bounds.as_deref());
            (pass, visible, surface_ready)
        };

        let mut drawn: Vec<Coordinate> = Vec::new();

        if surface_ready {
            let clusters = group_listings(&visible);
            for cluster in clusters.values() {
                let resolved = cluster.resolve_representative(&self.resolver).await;

                let mut state = self.state.borrow_mut();
                let state = &mut *state;
                if !state.scheduler.pass_is_current(&pass) {
                    state.stale_passes += 1;
                    debug!(epoch = pass.epoch(), "draw pass superseded; discarding");
                    return;
                }
                let Some(coordinate) = resolved else {
                    state.resolution_failures += 1;
                    continue;
                };
                let Some(backend) = state.backend.as_mut() else {
                    state.scheduler.abort_pass(&pass);
                    return;
                };
                let member_ids = cluster.member_ids();
                if let Some(marker) =
                    backend.add_marker(coordinate, &cluster.len().to_string(), &member_ids)
                {
                    state.bindings.insert(
                        marker,
                        MarkerBinding {
                            key: cluster.key().clone(),
                            members: member_ids.to_vec(),
                        },
                    );
                    drawn.push(coordinate);
                }
            }
        }

        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        if !state.scheduler.pass_is_current(&pass) {
            state.stale_passes += 1;
            return;
        }
        state.draw_passes += 1;
        match state.scheduler.finish_pass(&pass) {
            FitDecision::Fit => {
                let outcome = if state.auto_fit {
                    state
                        .backend
                        .as_mut()
                        .map_or(FitOutcome::Skipped, |backend| {
                            backend.fit_to_coordinates(&drawn)
                        })
                } else {
                    FitOutcome::Skipped
                };
                state.scheduler.apply_fit_outcome(outcome);
            }
            FitDecision::SkipFit | FitDecision::Stale => {}
        }
    }
}
