pub mod building_facts;
pub mod diagnostics;
pub mod engine;
pub mod engine_config;
pub mod json_contract;
pub mod scheduler;

pub use building_facts::{BuildingFacts, BuildingFactsSource};
pub use diagnostics::DiagnosticsSnapshot;
pub use engine::{ClusterSelection, MapEngine};
pub use engine_config::MapEngineConfig;
pub use json_contract::listings_from_json;
pub use scheduler::{
    DrawPass, DrawTrigger, FitDecision, RedrawScheduler, SchedulerState, SettleDecision,
};
