use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::surface::FitOutcome;

/// Redraw state machine: one current-state variable, no scattered flags.
///
/// `Fitting` doubles as the re-entrancy guard: a settle event observed in
/// that state is the echo of our own programmatic fit, not a user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchedulerState {
    #[default]
    Idle,
    Drawing,
    Fitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawTrigger {
    DataChanged,
    FilterChanged,
    BackendSwitched,
    ViewportSettled,
}

impl DrawTrigger {
    /// User pan/zoom redraws must not move the viewport again; everything
    /// else auto-fits after drawing.
    #[must_use]
    pub fn fits_after_draw(self) -> bool {
        !matches!(self, Self::ViewportSettled)
    }
}

/// Ticket for one Drawing pass.
///
/// The epoch makes cancellation cheap: a pass whose epoch no longer matches
/// the scheduler's discards its remaining effects instead of trying to
/// cancel provider calls already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawPass {
    epoch: u64,
    trigger: DrawTrigger,
}

impl DrawPass {
    #[must_use]
    pub fn epoch(self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn trigger(self) -> DrawTrigger {
        self.trigger
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitDecision {
    Fit,
    SkipFit,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleDecision {
    /// User moved the map: redraw without fitting.
    Redraw,
    /// Our own fit settled: release the guard, draw nothing.
    FitCompleted,
    /// A draw is already in flight; it re-reads bounds anyway.
    Ignored,
}

#[derive(Debug, Default)]
pub struct RedrawScheduler {
    state: SchedulerState,
    epoch: u64,
}

impl RedrawScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[must_use]
    pub fn current_epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts a Drawing pass, superseding any pass still in flight.
    pub fn begin_pass(&mut self, trigger: DrawTrigger) -> DrawPass {
        self.epoch += 1;
        self.state = SchedulerState::Drawing;
        debug!(epoch = self.epoch, ?trigger, "draw pass begins");
        DrawPass {
            epoch: self.epoch,
            trigger,
        }
    }

    #[must_use]
    pub fn pass_is_current(&self, pass: &DrawPass) -> bool {
        pass.epoch == self.epoch
    }

    /// Ends a Drawing pass and decides whether to auto-fit.
    pub fn finish_pass(&mut self, pass: &DrawPass) -> FitDecision {
        if !self.pass_is_current(pass) {
            return FitDecision::Stale;
        }
        if pass.trigger.fits_after_draw() {
            self.state = SchedulerState::Fitting;
            FitDecision::Fit
        } else {
            self.state = SchedulerState::Idle;
            FitDecision::SkipFit
        }
    }

    /// Returns to Idle when a current pass cannot complete (no surface).
    pub fn abort_pass(&mut self, pass: &DrawPass) {
        if self.pass_is_current(pass) {
            self.state = SchedulerState::Idle;
        }
    }

    /// Applies the backend's answer to a fit request issued in `Fitting`.
    pub fn apply_fit_outcome(&mut self, outcome: FitOutcome) {
        match outcome {
            FitOutcome::Completed | FitOutcome::Skipped => self.state = SchedulerState::Idle,
            // The guard stays up until the settle echo arrives.
            FitOutcome::Notified => {}
        }
    }

    /// Routes a settle event by current state.
    pub fn on_viewport_settled(&mut self) -> SettleDecision {
        match self.state {
            SchedulerState::Fitting => {
                self.state = SchedulerState::Idle;
                SettleDecision::FitCompleted
            }
            SchedulerState::Idle => SettleDecision::Redraw,
            SchedulerState::Drawing => SettleDecision::Ignored,
        }
    }
}
