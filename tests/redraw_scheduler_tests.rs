use parcel_map::api::{
    DrawTrigger, FitDecision, RedrawScheduler, SchedulerState, SettleDecision,
};
use parcel_map::surface::FitOutcome;

#[test]
fn every_non_settle_trigger_fits_after_drawing() {
    for trigger in [
        DrawTrigger::DataChanged,
        DrawTrigger::FilterChanged,
        DrawTrigger::BackendSwitched,
    ] {
        let mut scheduler = RedrawScheduler::new();
        let pass = scheduler.begin_pass(trigger);
        assert_eq!(scheduler.finish_pass(&pass), FitDecision::Fit);
        assert_eq!(scheduler.state(), SchedulerState::Fitting);
    }

    let mut scheduler = RedrawScheduler::new();
    let pass = scheduler.begin_pass(DrawTrigger::ViewportSettled);
    assert_eq!(scheduler.finish_pass(&pass), FitDecision::SkipFit);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[test]
fn notified_fit_holds_the_guard_until_the_echo() {
    let mut scheduler = RedrawScheduler::new();
    let pass = scheduler.begin_pass(DrawTrigger::DataChanged);
    assert_eq!(scheduler.finish_pass(&pass), FitDecision::Fit);

    scheduler.apply_fit_outcome(FitOutcome::Notified);
    assert_eq!(scheduler.state(), SchedulerState::Fitting);

    // The echo releases the guard; only the settle after that is a user.
    assert_eq!(scheduler.on_viewport_settled(), SettleDecision::FitCompleted);
    assert_eq!(scheduler.on_viewport_settled(), SettleDecision::Redraw);
}

#[test]
fn skipped_fit_releases_the_guard_synchronously() {
    let mut scheduler = RedrawScheduler::new();
    let pass = scheduler.begin_pass(DrawTrigger::FilterChanged);
    scheduler.finish_pass(&pass);
    scheduler.apply_fit_outcome(FitOutcome::Skipped);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[test]
fn epochs_grow_monotonically_across_passes() {
    let mut scheduler = RedrawScheduler::new();
    let first = scheduler.begin_pass(DrawTrigger::DataChanged);
    scheduler.finish_pass(&first);
    let second = scheduler.begin_pass(DrawTrigger::ViewportSettled);

    assert!(second.epoch() > first.epoch());
    assert_eq!(scheduler.current_epoch(), second.epoch());
}

#[test]
fn abort_returns_a_current_pass_to_idle_but_ignores_stale_ones() {
    let mut scheduler = RedrawScheduler::new();
    let stale = scheduler.begin_pass(DrawTrigger::DataChanged);
    let current = scheduler.begin_pass(DrawTrigger::FilterChanged);

    scheduler.abort_pass(&stale);
    assert_eq!(scheduler.state(), SchedulerState::Drawing);

    scheduler.abort_pass(&current);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[test]
fn a_new_trigger_during_fitting_takes_over_the_machine() {
    let mut scheduler = RedrawScheduler::new();
    let pass = scheduler.begin_pass(DrawTrigger::DataChanged);
    scheduler.finish_pass(&pass);
    scheduler.apply_fit_outcome(FitOutcome::Notified);

    // Fresh data arrives before the fit echo.
    let next = scheduler.begin_pass(DrawTrigger::DataChanged);
    assert_eq!(scheduler.state(), SchedulerState::Drawing);
    // The stranded echo is ignored while the newer pass draws.
    assert_eq!(scheduler.on_viewport_settled(), SettleDecision::Ignored);
    assert_eq!(scheduler.finish_pass(&next), FitDecision::Fit);
}
