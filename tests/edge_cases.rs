//! Edge case and boundary condition tests for the bridge controller

use rs_bascule::hal::MockBridgeIo;
use rs_bascule::{
    BridgeConfig, BridgeMachine, BridgeState, DriveConfig, FaultReason, SafetyConfig,
    SensorReading, TickInputs, TimingConfig,
};

fn machine() -> BridgeMachine<MockBridgeIo> {
    BridgeMachine::new(MockBridgeIo::new(), 0)
}

fn idle() -> TickInputs {
    TickInputs::default()
}

fn with(f: impl FnOnce(&mut TickInputs)) -> TickInputs {
    let mut inputs = TickInputs::default();
    f(&mut inputs);
    inputs
}

fn enter_raising(m: &mut BridgeMachine<MockBridgeIo>, config: &BridgeConfig) -> u64 {
    m.tick(0, with(|i| i.request_raise = true), config).unwrap();
    let t = config.timing.yellow_ms;
    m.tick(t, idle(), config).unwrap();
    assert_eq!(m.state(), BridgeState::Raising);
    t
}

// ============================================================================
// Safety Flag Masking
// ============================================================================

#[test]
fn disabled_estop_is_ignored() {
    let config = BridgeConfig::default()
        .with_safety(SafetyConfig::default().with_estop_enabled(false));
    let mut m = machine();
    let t = enter_raising(&mut m, &config);

    m.tick(t + 500, with(|i| i.estop = true), &config).unwrap();
    assert_eq!(m.state(), BridgeState::Raising);
    assert!(m.last_fault().is_none());
}

#[test]
fn disabled_timeout_lets_motion_run_past_ceiling() {
    let config = BridgeConfig::default()
        .with_safety(SafetyConfig::default().with_motion_timeout_enabled(false));
    let mut m = machine();
    let t = enter_raising(&mut m, &config);

    m.tick(t + config.timing.open_max_ms + 5000, idle(), &config)
        .unwrap();
    assert_eq!(m.state(), BridgeState::Raising);

    // The limit switch still completes the motion
    m.tick(
        t + config.timing.open_max_ms + 5100,
        with(|i| i.top_limit = true),
        &config,
    )
    .unwrap();
    assert_eq!(m.state(), BridgeState::Up);
}

#[test]
fn estop_mask_is_read_live() {
    let mut config = BridgeConfig::default()
        .with_safety(SafetyConfig::default().with_estop_enabled(false));
    let mut m = machine();
    let t = enter_raising(&mut m, &config);

    m.tick(t + 100, with(|i| i.estop = true), &config).unwrap();
    assert_eq!(m.state(), BridgeState::Raising);

    // Re-arm mid-motion: the very next tick honors the input
    config.set_param("estop_enabled", "on").unwrap();
    m.tick(t + 200, with(|i| i.estop = true), &config).unwrap();
    assert_eq!(m.state(), BridgeState::EmergencyLower);
}

// ============================================================================
// Frozen Durations vs Live Duties
// ============================================================================

#[test]
fn expected_duration_is_frozen_at_motion_entry() {
    let mut config = BridgeConfig::default();
    let mut m = machine();
    let t = enter_raising(&mut m, &config);

    // Shorten the expected duration mid-motion; the running motion keeps
    // the value it entered with and stays at cruise.
    config.set_param("open_expected_ms", "100").unwrap();
    m.tick(t + 1000, idle(), &config).unwrap();
    assert!(!m.decelerating());
    assert_eq!(m.io().motor_duty, config.drive.open_cruise);

    // The frozen value still takes effect at the original boundary
    m.tick(t + 5200, idle(), &config).unwrap();
    assert!(m.decelerating());
}

#[test]
fn max_duration_is_frozen_at_motion_entry() {
    let mut config = BridgeConfig::default();
    let mut m = machine();
    let t = enter_raising(&mut m, &config);

    // Stretch the ceiling mid-motion; the running motion still aborts at
    // the value frozen on entry.
    config.set_param("open_max_ms", "60000").unwrap();
    m.tick(t + 7000, idle(), &config).unwrap();
    assert_eq!(m.state(), BridgeState::EmergencyLower);
    assert_eq!(m.last_fault().unwrap().reason, FaultReason::OpenTimeout);
}

#[test]
fn duty_values_are_read_live() {
    let mut config = BridgeConfig::default();
    let mut m = machine();
    let t = enter_raising(&mut m, &config);

    m.tick(t + 100, idle(), &config).unwrap();
    assert_eq!(m.io().motor_duty, 170);

    // A duty edit mid-motion applies on the next tick
    config.set_param("open_cruise", "200").unwrap();
    m.tick(t + 200, idle(), &config).unwrap();
    assert_eq!(m.io().motor_duty, 200);

    // And the slow duty too, once decelerating
    config.set_param("open_slow", "95").unwrap();
    m.tick(t + config.timing.open_expected_ms, idle(), &config)
        .unwrap();
    assert_eq!(m.io().motor_duty, 95);
}

// ============================================================================
// Emergency Motion Bound
// ============================================================================

#[test]
fn emergency_motor_cuts_out_after_ceiling_but_state_holds() {
    let config = BridgeConfig::default();
    assert_eq!(config.timing.emergency_ms, 2000);

    let mut m = machine();
    let t = enter_raising(&mut m, &config);
    m.tick(t + 100, with(|i| i.estop = true), &config).unwrap();
    assert_eq!(m.state(), BridgeState::EmergencyLower);
    let t_emg = t + 100;

    // Motor drives down within the emergency window
    m.tick(t_emg + 1000, idle(), &config).unwrap();
    assert_eq!(m.io().motor_duty, config.drive.close_cruise);

    // Past the window: duty removed, state retained
    m.tick(t_emg + 2000, idle(), &config).unwrap();
    assert_eq!(m.state(), BridgeState::EmergencyLower);
    assert!(m.io().motor_stopped());

    m.tick(t_emg + 60_000, idle(), &config).unwrap();
    assert_eq!(m.state(), BridgeState::EmergencyLower);

    // The limit switch still resolves the emergency
    m.tick(t_emg + 60_100, with(|i| i.bottom_limit = true), &config)
        .unwrap();
    assert_eq!(m.state(), BridgeState::Down);
}

// ============================================================================
// Conflicting and Redundant Requests
// ============================================================================

#[test]
fn simultaneous_raise_and_lower_in_down_raises() {
    let config = BridgeConfig::default();
    let mut m = machine();

    // Down only consults the raise request; guard order resolves the
    // conflict without an error.
    m.tick(
        0,
        with(|i| {
            i.request_raise = true;
            i.request_lower = true;
        }),
        &config,
    )
    .unwrap();
    assert_eq!(m.state(), BridgeState::PrepRaise);
}

#[test]
fn redundant_requests_in_terminal_states_are_ignored() {
    let config = BridgeConfig::default();
    let mut m = machine();

    m.tick(0, with(|i| i.request_lower = true), &config).unwrap();
    assert_eq!(m.state(), BridgeState::Down);

    m.tick(100, with(|i| i.request_abort = true), &config)
        .unwrap();
    assert_eq!(m.state(), BridgeState::Down);
}

#[test]
fn estop_during_prep_raise_aborts_to_emergency_lower() {
    let config = BridgeConfig::default();
    let mut m = machine();
    m.tick(0, with(|i| i.request_raise = true), &config).unwrap();
    assert_eq!(m.state(), BridgeState::PrepRaise);

    m.tick(500, with(|i| i.estop = true), &config).unwrap();
    assert_eq!(m.state(), BridgeState::EmergencyLower);
    assert_eq!(m.last_fault().unwrap().reason, FaultReason::EmergencyStop);
}

// ============================================================================
// Timing Boundaries
// ============================================================================

#[test]
fn yellow_boundary_is_inclusive() {
    let config = BridgeConfig::default()
        .with_timing(TimingConfig::default().with_yellow_ms(2000));
    let mut m = machine();
    m.tick(0, with(|i| i.request_raise = true), &config).unwrap();

    m.tick(1999, idle(), &config).unwrap();
    assert_eq!(m.state(), BridgeState::PrepRaise);

    m.tick(2000, idle(), &config).unwrap();
    assert_eq!(m.state(), BridgeState::Raising);
}

#[test]
fn non_monotone_clock_does_not_underflow() {
    let config = BridgeConfig::default();
    let mut m = machine();
    let t = enter_raising(&mut m, &config);

    // A timestamp before the entry time reads as zero elapsed, not a wrap.
    m.tick(t.saturating_sub(1), idle(), &config).unwrap();
    assert_eq!(m.state(), BridgeState::Raising);
    assert_eq!(m.io().motor_duty, config.drive.open_cruise);
}

#[test]
fn minimum_duty_configuration_drives_at_floor() {
    // The profiler itself accepts any duty pair; range policy lives in
    // the config boundary.
    let config = BridgeConfig::default().with_drive(DriveConfig {
        open_cruise: 20,
        open_slow: 20,
        close_cruise: 20,
        close_slow: 20,
    });
    let mut m = machine();
    let t = enter_raising(&mut m, &config);

    m.tick(t + 100, idle(), &config).unwrap();
    assert_eq!(m.io().motor_duty, 20);
}

// ============================================================================
// Effector Failures and Gate Feedback
// ============================================================================

#[test]
fn effector_error_propagates_from_tick() {
    let config = BridgeConfig::default();
    let mut m = machine();
    m.io_mut().failing = true;

    assert!(m.tick(0, idle(), &config).is_err());
}

#[test]
fn gates_stuck_unknown_never_allows_motion() {
    let config = BridgeConfig::default();
    let mut m = machine();
    m.io_mut().gates_down_feedback = SensorReading::Unknown;

    m.tick(0, with(|i| i.request_raise = true), &config).unwrap();
    for t in (1000..20_000).step_by(1000) {
        m.tick(t, idle(), &config).unwrap();
        assert_eq!(m.state(), BridgeState::PrepRaise);
    }
}

// ============================================================================
// Status Snapshot
// ============================================================================

#[test]
fn status_reflects_machine_and_fault() {
    let config = BridgeConfig::default();
    let mut m = machine();
    let t = enter_raising(&mut m, &config);
    m.tick(t + 100, with(|i| i.request_abort = true), &config)
        .unwrap();

    let status = m.status(t + 600);
    assert_eq!(status.state, BridgeState::EmergencyLower);
    assert_eq!(status.elapsed_in_state_ms, 500);
    let fault = status.fault.unwrap();
    assert_eq!(fault.reason, FaultReason::AbortRequested);
    assert_eq!(fault.during, BridgeState::Raising);
    assert_eq!(fault.at_ms, t + 100);
}
