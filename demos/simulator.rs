//! Simulated drawbridge driving the controller through full cycles.
//!
//! A small plant model integrates deck position from the commanded motor
//! duty and asserts the limit switches at the ends of travel, so the whole
//! control sequence — yellow dwell, gates, profiled raise, marine clearance,
//! profiled lower — runs end to end with no hardware.
//!
//! # Usage
//!
//! Scripted console scenario:
//! ```sh
//! cargo run --example simulator
//! ```
//!
//! Interactive control panel at http://localhost:8080:
//! ```sh
//! cargo run --example simulator --features web
//! ```

use anyhow::Result;

use rs_bascule::hal::MockBridgeIo;
use rs_bascule::traits::MotorDirection;
use rs_bascule::{BridgeConfig, BridgeMachine, TickInputs};

/// Tick interval for the simulated control loop.
const TICK_MS: u64 = 50;

/// Deck travel integrator: duty in, limit switches out.
struct DeckPlant {
    /// Deck position, 0.0 (closed) to 100.0 (open) percent.
    position: f32,
}

impl DeckPlant {
    fn new() -> Self {
        Self { position: 0.0 }
    }

    /// Advance the plant by `dt_ms` given the currently commanded motor state.
    ///
    /// Scaled so a cruise duty of 170 travels the full span in roughly the
    /// default expected duration (5.2 s).
    fn step(&mut self, io: &MockBridgeIo, dt_ms: u64) {
        if !io.motor_enabled || io.motor_duty == 0 {
            return;
        }
        let rate = (io.motor_duty as f32 / 255.0) * 0.0288; // percent per ms
        match io.motor_direction {
            Some(MotorDirection::Up) => self.position += rate * dt_ms as f32,
            Some(MotorDirection::Down) => self.position -= rate * dt_ms as f32,
            None => {}
        }
        self.position = self.position.clamp(0.0, 100.0);
    }

    fn top_limit(&self) -> bool {
        self.position >= 100.0
    }

    fn bottom_limit(&self) -> bool {
        self.position <= 0.0
    }
}

/// Boat traffic script for the console scenario.
#[cfg(not(feature = "web"))]
fn boat_inputs(now_ms: u64) -> (bool, bool) {
    // A vessel shows up at t=1s and holds in the waiting zone until the
    // span is open (~11s), passes under it for two seconds, then is gone.
    let boat_waiting = (1_000..11_000).contains(&now_ms);
    let boat_under_span = (11_000..13_000).contains(&now_ms);
    (boat_waiting, boat_under_span)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run()
}

#[cfg(feature = "web")]
fn run() -> Result<()> {
    run_panel_server()
}

#[cfg(not(feature = "web"))]
fn run() -> Result<()> {
    run_scripted_scenario()
}

/// Scripted scenario: one full boat passage, printed to the console.
#[cfg(not(feature = "web"))]
fn run_scripted_scenario() -> Result<()> {
    println!("=================================");
    println!("  rs-bascule Simulator");
    println!("=================================");
    println!();

    let config = BridgeConfig::default();
    let mut machine = BridgeMachine::new(MockBridgeIo::new(), 0);
    let mut plant = DeckPlant::new();

    let mut now_ms = 0;
    while now_ms <= 30_000 {
        plant.step(machine.io(), TICK_MS);

        let (boat_waiting, boat_under_span) = boat_inputs(now_ms);
        let inputs = TickInputs {
            top_limit: plant.top_limit(),
            bottom_limit: plant.bottom_limit(),
            boat_waiting,
            boat_under_span,
            ..TickInputs::default()
        };

        if let Some(transition) = machine
            .tick(now_ms, inputs, &config)
            .map_err(|_| anyhow::anyhow!("effector failure"))?
        {
            println!(
                "t={:>6}ms  {:>15} -> {:<15}  deck at {:5.1}%",
                now_ms,
                transition.from.as_str(),
                transition.to.as_str(),
                plant.position
            );
        }

        now_ms += TICK_MS;
    }

    let status = machine.status(now_ms);
    println!();
    println!(
        "Final state: {} (deck at {:.1}%, fault: {})",
        status.state.as_str(),
        plant.position,
        status
            .fault
            .map(|f| f.reason.code())
            .unwrap_or("none")
    );
    Ok(())
}

/// Interactive mode: simulated plant plus the control-panel web API.
#[cfg(feature = "web")]
fn run_panel_server() -> Result<()> {
    use std::sync::Arc;
    use std::time::Duration;

    use rs_bascule::services::{run_server_with_state, SharedBridge, WebServerConfig};

    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let config = BridgeConfig::default();
        let web_config = WebServerConfig::from_config(&config.web);

        println!("=================================");
        println!("  rs-bascule Simulator + Panel");
        println!("=================================");
        println!();
        println!("  Panel: http://{}", web_config.addr);
        println!("  API:   http://{}/api/state", web_config.addr);
        println!();
        println!("Press Ctrl+C to stop.");
        println!();

        let machine = BridgeMachine::new(MockBridgeIo::new(), 0);
        let state = Arc::new(SharedBridge::new(machine, config));

        // Tick driver: the sole owner of the control cycle. Panel requests
        // and the e-stop latch are merged in by `SharedBridge::tick`.
        let driver_state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut plant = DeckPlant::new();
            let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
            loop {
                interval.tick().await;
                let inputs = driver_state.with_machine(|machine| {
                    plant.step(machine.io(), TICK_MS);
                    TickInputs {
                        top_limit: plant.top_limit(),
                        bottom_limit: plant.bottom_limit(),
                        ..TickInputs::default()
                    }
                });
                let _ = driver_state.tick(inputs);
            }
        });

        run_server_with_state(state, web_config).await?;
        Ok(())
    })
}
