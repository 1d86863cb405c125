//! Scenario test helpers for the wavesim simulator.
//!
//! Provides shared functions that load circuit files from `circuits/` or
//! inline TOML, run them through elaboration and simulation, and compare
//! the resulting histories in integration tests.

#![warn(missing_docs)]

use std::path::PathBuf;

use wavesim_common::Logic;
use wavesim_config::{load_circuit, load_circuit_from_str, CircuitConfig, ConfigError};
use wavesim_sim::{SimResult, SimTime, Transition, Waveforms};

/// Directory holding the bundled scenario circuits.
pub fn circuits_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("circuits")
}

/// Loads `circuits/<name>.toml`.
pub fn load_scenario(name: &str) -> Result<CircuitConfig, ConfigError> {
    load_circuit(&circuits_dir().join(format!("{name}.toml")))
}

/// Loads and simulates `circuits/<name>.toml`.
pub fn run_scenario(name: &str) -> Result<SimResult, ConfigError> {
    load_scenario(name)?.simulate()
}

/// Parses and simulates an inline circuit description.
pub fn run_toml(source: &str) -> Result<SimResult, ConfigError> {
    load_circuit_from_str(source)?.simulate()
}

/// Builds a history from `(time, 0|1)` pairs.
pub fn history(points: &[(u64, u8)]) -> Vec<Transition> {
    points
        .iter()
        .map(|&(t, v)| (SimTime::new(t), Logic::from(v != 0)))
        .collect()
}

/// Returns the history of `signal` as `(time, 0|1)` pairs, or `None` if the
/// signal was not simulated.
pub fn points(waves: &Waveforms, signal: &str) -> Option<Vec<(u64, u8)>> {
    waves
        .get(signal)
        .map(|h| h.iter().map(|&(t, v)| (t.units(), u8::from(v))).collect())
}
