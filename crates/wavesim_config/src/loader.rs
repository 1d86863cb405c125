//! Circuit file loading and validation.

use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;
use crate::types::CircuitConfig;

/// Upper bound on the level changes one generated clock may contribute
/// before `end_time`.
pub const MAX_CLOCK_TOGGLES: u64 = 10_000_000;

/// Loads and validates a circuit file.
///
/// A relative `simulation.vcd` path is rebased onto the file's directory.
pub fn load_circuit(path: &Path) -> Result<CircuitConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_circuit_from_str(&content)?;
    if let (Some(vcd), Some(dir)) = (&config.simulation.vcd, path.parent()) {
        if vcd.is_relative() {
            config.simulation.vcd = Some(dir.join(vcd));
        }
    }
    debug!(path = %path.display(), "loaded circuit file");
    Ok(config)
}

/// Parses and validates a circuit description from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_circuit_from_str(content: &str) -> Result<CircuitConfig, ConfigError> {
    let config: CircuitConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks consistency that the netlist validation pass cannot see.
fn validate_config(config: &CircuitConfig) -> Result<(), ConfigError> {
    for (name, clock) in &config.clocks {
        if !config.stimulus.transitions(name).is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "signal '{name}' has both a clock and a stimulus"
            )));
        }
        // Bad periods are reported as `SimError::InvalidClock` at build time.
        if let Ok(toggles) = clock.toggles_until(config.simulation.end_time) {
            if toggles > MAX_CLOCK_TOGGLES {
                return Err(ConfigError::ValidationError(format!(
                    "clock '{name}' toggles {toggles} times before end_time (limit {MAX_CLOCK_TOGGLES})"
                )));
            }
        }
    }
    if config.signals.keys().any(String::is_empty) {
        return Err(ConfigError::ValidationError(
            "signals: empty signal name".to_string(),
        ));
    }
    Ok(())
}
