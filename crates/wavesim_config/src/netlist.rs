//! Turning a parsed [`CircuitConfig`] into a validated circuit and stimulus.

use std::collections::BTreeMap;

use tracing::debug;
use wavesim_common::Logic;
use wavesim_sim::{build_circuit, run_simulation, Circuit, SimOptions, SimResult, Stimulus};

use crate::error::ConfigError;
use crate::types::CircuitConfig;

impl CircuitConfig {
    /// Explicit stimulus merged with the generated clock waveforms.
    pub fn stimulus(&self) -> Result<Stimulus, ConfigError> {
        let mut stimulus = self.stimulus.clone();
        for (name, clock) in &self.clocks {
            stimulus.add_clock(name.clone(), clock, self.simulation.end_time)?;
        }
        Ok(stimulus)
    }

    /// Initial levels, with clocks not listed in `[signals]` starting at
    /// their `start_level`.
    pub fn initial_levels(&self) -> BTreeMap<String, Logic> {
        let mut levels = self.signals.clone();
        for (name, clock) in &self.clocks {
            levels.entry(name.clone()).or_insert(clock.start_level);
        }
        levels
    }

    /// Validates the netlist and expands its inputs.
    pub fn build(&self) -> Result<(Circuit, Stimulus), ConfigError> {
        let stimulus = self.stimulus()?;
        let circuit = build_circuit(&self.gates, &self.dffs, &self.initial_levels(), &stimulus)?;
        debug!(
            signals = circuit.signal_count(),
            clocks = self.clocks.len(),
            "circuit file elaborated"
        );
        Ok((circuit, stimulus))
    }

    /// Run options from the `[simulation]` table.
    pub fn options(&self) -> SimOptions {
        SimOptions {
            end_time: self.simulation.end_time,
            time_unit: self.simulation.time_unit,
            vcd_path: self.simulation.vcd.clone(),
        }
    }

    /// Builds and simulates the described circuit.
    pub fn simulate(&self) -> Result<SimResult, ConfigError> {
        let (circuit, stimulus) = self.build()?;
        Ok(run_simulation(&circuit, &stimulus, &self.options())?)
    }
}
