//! Configuration types deserialized from circuit TOML files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use wavesim_common::Logic;
use wavesim_sim::{ClockSpec, Dff, Gate, SimTime, Stimulus, TimeUnit};

/// A complete circuit description: netlist, initial levels and inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitConfig {
    /// Run settings.
    pub simulation: SimulationSection,
    /// Initial signal levels, keyed by signal name.
    #[serde(default)]
    pub signals: BTreeMap<String, Logic>,
    /// Combinational gates (`[[gate]]` tables).
    #[serde(default, rename = "gate")]
    pub gates: Vec<Gate>,
    /// Flip-flops (`[[dff]]` tables).
    #[serde(default, rename = "dff")]
    pub dffs: Vec<Dff>,
    /// Explicit input transitions as `NAME = [[time, value], ...]`.
    #[serde(default)]
    pub stimulus: Stimulus,
    /// Generated square-wave inputs.
    #[serde(default)]
    pub clocks: BTreeMap<String, ClockSpec>,
}

/// The `[simulation]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSection {
    /// Inclusive horizon.
    pub end_time: SimTime,
    /// Unit written to the VCD timescale.
    #[serde(default)]
    pub time_unit: TimeUnit,
    /// Optional VCD output path. Relative paths resolve against the
    /// directory of the circuit file when loaded with
    /// [`load_circuit`](crate::load_circuit).
    #[serde(default)]
    pub vcd: Option<PathBuf>,
}
