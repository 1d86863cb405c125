//! Discrete-event timing simulator for gate-level digital logic.
//!
//! Given a static netlist of combinational gates and rising-edge D
//! flip-flops, initial signal levels and a schedule of input transitions,
//! the simulator computes the ordered value changes of every signal up to an
//! inclusive time horizon. Each gate output appears `delay` time units after
//! the input change that caused it.
//!
//! # Usage
//!
//! ```
//! use std::collections::BTreeMap;
//! use wavesim_common::Logic;
//! use wavesim_sim::{simulate, Gate, SimTime, Stimulus};
//!
//! let gates = vec![Gate::new("G1", "AND", ["A", "B"], "X", 3)?];
//! let initial: BTreeMap<String, Logic> =
//!     [("A".into(), Logic::Zero), ("B".into(), Logic::Zero)].into();
//! let stimulus = Stimulus::new().set("A", 5, Logic::One).set("B", 10, Logic::One);
//!
//! let waves = simulate(&gates, &[], &initial, &stimulus, SimTime::new(40))?;
//! assert_eq!(waves.value_at("X", SimTime::new(13)), Some(Logic::One));
//! # Ok::<(), wavesim_sim::SimError>(())
//! ```
//!
//! # Modules
//!
//! - `error`: simulation error types
//! - `time`: integral simulation time and display units
//! - `gate`: gate kinds, gate and flip-flop descriptors, the gate evaluator
//! - `circuit`: netlist validation and fanout indexes
//! - `stimulus`: input schedules and clock generation
//! - `kernel`: the event queue and propagation loop
//! - `waveform`: change histories and VCD output

#![warn(missing_docs)]

pub mod circuit;
pub mod error;
pub mod gate;
pub mod kernel;
pub mod stimulus;
pub mod time;
pub mod waveform;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use wavesim_common::Logic;

pub use circuit::{Circuit, CircuitBuilder, DffId, Driver, GateId, SignalDecl, SignalId};
pub use error::SimError;
pub use gate::{eval_gate, Dff, Gate, GateKind};
pub use kernel::{SimKernel, SimResult, SimStats};
pub use stimulus::{ClockSpec, Stimulus, Transition};
pub use time::{SimTime, TimeUnit};
pub use waveform::{History, VcdRecorder, WaveformRecorder, Waveforms};

/// Options for a simulation run.
#[derive(Debug, Clone, Default)]
pub struct SimOptions {
    /// Inclusive horizon.
    pub end_time: SimTime,
    /// Unit written to the VCD timescale.
    pub time_unit: TimeUnit,
    /// If set, a VCD file is written here while the simulation runs.
    pub vcd_path: Option<PathBuf>,
}

/// Simulates a netlist and returns the change history of every signal.
///
/// Gate and flip-flop outputs not listed in `initial_signals` start at 0, as
/// do stimulus signals that nothing else declares.
pub fn simulate(
    gates: &[Gate],
    dffs: &[Dff],
    initial_signals: &BTreeMap<String, Logic>,
    input_transitions: &Stimulus,
    end_time: SimTime,
) -> Result<Waveforms, SimError> {
    let circuit = build_circuit(gates, dffs, initial_signals, input_transitions)?;
    let options = SimOptions {
        end_time,
        ..SimOptions::default()
    };
    Ok(run_simulation(&circuit, input_transitions, &options)?.waveforms)
}

/// Validates a netlist, declaring every stimulus signal as an input.
pub fn build_circuit(
    gates: &[Gate],
    dffs: &[Dff],
    initial_signals: &BTreeMap<String, Logic>,
    stimulus: &Stimulus,
) -> Result<Circuit, SimError> {
    stimulus
        .signals()
        .fold(
            CircuitBuilder::new()
                .gates(gates.iter().cloned())
                .dffs(dffs.iter().cloned())
                .initial_values(initial_signals.iter().map(|(n, v)| (n.clone(), *v))),
            CircuitBuilder::input,
        )
        .build()
}

/// Runs one simulation over a validated circuit.
///
/// Creates a [`SimKernel`], optionally attaches a VCD recorder, queues the
/// stimulus and runs to completion.
pub fn run_simulation(
    circuit: &Circuit,
    stimulus: &Stimulus,
    options: &SimOptions,
) -> Result<SimResult, SimError> {
    let mut kernel = SimKernel::new(circuit, options.end_time);

    if let Some(path) = &options.vcd_path {
        let writer = BufWriter::new(File::create(path)?);
        kernel.set_recorder(Box::new(VcdRecorder::with_unit(writer, options.time_unit)));
    }

    kernel.apply_stimulus(stimulus)?;
    kernel.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavesim_common::Logic::{One, Zero};

    fn pts(points: &[(u64, u8)]) -> Vec<Transition> {
        points
            .iter()
            .map(|&(t, v)| (SimTime::new(t), Logic::from(v == 1)))
            .collect()
    }

    fn inputs_ab() -> BTreeMap<String, Logic> {
        [("A".to_string(), Zero), ("B".to_string(), Zero)].into()
    }

    fn and_not() -> Vec<Gate> {
        vec![
            Gate::new("G1", "AND", ["A", "B"], "X", 3).unwrap(),
            Gate::new("G2", "NOT", ["X"], "Y", 2).unwrap(),
        ]
    }

    fn ab_stimulus() -> Stimulus {
        Stimulus::new().set("A", 5, One).set("B", 10, One)
    }

    #[test]
    fn and_truth_table_end_to_end() {
        let gates = vec![Gate::new("G1", "AND", ["A", "B"], "X", 3).unwrap()];
        let w = simulate(&gates, &[], &inputs_ab(), &ab_stimulus(), SimTime::new(40)).unwrap();
        assert_eq!(w.get("X").unwrap(), pts(&[(0, 0), (13, 1)]).as_slice());
    }

    #[test]
    fn not_chain_propagation() {
        let mut init = inputs_ab();
        init.insert("Y".into(), One);
        let w = simulate(&and_not(), &[], &init, &ab_stimulus(), SimTime::new(40)).unwrap();
        assert_eq!(w.get("X").unwrap(), pts(&[(0, 0), (13, 1)]).as_slice());
        assert_eq!(w.get("Y").unwrap(), pts(&[(0, 1), (15, 0)]).as_slice());
    }

    #[test]
    fn outputs_are_not_evaluated_at_time_zero() {
        // Y defaults to 0 even though NOT(X) is 1; the falling X edge is a no-op.
        let w = simulate(&and_not(), &[], &inputs_ab(), &ab_stimulus(), SimTime::new(40)).unwrap();
        assert_eq!(w.get("Y").unwrap(), pts(&[(0, 0)]).as_slice());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let stim = ab_stimulus().set("A", 20, Zero).set("B", 20, Zero);
        let first = simulate(&and_not(), &[], &inputs_ab(), &stim, SimTime::new(40)).unwrap();
        for _ in 0..5 {
            let again = simulate(&and_not(), &[], &inputs_ab(), &stim, SimTime::new(40)).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn histories_start_at_zero_and_increase() {
        let stim = ab_stimulus()
            .set("A", 0, One)
            .set("A", 20, Zero)
            .set("A", 21, One)
            .set("B", 21, Zero);
        let w = simulate(&and_not(), &[], &inputs_ab(), &stim, SimTime::new(60)).unwrap();
        for (name, history) in w.iter() {
            assert_eq!(history[0].0, SimTime::ZERO, "{name} must start at 0");
            assert!(
                history.windows(2).all(|p| p[0].0 < p[1].0),
                "{name} times must strictly increase: {history:?}"
            );
        }
    }

    #[test]
    fn late_events_do_not_change_results() {
        let base = simulate(&and_not(), &[], &inputs_ab(), &ab_stimulus(), SimTime::new(40)).unwrap();
        let with_late = ab_stimulus().set("A", 41, Zero).set("B", 100, Zero);
        let w = simulate(&and_not(), &[], &inputs_ab(), &with_late, SimTime::new(40)).unwrap();
        assert_eq!(base, w);
        assert!(w.iter().all(|(_, h)| h.iter().all(|(t, _)| t.units() <= 40)));
    }

    #[test]
    fn stimulus_only_signal_is_recorded() {
        let stim = ab_stimulus().set("LED", 7, One);
        let w = simulate(&and_not(), &[], &inputs_ab(), &stim, SimTime::new(40)).unwrap();
        assert_eq!(w.get("LED").unwrap(), pts(&[(0, 0), (7, 1)]).as_slice());
    }

    #[test]
    fn undriven_gate_input_fails() {
        let gates = vec![Gate::new("G1", "AND", ["A", "EN"], "X", 1).unwrap()];
        let err = simulate(&gates, &[], &inputs_ab(), &Stimulus::new(), SimTime::new(10)).unwrap_err();
        assert!(matches!(err, SimError::UndefinedSignal { .. }));
    }

    #[test]
    fn rising_edge_dff_end_to_end() {
        let dffs = vec![Dff::new("FF", "D", "CLK", "Q", 1)];
        let init: BTreeMap<String, Logic> = [("D".to_string(), One)].into();
        let mut stim = Stimulus::new();
        stim.add_clock("CLK", &ClockSpec::new(10, 2).starting_at(Zero), SimTime::new(30))
            .unwrap();
        // CLK: 0@0, 1@5, 0@10, 1@15, 0@20
        let w = simulate(&[], &dffs, &init, &stim, SimTime::new(30)).unwrap();
        assert_eq!(w.get("Q").unwrap(), pts(&[(0, 0), (6, 1)]).as_slice());
        assert_eq!(
            w.get("CLK").unwrap(),
            pts(&[(0, 0), (5, 1), (10, 0), (15, 1), (20, 0)]).as_slice()
        );
    }

    #[test]
    fn vcd_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("and.vcd");
        let mut init = inputs_ab();
        init.insert("Y".into(), One);
        let circuit = build_circuit(&and_not(), &[], &init, &ab_stimulus()).unwrap();
        let options = SimOptions {
            end_time: SimTime::new(40),
            time_unit: TimeUnit::Ps,
            vcd_path: Some(path.clone()),
        };
        let result = run_simulation(&circuit, &ab_stimulus(), &options).unwrap();
        assert_eq!(result.final_time, SimTime::new(15));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("1ps"));
        assert!(text.contains("#13"));
        assert!(text.contains("#15"));
    }
}
