//! Simulation kernel: event queue, fanout propagation, and edge detection.
//!
//! [`SimKernel`] runs a single-shot discrete-event simulation of a validated
//! [`Circuit`] up to an inclusive horizon. Events pop in `(time, signal,
//! value)` order; since signal IDs follow name order, ties at one instant
//! resolve by signal name and then by value.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::mem;

use tracing::{debug, instrument, trace};
use wavesim_common::{Arena, Logic};

use crate::circuit::{Circuit, DffId, SignalId};
use crate::error::SimError;
use crate::stimulus::Stimulus;
use crate::time::SimTime;
use crate::waveform::{History, WaveformRecorder, Waveforms};

/// A scheduled signal change.
///
/// Field order defines the queue order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SimEvent {
    time: SimTime,
    signal: SignalId,
    value: Logic,
}

/// Runtime state of one signal.
#[derive(Clone, Debug)]
struct SignalState {
    value: Logic,
    history: History,
}

impl SignalState {
    fn new(initial: Logic) -> Self {
        Self {
            value: initial,
            history: vec![(SimTime::ZERO, initial)],
        }
    }

    /// Appends a change, keeping history times strictly increasing.
    ///
    /// A change at the same instant as the last entry replaces it, and is
    /// dropped entirely if it restores the entry before that.
    fn record(&mut self, time: SimTime, value: Logic) {
        if let Some(&(last, _)) = self.history.last() {
            if last == time {
                self.history.pop();
                if self.history.last().map(|&(_, v)| v) == Some(value) {
                    return;
                }
            }
        }
        self.history.push((time, value));
    }
}

/// Event counters for a completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Events that changed a signal.
    pub events_applied: u64,
    /// Events popped with a value equal to the signal's current value.
    pub events_suppressed: u64,
    /// Events never queued because they fell after the horizon.
    pub events_dropped: u64,
}

/// The result of a completed simulation run.
#[derive(Clone, Debug)]
pub struct SimResult {
    /// Change history of every signal.
    pub waveforms: Waveforms,
    /// Time of the last processed event, or zero if none.
    pub final_time: SimTime,
    /// Event counters.
    pub stats: SimStats,
}

/// The simulation kernel for one run over a [`Circuit`].
///
/// Construct with [`SimKernel::new`], queue inputs with
/// [`apply_stimulus`](SimKernel::apply_stimulus) or
/// [`schedule`](SimKernel::schedule), then call [`run`](SimKernel::run).
pub struct SimKernel<'c> {
    circuit: &'c Circuit,
    end_time: SimTime,
    current_time: SimTime,
    /// Min-heap event queue (earliest events first).
    event_queue: BinaryHeap<Reverse<SimEvent>>,
    signals: Arena<SignalId, SignalState>,
    /// Last observed clock level, per flip-flop.
    last_clock: Vec<Logic>,
    recorder: Option<Box<dyn WaveformRecorder + 'c>>,
    stats: SimStats,
}

impl<'c> SimKernel<'c> {
    /// Creates a kernel with every signal at its initial value.
    ///
    /// `end_time` is inclusive: events at exactly `end_time` are processed.
    pub fn new(circuit: &'c Circuit, end_time: SimTime) -> Self {
        let mut signals: Arena<SignalId, SignalState> = Arena::new();
        for (_, decl) in circuit.signals() {
            signals.alloc(SignalState::new(decl.initial));
        }
        let last_clock = circuit
            .dff_ids()
            .map(|id| {
                let clk = circuit.dff_node(id).clk;
                signals[clk].value
            })
            .collect();

        Self {
            circuit,
            end_time,
            current_time: SimTime::ZERO,
            event_queue: BinaryHeap::new(),
            signals,
            last_clock,
            recorder: None,
            stats: SimStats::default(),
        }
    }

    /// Attaches a waveform recorder.
    pub fn set_recorder(&mut self, recorder: Box<dyn WaveformRecorder + 'c>) {
        self.recorder = Some(recorder);
    }

    /// The inclusive horizon.
    pub fn end_time(&self) -> SimTime {
        self.end_time
    }

    /// Number of events waiting in the queue.
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }

    /// Queues a change. Returns `false` if `time` is past the horizon and the
    /// event was dropped.
    pub fn schedule(&mut self, time: SimTime, signal: SignalId, value: Logic) -> bool {
        if time > self.end_time {
            trace!(%time, signal = %self.circuit.signal(signal).name, "event past horizon dropped");
            self.stats.events_dropped += 1;
            return false;
        }
        self.event_queue.push(Reverse(SimEvent {
            time,
            signal,
            value,
        }));
        true
    }

    /// Queues every transition in `stimulus`.
    ///
    /// Every stimulus signal must be declared in the circuit.
    pub fn apply_stimulus(&mut self, stimulus: &Stimulus) -> Result<(), SimError> {
        for (name, transitions) in stimulus.iter() {
            let id = self
                .circuit
                .signal_id(name)
                .ok_or_else(|| SimError::UnknownSignal(name.to_string()))?;
            for &(time, value) in transitions {
                self.schedule(time, id, value);
            }
        }
        Ok(())
    }

    /// Runs until the queue is empty or the next event is past the horizon.
    #[instrument(skip(self), fields(end_time = self.end_time.units()))]
    pub fn run(mut self) -> Result<SimResult, SimError> {
        self.start_recording()?;

        while let Some(Reverse(event)) = self.event_queue.pop() {
            if event.time > self.end_time {
                break;
            }
            self.current_time = event.time;
            self.apply(event)?;
        }

        if let Some(rec) = &mut self.recorder {
            rec.finalize()?;
        }

        debug!(
            applied = self.stats.events_applied,
            suppressed = self.stats.events_suppressed,
            dropped = self.stats.events_dropped,
            final_time = self.current_time.units(),
            "simulation complete"
        );

        let circuit = self.circuit;
        let waveforms = self
            .signals
            .into_values()
            .zip(circuit.signals())
            .map(|(state, (_, decl))| (decl.name.clone(), state.history))
            .collect();

        Ok(SimResult {
            waveforms,
            final_time: self.current_time,
            stats: self.stats,
        })
    }

    fn start_recording(&mut self) -> Result<(), SimError> {
        let Some(rec) = &mut self.recorder else {
            return Ok(());
        };
        rec.begin_scope("circuit")?;
        for (id, decl) in self.circuit.signals() {
            rec.register_signal(id, &decl.name)?;
        }
        rec.end_scope()?;
        for (id, state) in self.signals.iter() {
            rec.record_change(SimTime::ZERO, id, state.value)?;
        }
        Ok(())
    }

    /// Applies one popped event and propagates it to gate and clock fanout.
    fn apply(&mut self, event: SimEvent) -> Result<(), SimError> {
        let SimEvent {
            time,
            signal,
            value,
        } = event;
        let circuit = self.circuit;

        let state = &mut self.signals[signal];
        if state.value == value {
            trace!(%time, signal = %circuit.signal(signal).name, "no-op event suppressed");
            self.stats.events_suppressed += 1;
            return Ok(());
        }
        state.value = value;
        state.record(time, value);
        self.stats.events_applied += 1;
        trace!(%time, signal = %circuit.signal(signal).name, %value, "signal changed");

        if let Some(rec) = &mut self.recorder {
            rec.record_change(time, signal, value)?;
        }

        for &gate_id in circuit.fanout(signal) {
            let gate = circuit.gate_node(gate_id);
            let out = gate
                .kind
                .evaluate(gate.inputs.iter().map(|&s| self.signals[s].value));
            if out != self.signals[gate.output].value {
                self.schedule_after(time, gate.delay, gate.output, out);
            }
        }

        for &dff_id in circuit.clocked_by(signal) {
            if self.take_rising_edge(dff_id, value) {
                let ff = circuit.dff_node(dff_id);
                let d = self.signals[ff.d].value;
                if d != self.signals[ff.q].value {
                    self.schedule_after(time, ff.delay, ff.q, d);
                }
            }
        }

        Ok(())
    }

    /// Updates a flip-flop's tracked clock level; `true` on a 0→1 transition.
    fn take_rising_edge(&mut self, dff: DffId, clock: Logic) -> bool {
        let prev = mem::replace(&mut self.last_clock[dff.as_raw() as usize], clock);
        prev == Logic::Zero && clock == Logic::One
    }

    fn schedule_after(&mut self, now: SimTime, delay: u64, signal: SignalId, value: Logic) {
        match now.checked_add(delay) {
            Some(time) => {
                self.schedule(time, signal, value);
            }
            None => self.stats.events_dropped += 1,
        }
    }
}
