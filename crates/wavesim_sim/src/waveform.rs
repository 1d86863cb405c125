//! Per-signal change histories and waveform file output.
//!
//! [`Waveforms`] is the hand-off format for renderers: signal name mapped to
//! a chronological list of `(time, value)` points starting at time 0. The
//! [`WaveformRecorder`] trait streams the same changes to a file format while
//! the kernel runs; [`VcdRecorder`] writes IEEE 1364 Value Change Dump text.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wavesim_common::Logic;

use crate::circuit::SignalId;
use crate::error::SimError;
use crate::stimulus::Transition;
use crate::time::{SimTime, TimeUnit};

/// Chronological value history of one signal.
pub type History = Vec<Transition>;

/// Change histories for every signal in a simulation run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Waveforms(BTreeMap<String, History>);

impl Waveforms {
    /// Returns the history of a signal.
    pub fn get(&self, signal: &str) -> Option<&[Transition]> {
        self.0.get(signal).map(Vec::as_slice)
    }

    /// Returns the value a signal holds at `time`, if the signal exists.
    pub fn value_at(&self, signal: &str, time: SimTime) -> Option<Logic> {
        let history = self.0.get(signal)?;
        let idx = history.partition_point(|(t, _)| *t <= time);
        idx.checked_sub(1).map(|i| history[i].1)
    }

    /// Iterates over `(signal, history)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Transition])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterates over signal names.
    pub fn signals(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of signals.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no signals.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keeps only the named signals, e.g. the rows a diagram should show.
    pub fn select<'a>(&self, signals: impl IntoIterator<Item = &'a str>) -> Waveforms {
        Waveforms(
            signals
                .into_iter()
                .filter_map(|name| self.0.get_key_value(name))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Unwraps the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, History> {
        self.0
    }
}

impl FromIterator<(String, History)> for Waveforms {
    fn from_iter<T: IntoIterator<Item = (String, History)>>(iter: T) -> Self {
        Waveforms(iter.into_iter().collect())
    }
}

/// Trait for streaming simulation waveforms to an output format.
pub trait WaveformRecorder {
    /// Opens a new scope (hierarchy level).
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError>;

    /// Registers a one-bit signal for recording.
    fn register_signal(&mut self, id: SignalId, name: &str) -> Result<(), SimError>;

    /// Closes the current scope.
    fn end_scope(&mut self) -> Result<(), SimError>;

    /// Records a value change. Times are non-decreasing across calls.
    fn record_change(&mut self, time: SimTime, id: SignalId, value: Logic) -> Result<(), SimError>;

    /// Flushes output and writes any trailer.
    fn finalize(&mut self) -> Result<(), SimError>;
}

/// VCD (Value Change Dump) recorder following IEEE 1364.
///
/// Identifier codes use printable ASCII starting at `!` (0x21). Spaces in
/// signal names are written as underscores, and a reference that is already
/// taken in the scope gets a `_N` suffix. Values at the first recorded
/// instant form the `$dumpvars` block.
pub struct VcdRecorder<W: Write> {
    writer: W,
    unit: TimeUnit,
    id_codes: HashMap<SignalId, String>,
    references: HashSet<String>,
    next_id: u32,
    header_written: bool,
    current_time: Option<SimTime>,
    in_dumpvars: bool,
}

impl<W: Write> VcdRecorder<W> {
    /// Creates a recorder with a `1ns` timescale.
    pub fn new(writer: W) -> Self {
        Self::with_unit(writer, TimeUnit::default())
    }

    /// Creates a recorder with a `1<unit>` timescale.
    pub fn with_unit(writer: W, unit: TimeUnit) -> Self {
        Self {
            writer,
            unit,
            id_codes: HashMap::new(),
            references: HashSet::new(),
            next_id: 0,
            header_written: false,
            current_time: None,
            in_dumpvars: false,
        }
    }

    /// Consumes the recorder, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self) -> Result<(), SimError> {
        if self.header_written {
            return Ok(());
        }
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  wavesim")?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale")?;
        writeln!(self.writer, "  1{}", self.unit)?;
        writeln!(self.writer, "$end")?;
        self.header_written = true;
        Ok(())
    }

    /// Generates a VCD identifier code from a sequential index.
    fn make_id_code(index: u32) -> String {
        let mut result = String::new();
        let mut idx = index;
        loop {
            result.push((b'!' + (idx % 94) as u8) as char);
            idx /= 94;
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
        result
    }

    fn reference_name(name: &str) -> String {
        name.chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect()
    }

    /// A reference for `name` not yet used in this file.
    fn unique_reference(&mut self, name: &str) -> String {
        let base = Self::reference_name(name);
        let mut reference = base.clone();
        let mut n = 1u32;
        while self.references.contains(&reference) {
            reference = format!("{base}_{n}");
            n += 1;
        }
        if reference != base {
            debug!(signal = name, reference = %reference, "VCD reference renamed to avoid a clash");
        }
        self.references.insert(reference.clone());
        reference
    }

    fn close_dumpvars(&mut self) -> Result<(), SimError> {
        if self.in_dumpvars {
            writeln!(self.writer, "$end")?;
            self.in_dumpvars = false;
        }
        Ok(())
    }
}

impl<W: Write> WaveformRecorder for VcdRecorder<W> {
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
        self.write_header()?;
        writeln!(self.writer, "$scope module {} $end", Self::reference_name(name))?;
        Ok(())
    }

    fn register_signal(&mut self, id: SignalId, name: &str) -> Result<(), SimError> {
        self.write_header()?;
        let code = Self::make_id_code(self.next_id);
        self.next_id += 1;
        let reference = self.unique_reference(name);
        writeln!(self.writer, "$var wire 1 {code} {reference} $end")?;
        self.id_codes.insert(id, code);
        Ok(())
    }

    fn end_scope(&mut self) -> Result<(), SimError> {
        writeln!(self.writer, "$upscope $end")?;
        Ok(())
    }

    fn record_change(&mut self, time: SimTime, id: SignalId, value: Logic) -> Result<(), SimError> {
        self.write_header()?;
        if self.current_time != Some(time) {
            if self.current_time.is_none() {
                writeln!(self.writer, "$enddefinitions $end")?;
                writeln!(self.writer, "#{}", time.units())?;
                writeln!(self.writer, "$dumpvars")?;
                self.in_dumpvars = true;
            } else {
                self.close_dumpvars()?;
                writeln!(self.writer, "#{}", time.units())?;
            }
            self.current_time = Some(time);
        }
        let code = self
            .id_codes
            .get(&id)
            .ok_or_else(|| SimError::UnknownSignal(format!("unregistered VCD signal {}", id.as_raw())))?;
        writeln!(self.writer, "{value}{code}")?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        if self.current_time.is_none() {
            self.write_header()?;
            writeln!(self.writer, "$enddefinitions $end")?;
        }
        self.close_dumpvars()?;
        self.writer.flush()?;
        Ok(())
    }
}
