//! External input schedules and clock waveform generation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wavesim_common::Logic;

use crate::error::SimError;
use crate::time::SimTime;

/// A single `(time, value)` point on a waveform.
pub type Transition = (SimTime, Logic);

/// Scheduled transitions for primary inputs, keyed by signal name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stimulus(BTreeMap<String, Vec<Transition>>);

impl Stimulus {
    /// Creates an empty stimulus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one transition and returns `self` for chaining.
    pub fn set(mut self, signal: impl Into<String>, time: u64, value: Logic) -> Self {
        self.push(signal, time, value);
        self
    }

    /// Adds one transition.
    pub fn push(&mut self, signal: impl Into<String>, time: u64, value: Logic) {
        self.0
            .entry(signal.into())
            .or_default()
            .push((SimTime::new(time), value));
    }

    /// Appends several transitions for one signal.
    pub fn extend(
        &mut self,
        signal: impl Into<String>,
        transitions: impl IntoIterator<Item = Transition>,
    ) {
        self.0.entry(signal.into()).or_default().extend(transitions);
    }

    /// Appends a generated clock waveform for `signal`, up to and including
    /// `until`.
    pub fn add_clock(
        &mut self,
        signal: impl Into<String>,
        clock: &ClockSpec,
        until: SimTime,
    ) -> Result<(), SimError> {
        let wave = clock.waveform(until)?;
        self.extend(signal, wave);
        Ok(())
    }

    /// Transitions for one signal, in insertion order.
    pub fn transitions(&self, signal: &str) -> &[Transition] {
        self.0.get(signal).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over signal names that have transitions.
    pub fn signals(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(signal, transitions)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Transition])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns `true` if no signal has transitions.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

impl From<BTreeMap<String, Vec<Transition>>> for Stimulus {
    fn from(map: BTreeMap<String, Vec<Transition>>) -> Self {
        Self(map)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<Transition>)> for Stimulus {
    fn from_iter<T: IntoIterator<Item = (S, Vec<Transition>)>>(iter: T) -> Self {
        let mut stim = Stimulus::new();
        for (name, transitions) in iter {
            stim.extend(name, transitions);
        }
        stim
    }
}

fn default_start_level() -> Logic {
    Logic::One
}

/// A free-running square-wave clock.
///
/// Produces a point at time 0 with `start_level`, then toggles at every
/// half period for `cycles` full periods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSpec {
    /// Full period in time units. Must be even and non-zero.
    pub period: u64,
    /// Number of full cycles to generate.
    pub cycles: u32,
    /// Level at time 0.
    #[serde(default = "default_start_level")]
    pub start_level: Logic,
}

impl ClockSpec {
    /// Creates a clock starting high.
    pub fn new(period: u64, cycles: u32) -> Self {
        Self {
            period,
            cycles,
            start_level: Logic::One,
        }
    }

    /// Sets the level at time 0.
    pub fn starting_at(mut self, level: Logic) -> Self {
        self.start_level = level;
        self
    }

    /// Generates the `(time, level)` points of this clock up to and
    /// including `until`.
    ///
    /// Cycles that would end past `until` are cut short, so the result never
    /// holds more than `until / (period / 2) + 1` points.
    pub fn waveform(&self, until: SimTime) -> Result<Vec<Transition>, SimError> {
        let half = self.half_period()?;
        let mut level = self.start_level;
        let mut points = vec![(SimTime::ZERO, level)];
        let mut t = 0u64;
        for _ in 0..self.toggles() {
            t = match t.checked_add(half) {
                Some(next) if next <= until.units() => next,
                _ => break,
            };
            level = !level;
            points.push((SimTime::new(t), level));
        }
        Ok(points)
    }

    /// Number of level changes in `[0, until]`.
    pub fn toggles_until(&self, until: SimTime) -> Result<u64, SimError> {
        let half = self.half_period()?;
        Ok(self.toggles().min(until.units() / half))
    }

    fn toggles(&self) -> u64 {
        2 * u64::from(self.cycles)
    }

    fn half_period(&self) -> Result<u64, SimError> {
        if self.period == 0 || !self.period.is_multiple_of(2) {
            return Err(SimError::InvalidClock {
                period: self.period,
            });
        }
        Ok(self.period / 2)
    }
}
