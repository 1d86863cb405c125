//! Combinational gates, D flip-flops, and the gate evaluator.
//!
//! [`GateKind`] is a closed set: a kind string is parsed once, when a
//! [`Gate`] is built or deserialized, so an unsupported kind never reaches
//! the event loop.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wavesim_common::Logic;

use crate::error::SimError;

/// The Boolean function computed by a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GateKind {
    /// 1 iff every input is 1.
    And,
    /// 1 iff at least one input is 1.
    Or,
    /// Complement of its single input.
    Not,
    /// Complement of AND.
    Nand,
    /// Complement of OR.
    Nor,
    /// 1 iff an odd number of inputs are 1.
    Xor,
}

impl GateKind {
    /// All supported kinds.
    pub const ALL: [GateKind; 6] = [
        GateKind::And,
        GateKind::Or,
        GateKind::Not,
        GateKind::Nand,
        GateKind::Nor,
        GateKind::Xor,
    ];

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Not => "NOT",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
        }
    }

    /// Returns `true` if a gate of this kind may have `inputs` inputs.
    pub fn accepts_arity(self, inputs: usize) -> bool {
        match self {
            GateKind::Not => inputs == 1,
            _ => inputs >= 1,
        }
    }

    /// Computes the output for the given input levels.
    ///
    /// XOR generalizes to N inputs by parity. Callers are expected to have
    /// checked arity with [`accepts_arity`](Self::accepts_arity).
    pub fn evaluate<I>(self, inputs: I) -> Logic
    where
        I: IntoIterator<Item = Logic>,
    {
        let mut inputs = inputs.into_iter();
        let Some(first) = inputs.next() else {
            return match self {
                GateKind::And | GateKind::Nor | GateKind::Not => Logic::One,
                GateKind::Or | GateKind::Nand | GateKind::Xor => Logic::Zero,
            };
        };
        match self {
            GateKind::And => inputs.fold(first, |acc, v| acc & v),
            GateKind::Or => inputs.fold(first, |acc, v| acc | v),
            GateKind::Not => !first,
            GateKind::Nand => !inputs.fold(first, |acc, v| acc & v),
            GateKind::Nor => !inputs.fold(first, |acc, v| acc | v),
            GateKind::Xor => inputs.fold(first, |acc, v| acc ^ v),
        }
    }
}

impl FromStr for GateKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GateKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimError::UnsupportedGateType { kind: s.to_string() })
    }
}

impl TryFrom<String> for GateKind {
    type Error = SimError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<GateKind> for String {
    fn from(k: GateKind) -> Self {
        k.name().to_string()
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A combinational logic element.
///
/// The output is a pure function of the inputs at the instant one of them
/// changes, and becomes visible `delay` time units later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// Reference name; not used functionally.
    pub name: String,
    /// The Boolean function.
    #[serde(rename = "type")]
    pub kind: GateKind,
    /// Input signal names, in order.
    pub inputs: Vec<String>,
    /// Output signal name.
    pub output: String,
    /// Propagation delay in time units.
    pub delay: u64,
}

impl Gate {
    /// Builds a gate from a kind string, rejecting unsupported kinds.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        kind: &str,
        inputs: impl IntoIterator<Item = S>,
        output: impl Into<String>,
        delay: u64,
    ) -> Result<Self, SimError> {
        Ok(Self::with_kind(name, kind.parse()?, inputs, output, delay))
    }

    /// Builds a gate from an already-parsed kind.
    pub fn with_kind<S: Into<String>>(
        name: impl Into<String>,
        kind: GateKind,
        inputs: impl IntoIterator<Item = S>,
        output: impl Into<String>,
        delay: u64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: output.into(),
            delay,
        }
    }

    pub(crate) fn check_arity(&self) -> Result<(), SimError> {
        if self.kind.accepts_arity(self.inputs.len()) {
            Ok(())
        } else {
            Err(SimError::InvalidArity {
                gate: self.name.clone(),
                kind: self.kind.to_string(),
                inputs: self.inputs.len(),
            })
        }
    }
}

/// A rising-edge D flip-flop.
///
/// On a 0→1 transition of `clk`, samples `d`; if that differs from `q`,
/// the new value appears on `q` after `delay` time units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dff {
    /// Reference name.
    pub name: String,
    /// Data input signal name.
    pub d: String,
    /// Clock signal name.
    pub clk: String,
    /// Output signal name.
    pub q: String,
    /// Clock-to-Q delay in time units.
    pub delay: u64,
}

impl Dff {
    /// Creates a flip-flop.
    pub fn new(
        name: impl Into<String>,
        d: impl Into<String>,
        clk: impl Into<String>,
        q: impl Into<String>,
        delay: u64,
    ) -> Self {
        Self {
            name: name.into(),
            d: d.into(),
            clk: clk.into(),
            q: q.into(),
            delay,
        }
    }
}

/// Evaluates a gate against a name-keyed signal map.
///
/// Every input name must be present in `signals`; a missing one is
/// [`SimError::UndefinedSignal`].
pub fn eval_gate(gate: &Gate, signals: &BTreeMap<String, Logic>) -> Result<Logic, SimError> {
    gate.check_arity()?;
    let inputs = gate
        .inputs
        .iter()
        .map(|name| {
            signals
                .get(name)
                .copied()
                .ok_or_else(|| SimError::UndefinedSignal {
                    signal: name.clone(),
                    referenced_by: format!("gate '{}'", gate.name),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(gate.kind.evaluate(inputs))
}
