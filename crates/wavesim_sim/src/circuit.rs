//! Circuit validation and the static fanout indexes.
//!
//! [`CircuitBuilder::build`] declares every signal up front (primary inputs,
//! gate outputs, flip-flop outputs) and rejects malformed netlists before a
//! simulation starts. Signal IDs are assigned in lexicographic name order, so
//! comparing two [`SignalId`]s gives the same answer as comparing names.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;
use wavesim_common::{define_id, Arena, Logic};

use crate::error::SimError;
use crate::gate::{Dff, Gate, GateKind};

define_id!(
    /// Opaque ID for a declared signal.
    SignalId
);

define_id!(
    /// Opaque ID for a gate in a [`Circuit`].
    GateId
);

define_id!(
    /// Opaque ID for a flip-flop in a [`Circuit`].
    DffId
);

/// What produces a signal's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Driver {
    /// Driven only by initial value and stimulus.
    Primary,
    /// Output of a gate.
    Gate(GateId),
    /// `Q` of a flip-flop.
    Dff(DffId),
}

/// A declared signal.
#[derive(Clone, Debug)]
pub struct SignalDecl {
    /// Signal name.
    pub name: String,
    /// Value at time 0.
    pub initial: Logic,
    /// Producer of the signal.
    pub driver: Driver,
}

/// A gate with its signal names resolved to IDs.
#[derive(Clone, Debug)]
pub(crate) struct GateNode {
    pub kind: GateKind,
    pub inputs: Vec<SignalId>,
    pub output: SignalId,
    pub delay: u64,
}

/// A flip-flop with its signal names resolved to IDs.
#[derive(Clone, Debug)]
pub(crate) struct DffNode {
    pub d: SignalId,
    pub clk: SignalId,
    pub q: SignalId,
    pub delay: u64,
}

/// A validated, immutable gate/flip-flop network.
#[derive(Clone, Debug)]
pub struct Circuit {
    signals: Arena<SignalId, SignalDecl>,
    by_name: BTreeMap<String, SignalId>,
    gates: Arena<GateId, Gate>,
    gate_nodes: Arena<GateId, GateNode>,
    dffs: Arena<DffId, Dff>,
    dff_nodes: Arena<DffId, DffNode>,
    /// Gates reading each signal, indexed by `SignalId`.
    fanout: Vec<Vec<GateId>>,
    /// Flip-flops clocked by each signal, indexed by `SignalId`.
    clocked: Vec<Vec<DffId>>,
}

impl Circuit {
    /// Validates a netlist with the given initial values.
    ///
    /// Equivalent to a [`CircuitBuilder`] with no extra stimulus inputs.
    pub fn new(
        gates: impl IntoIterator<Item = Gate>,
        dffs: impl IntoIterator<Item = Dff>,
        initial_signals: &BTreeMap<String, Logic>,
    ) -> Result<Self, SimError> {
        CircuitBuilder::new()
            .gates(gates)
            .dffs(dffs)
            .initial_values(initial_signals.iter().map(|(n, v)| (n.clone(), *v)))
            .build()
    }

    /// Looks up a signal by name.
    pub fn signal_id(&self, name: &str) -> Option<SignalId> {
        self.by_name.get(name).copied()
    }

    /// Returns the declaration of a signal.
    pub fn signal(&self, id: SignalId) -> &SignalDecl {
        &self.signals[id]
    }

    /// Iterates over all signals in name order.
    pub fn signals(&self) -> impl Iterator<Item = (SignalId, &SignalDecl)> {
        self.signals.iter()
    }

    /// Number of declared signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Number of gates.
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Number of flip-flops.
    pub fn dff_count(&self) -> usize {
        self.dffs.len()
    }

    /// Returns the gate descriptor for an ID.
    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id]
    }

    /// Returns the flip-flop descriptor for an ID.
    pub fn dff(&self, id: DffId) -> &Dff {
        &self.dffs[id]
    }

    /// Gates that read `signal`, in declaration order.
    pub fn fanout(&self, signal: SignalId) -> &[GateId] {
        &self.fanout[signal.as_raw() as usize]
    }

    /// Flip-flops clocked by `signal`, in declaration order.
    pub fn clocked_by(&self, signal: SignalId) -> &[DffId] {
        &self.clocked[signal.as_raw() as usize]
    }

    pub(crate) fn gate_node(&self, id: GateId) -> &GateNode {
        &self.gate_nodes[id]
    }

    pub(crate) fn dff_node(&self, id: DffId) -> &DffNode {
        &self.dff_nodes[id]
    }

    pub(crate) fn dff_ids(&self) -> impl Iterator<Item = DffId> {
        self.dffs.ids()
    }
}

/// Collects a netlist and its declared inputs, then validates it.
#[derive(Clone, Debug, Default)]
pub struct CircuitBuilder {
    gates: Vec<Gate>,
    dffs: Vec<Dff>,
    initial: BTreeMap<String, Logic>,
    inputs: BTreeSet<String>,
}

impl CircuitBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a gate.
    pub fn gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    /// Adds several gates.
    pub fn gates(mut self, gates: impl IntoIterator<Item = Gate>) -> Self {
        self.gates.extend(gates);
        self
    }

    /// Adds a flip-flop.
    pub fn dff(mut self, dff: Dff) -> Self {
        self.dffs.push(dff);
        self
    }

    /// Adds several flip-flops.
    pub fn dffs(mut self, dffs: impl IntoIterator<Item = Dff>) -> Self {
        self.dffs.extend(dffs);
        self
    }

    /// Sets a signal's value at time 0. Later calls for the same name win.
    pub fn initial(mut self, name: impl Into<String>, value: Logic) -> Self {
        self.initial.insert(name.into(), value);
        self
    }

    /// Sets several initial values.
    pub fn initial_values(mut self, values: impl IntoIterator<Item = (String, Logic)>) -> Self {
        self.initial.extend(values);
        self
    }

    /// Declares a stimulus-driven signal. It starts at 0 unless an initial
    /// value is also given.
    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.inputs.insert(name.into());
        self
    }

    /// Validates the netlist and builds the indexes.
    pub fn build(self) -> Result<Circuit, SimError> {
        let CircuitBuilder {
            gates,
            dffs,
            initial,
            inputs,
        } = self;

        let mut element_names = HashSet::new();
        for name in gates.iter().map(|g| &g.name).chain(dffs.iter().map(|f| &f.name)) {
            if !element_names.insert(name.as_str()) {
                return Err(SimError::DuplicateElement { name: name.clone() });
            }
        }

        let mut drivers: BTreeMap<&str, (Driver, String)> = BTreeMap::new();
        for (idx, gate) in gates.iter().enumerate() {
            if gate.name.is_empty() {
                return Err(SimError::EmptyName { what: "gate" });
            }
            gate.check_arity()?;
            claim_driver(
                &mut drivers,
                &gate.output,
                Driver::Gate(GateId::from_raw(idx as u32)),
                describe_gate(gate),
            )?;
        }
        for (idx, dff) in dffs.iter().enumerate() {
            if dff.name.is_empty() {
                return Err(SimError::EmptyName { what: "flip-flop" });
            }
            claim_driver(
                &mut drivers,
                &dff.q,
                Driver::Dff(DffId::from_raw(idx as u32)),
                describe_dff(dff),
            )?;
        }

        let mut declared: BTreeSet<&str> = drivers.keys().copied().collect();
        declared.extend(initial.keys().map(String::as_str));
        declared.extend(inputs.iter().map(String::as_str));
        if declared.contains("") {
            return Err(SimError::EmptyName { what: "signal" });
        }

        for gate in &gates {
            for input in &gate.inputs {
                require_declared(&declared, input, || describe_gate(gate))?;
            }
        }
        for dff in &dffs {
            require_declared(&declared, &dff.d, || describe_dff(dff))?;
            require_declared(&declared, &dff.clk, || describe_dff(dff))?;
        }

        let mut signals: Arena<SignalId, SignalDecl> = Arena::new();
        let mut by_name = BTreeMap::new();
        for name in &declared {
            let driver = drivers.get(name).map_or(Driver::Primary, |(d, _)| *d);
            let initial = initial.get(*name).copied().unwrap_or_default();
            let id = signals.alloc(SignalDecl {
                name: (*name).to_string(),
                initial,
                driver,
            });
            by_name.insert((*name).to_string(), id);
        }

        let mut fanout: Vec<Vec<GateId>> = vec![Vec::new(); signals.len()];
        let mut clocked: Vec<Vec<DffId>> = vec![Vec::new(); signals.len()];

        let mut gate_arena: Arena<GateId, Gate> = Arena::new();
        let mut gate_nodes: Arena<GateId, GateNode> = Arena::new();
        for gate in gates {
            let node = GateNode {
                kind: gate.kind,
                inputs: gate.inputs.iter().map(|n| by_name[n]).collect(),
                output: by_name[&gate.output],
                delay: gate.delay,
            };
            let id = gate_nodes.alloc(node);
            gate_arena.alloc(gate);
            let mut seen = HashSet::new();
            for &input in &gate_nodes[id].inputs {
                if seen.insert(input) {
                    fanout[input.as_raw() as usize].push(id);
                }
            }
        }

        let mut dff_arena: Arena<DffId, Dff> = Arena::new();
        let mut dff_nodes: Arena<DffId, DffNode> = Arena::new();
        for dff in dffs {
            let node = DffNode {
                d: by_name[&dff.d],
                clk: by_name[&dff.clk],
                q: by_name[&dff.q],
                delay: dff.delay,
            };
            let clk = node.clk;
            let id = dff_nodes.alloc(node);
            dff_arena.alloc(dff);
            clocked[clk.as_raw() as usize].push(id);
        }

        debug!(
            signals = signals.len(),
            gates = gate_arena.len(),
            dffs = dff_arena.len(),
            "circuit validated"
        );

        Ok(Circuit {
            signals,
            by_name,
            gates: gate_arena,
            gate_nodes,
            dffs: dff_arena,
            dff_nodes,
            fanout,
            clocked,
        })
    }
}

fn describe_gate(gate: &Gate) -> String {
    format!("gate '{}'", gate.name)
}

fn describe_dff(dff: &Dff) -> String {
    format!("flip-flop '{}'", dff.name)
}

fn claim_driver<'a>(
    drivers: &mut BTreeMap<&'a str, (Driver, String)>,
    signal: &'a str,
    driver: Driver,
    who: String,
) -> Result<(), SimError> {
    if let Some((_, first)) = drivers.get(signal) {
        return Err(SimError::MultipleDrivers {
            signal: signal.to_string(),
            first: first.clone(),
            second: who,
        });
    }
    drivers.insert(signal, (driver, who));
    Ok(())
}

fn require_declared(
    declared: &BTreeSet<&str>,
    signal: &str,
    who: impl FnOnce() -> String,
) -> Result<(), SimError> {
    if declared.contains(signal) {
        Ok(())
    } else {
        Err(SimError::UndefinedSignal {
            signal: signal.to_string(),
            referenced_by: who(),
        })
    }
}
