//! Simulation error types for circuit construction and execution.
//!
//! All errors that can occur while validating a circuit or running the
//! event loop are represented as variants of [`SimError`]. Events dropped
//! beyond the horizon and no-op events are not errors.

use std::io;

/// Errors that can occur during simulation setup or execution.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A gate kind string does not name a supported gate.
    #[error("unsupported gate type '{kind}'")]
    UnsupportedGateType {
        /// The rejected gate kind string.
        kind: String,
    },

    /// A signal is read but has no producer and no initial value.
    #[error("undefined signal '{signal}' referenced by {referenced_by}")]
    UndefinedSignal {
        /// The missing signal name.
        signal: String,
        /// The gate or flip-flop that references it.
        referenced_by: String,
    },

    /// A signal is the output of more than one gate or flip-flop.
    #[error("signal '{signal}' is driven by both {first} and {second}")]
    MultipleDrivers {
        /// The doubly driven signal.
        signal: String,
        /// The element declared first.
        first: String,
        /// The conflicting element.
        second: String,
    },

    /// Two circuit elements share a name.
    #[error("duplicate element name '{name}'")]
    DuplicateElement {
        /// The repeated element name.
        name: String,
    },

    /// A gate has the wrong number of inputs for its kind.
    #[error("gate '{gate}' of type {kind} cannot take {inputs} input(s)")]
    InvalidArity {
        /// The gate name.
        gate: String,
        /// The gate kind.
        kind: String,
        /// The number of inputs it was given.
        inputs: usize,
    },

    /// An element or signal name is empty.
    #[error("empty {what} name")]
    EmptyName {
        /// What kind of name was empty ("signal", "gate", "flip-flop").
        what: &'static str,
    },

    /// A signal name is not part of the circuit.
    #[error("unknown signal '{0}'")]
    UnknownSignal(String),

    /// A clock spec cannot be expressed in integral time.
    #[error("invalid clock period {period}: must be even and non-zero")]
    InvalidClock {
        /// The rejected period.
        period: u64,
    },

    /// An I/O error occurred while writing waveform data.
    #[error("waveform I/O error: {0}")]
    WaveformIo(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_gate_type_display() {
        let e = SimError::UnsupportedGateType {
            kind: "BUFFER".into(),
        };
        assert_eq!(e.to_string(), "unsupported gate type 'BUFFER'");
    }

    #[test]
    fn undefined_signal_display() {
        let e = SimError::UndefinedSignal {
            signal: "EN".into(),
            referenced_by: "gate 'G3'".into(),
        };
        assert_eq!(e.to_string(), "undefined signal 'EN' referenced by gate 'G3'");
    }

    #[test]
    fn multiple_drivers_display() {
        let e = SimError::MultipleDrivers {
            signal: "X".into(),
            first: "gate 'G1'".into(),
            second: "flip-flop 'FF'".into(),
        };
        assert_eq!(
            e.to_string(),
            "signal 'X' is driven by both gate 'G1' and flip-flop 'FF'"
        );
    }

    #[test]
    fn invalid_arity_display() {
        let e = SimError::InvalidArity {
            gate: "N1".into(),
            kind: "NOT".into(),
            inputs: 2,
        };
        assert_eq!(e.to_string(), "gate 'N1' of type NOT cannot take 2 input(s)");
    }

    #[test]
    fn invalid_clock_display() {
        let e = SimError::InvalidClock { period: 7 };
        assert_eq!(
            e.to_string(),
            "invalid clock period 7: must be even and non-zero"
        );
    }

    #[test]
    fn waveform_io_display() {
        let e = SimError::WaveformIo(io::Error::other("disk full"));
        assert!(e.to_string().contains("waveform I/O error"));
    }
}
