//! Parsing and validation of circuit description files.
//!
//! A circuit file is TOML describing a gate and flip-flop netlist, initial
//! signal levels, input transitions and generated clocks. This crate reads it
//! into a strongly-typed [`CircuitConfig`] that can be elaborated into a
//! [`wavesim_sim::Circuit`] and simulated.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod netlist;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_circuit, load_circuit_from_str, MAX_CLOCK_TOGGLES};
pub use types::*;
