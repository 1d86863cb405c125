//! Shared foundational types for the wavesim logic timing simulator.
//!
//! This crate provides the two-state [`Logic`] value carried by every signal
//! and the dense, ID-indexed [`Arena`] used for signal and element tables.

#![warn(missing_docs)]

pub mod arena;
pub mod logic;

pub use arena::{Arena, ArenaId};
pub use logic::{InvalidLogicValue, Logic};
