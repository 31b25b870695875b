//! # pushdown-core
//!
//! Deterministic pushdown automaton engine.
//!
//! This crate provides:
//! - Transition table parsing and validation
//! - Run state with domain-checked setters
//! - The execution loop and single stepping
//! - Per-step snapshots for trace renderers

pub mod builtin;
pub mod definition;
pub mod engine;
pub mod error;
pub mod run;
pub mod trace;

pub use definition::{
    Action, Condition, DisplayWidths, MachineDefinition, MachineDefinitionRaw, Overlap,
    OverlapKind, RawTransition, State, Symbol, TransitionRule,
};
pub use engine::{Engine, Step, Verdict};
pub use error::{CoreError, StateRole};
pub use run::RunState;
pub use trace::{Recorder, StepSnapshot, TraceHeader, TraceSink};
