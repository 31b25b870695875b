//! Per-step trace records and the sink interface renderers implement.

use crate::definition::DisplayWidths;
use crate::engine::Verdict;
use serde::Serialize;
use std::io;

pub const STEP_HEADER: &str = "Step";
pub const STATE_HEADER: &str = "State";
pub const INPUT_HEADER: &str = "Unread input";
pub const STACK_HEADER: &str = "Stack";
pub const TRANSITION_RULE_HEADER: &str = "Delta";
pub const GRAMMAR_RULE_HEADER: &str = "R";

/// Emitted once before the first step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceHeader {
    /// Machine name.
    pub machine: String,
    /// Definition checksum.
    pub checksum: String,
    /// The full input of this run.
    pub input: String,
    /// Column widths derived from the definition.
    pub widths: DisplayWidths,
}

impl TraceHeader {
    /// Number of input symbols in this run.
    pub fn input_len(&self) -> usize {
        self.input.chars().count()
    }
}

/// The configuration at one step, plus the rules used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSnapshot {
    /// Number of transitions taken before this configuration.
    pub step: usize,
    pub state: String,
    /// Remaining input, front first. Empty when exhausted.
    pub input: String,
    /// Stack contents, top first. Empty when the stack is empty.
    pub stack: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_rule: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_rule: Option<String>,
}

/// Receives the trace of a run.
pub trait TraceSink {
    /// Called once before the initial configuration.
    fn begin(&mut self, _header: &TraceHeader) -> io::Result<()> {
        Ok(())
    }

    /// Called for the initial configuration and after every transition.
    fn step(&mut self, snapshot: &StepSnapshot) -> io::Result<()>;

    /// Called once when the run halts.
    fn finish(&mut self, _verdict: Verdict) -> io::Result<()> {
        Ok(())
    }
}

/// Collects a run's trace in memory.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub header: Option<TraceHeader>,
    pub steps: Vec<StepSnapshot>,
    pub verdict: Option<Verdict>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceSink for Recorder {
    fn begin(&mut self, header: &TraceHeader) -> io::Result<()> {
        self.header = Some(header.clone());
        self.steps.clear();
        self.verdict = None;
        Ok(())
    }

    fn step(&mut self, snapshot: &StepSnapshot) -> io::Result<()> {
        self.steps.push(snapshot.clone());
        Ok(())
    }

    fn finish(&mut self, verdict: Verdict) -> io::Result<()> {
        self.verdict = Some(verdict);
        Ok(())
    }
}
