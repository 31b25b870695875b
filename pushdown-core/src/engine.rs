//! Execution engine - runs one machine definition against one input.

use crate::definition::{MachineDefinition, MachineDefinitionRaw};
use crate::error::CoreError;
use crate::run::RunState;
use crate::trace::{StepSnapshot, TraceHeader, TraceSink};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Final outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The accepting state was reached.
    Accepted,
    /// No transition applied before the accepting state was reached.
    Rejected,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => f.write_str("accepted"),
            Verdict::Rejected => f.write_str("rejected"),
        }
    }
}

/// Result of a single [`Engine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A transition fired.
    Advanced { rule: u32 },
    /// The run is over.
    Halted(Verdict),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Halted(Verdict),
}

/// Runs one machine definition. Each call to [`Engine::process`] or
/// [`Engine::start`] resets the run state.
pub struct Engine {
    definition: Arc<MachineDefinition>,
    run: RunState,
    phase: Phase,
}

impl Engine {
    /// Creates an engine for an already validated definition.
    pub fn new(definition: Arc<MachineDefinition>) -> Self {
        Self {
            run: RunState::new(definition.clone()),
            definition,
            phase: Phase::Idle,
        }
    }

    /// Validates `raw` and creates an engine for it.
    pub fn from_raw(raw: MachineDefinitionRaw) -> Result<Self, CoreError> {
        Ok(Self::new(Arc::new(MachineDefinition::from_raw(raw)?)))
    }

    pub fn definition(&self) -> &Arc<MachineDefinition> {
        &self.definition
    }

    /// Current run state.
    pub fn run(&self) -> &RunState {
        &self.run
    }

    /// Verdict of the last run, if it has halted.
    pub fn verdict(&self) -> Option<Verdict> {
        match self.phase {
            Phase::Halted(verdict) => Some(verdict),
            _ => None,
        }
    }

    /// Runs `input` to a verdict, reporting every configuration to `sink`.
    ///
    /// There is no step limit: a table that never reaches the accepting
    /// state and always has an applicable transition runs forever.
    pub fn process(
        &mut self,
        input: &str,
        mut sink: Option<&mut dyn TraceSink>,
    ) -> Result<Verdict, CoreError> {
        self.start(input);

        if let Some(sink) = sink.as_deref_mut() {
            sink.begin(&self.header(input))?;
            sink.step(&self.snapshot())?;
        }

        let verdict = loop {
            match self.step()? {
                Step::Advanced { .. } => {
                    if let Some(sink) = sink.as_deref_mut() {
                        sink.step(&self.snapshot())?;
                    }
                }
                Step::Halted(verdict) => break verdict,
            }
        };

        if let Some(sink) = sink.as_deref_mut() {
            sink.finish(verdict)?;
        }
        Ok(verdict)
    }

    /// Resets the run state for `input` without taking any transition.
    pub fn start(&mut self, input: &str) {
        self.run.reset(input);
        self.phase = Phase::Running;
        tracing::trace!(machine = %self.definition.name, input, "run started");
    }

    /// Takes one transition.
    ///
    /// Once halted, further calls return the same verdict. Fails with
    /// [`CoreError::NotRunning`] before the first [`Engine::start`].
    pub fn step(&mut self) -> Result<Step, CoreError> {
        match self.phase {
            Phase::Running => {}
            Phase::Halted(verdict) => return Ok(Step::Halted(verdict)),
            Phase::Idle => return Err(CoreError::NotRunning),
        }

        if self.run.is_accepting() {
            return Ok(self.halt(Verdict::Accepted));
        }

        let definition = Arc::clone(&self.definition);
        let input_front = self.run.input_front();
        let stack_top = self.run.stack_top();
        let Some(rule) = definition.select(self.run.state(), input_front, stack_top) else {
            return Ok(self.halt(Verdict::Rejected));
        };

        self.run.apply_transition(rule)?;

        tracing::trace!(
            step = self.run.step(),
            rule = rule.action.rule,
            state = %self.run.state(),
            "transition"
        );
        Ok(Step::Advanced {
            rule: rule.action.rule,
        })
    }

    /// Captures the current configuration.
    pub fn snapshot(&self) -> StepSnapshot {
        self.run.snapshot()
    }

    fn header(&self, input: &str) -> TraceHeader {
        TraceHeader {
            machine: self.definition.name.clone(),
            checksum: self.definition.checksum.clone(),
            input: input.to_string(),
            widths: self.definition.widths(),
        }
    }

    fn halt(&mut self, verdict: Verdict) -> Step {
        self.phase = Phase::Halted(verdict);
        tracing::debug!(
            machine = %self.definition.name,
            steps = self.run.step(),
            state = %self.run.state(),
            %verdict,
            "run halted"
        );
        Step::Halted(verdict)
    }
}
