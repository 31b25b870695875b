//! Run state: the mutable configuration of one machine run.

use crate::definition::{MachineDefinition, State, Symbol, TransitionRule};
use crate::error::CoreError;
use crate::trace::StepSnapshot;
use std::collections::VecDeque;
use std::sync::Arc;

/// Configuration of one run plus the rules used to reach it.
///
/// Every setter checks its value against the definition and leaves the
/// run untouched when the check fails.
#[derive(Debug, Clone)]
pub struct RunState {
    definition: Arc<MachineDefinition>,
    step: usize,
    state: State,
    input: VecDeque<Symbol>,
    stack: VecDeque<Symbol>,
    last_transition_rule: Option<u32>,
    last_grammar_rule: Option<String>,
}

impl RunState {
    /// Creates a run in the start state with no input.
    pub fn new(definition: Arc<MachineDefinition>) -> Self {
        Self {
            state: definition.start.clone(),
            definition,
            step: 0,
            input: VecDeque::new(),
            stack: VecDeque::new(),
            last_transition_rule: None,
            last_grammar_rule: None,
        }
    }

    /// Resets to the start state with `input` unread and an empty stack.
    pub fn reset(&mut self, input: &str) {
        self.step = 0;
        self.state = self.definition.start.clone();
        self.input = input.chars().collect();
        self.stack.clear();
        self.last_transition_rule = None;
        self.last_grammar_rule = None;
    }

    pub fn definition(&self) -> &Arc<MachineDefinition> {
        &self.definition
    }

    /// Number of transitions taken so far.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn input_front(&self) -> Option<Symbol> {
        self.input.front().copied()
    }

    pub fn stack_top(&self) -> Option<Symbol> {
        self.stack.front().copied()
    }

    /// Remaining input, front first.
    pub fn input_text(&self) -> String {
        self.input.iter().collect()
    }

    /// Stack contents, top first.
    pub fn stack_text(&self) -> String {
        self.stack.iter().collect()
    }

    pub fn last_transition_rule(&self) -> Option<u32> {
        self.last_transition_rule
    }

    pub fn last_grammar_rule(&self) -> Option<&str> {
        self.last_grammar_rule.as_deref()
    }

    /// Returns true if the current state is the accepting state.
    pub fn is_accepting(&self) -> bool {
        self.state == self.definition.end
    }

    pub fn set_state(&mut self, state: State) -> Result<(), CoreError> {
        self.check_state(&state)?;
        self.state = state;
        Ok(())
    }

    pub fn set_transition_rule(&mut self, rule: Option<u32>) -> Result<(), CoreError> {
        self.check_transition_rule(rule)?;
        self.last_transition_rule = rule;
        Ok(())
    }

    pub fn set_grammar_rule(&mut self, label: Option<String>) -> Result<(), CoreError> {
        self.check_grammar_rule(label.as_deref())?;
        self.last_grammar_rule = label;
        Ok(())
    }

    /// Fires `rule`: consumes its guards, moves to its target, records its
    /// identifiers, then pushes its symbols so the first ends up on top.
    ///
    /// All checks run before anything is mutated.
    pub fn apply_transition(&mut self, rule: &TransitionRule) -> Result<(), CoreError> {
        let action = &rule.action;
        self.check_state(&action.to)?;
        self.check_transition_rule(Some(action.rule))?;
        self.check_grammar_rule(action.label.as_deref())?;

        if rule.condition.input.is_some() {
            self.input.pop_front();
        }
        if rule.condition.stack.is_some() {
            self.stack.pop_front();
        }
        self.state = action.to.clone();
        self.last_transition_rule = Some(action.rule);
        self.last_grammar_rule = action.label.clone();
        for &symbol in action.push.iter().rev() {
            self.stack.push_front(symbol);
        }
        self.step += 1;
        Ok(())
    }

    /// Captures the current configuration for a trace renderer.
    pub fn snapshot(&self) -> StepSnapshot {
        StepSnapshot {
            step: self.step,
            state: self.state.as_str().to_string(),
            input: self.input_text(),
            stack: self.stack_text(),
            transition_rule: self.last_transition_rule,
            grammar_rule: self.last_grammar_rule.clone(),
        }
    }

    fn check_state(&self, state: &State) -> Result<(), CoreError> {
        if self.definition.has_state(state) {
            Ok(())
        } else {
            Err(CoreError::InvalidState {
                state: state.as_str().to_string(),
                known: self.definition.describe_states(),
            })
        }
    }

    fn check_transition_rule(&self, rule: Option<u32>) -> Result<(), CoreError> {
        match rule {
            Some(rule) if !self.definition.has_rule_number(rule) => {
                Err(CoreError::InvalidRuleNumber {
                    rule,
                    max: self.definition.action_count(),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_grammar_rule(&self, label: Option<&str>) -> Result<(), CoreError> {
        match label {
            Some(label) if !self.definition.has_label(label) => Err(CoreError::InvalidRuleLabel {
                label: label.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
