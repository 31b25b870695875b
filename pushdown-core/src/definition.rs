//! Machine definition types.
//!
//! Machine definitions use a JSON DSL. Entries under each state are tried in
//! the order they are declared; the first entry whose condition matches wins.
//!
//! ```json
//! {
//!   "name": "anbn",
//!   "start": "p",
//!   "end": "q$",
//!   "transitions": {
//!     "p":  [{"input": null, "stack": null, "to": "q", "push": "SZ", "rule": 1}],
//!     "q":  [{"input": "a", "to": "qa", "rule": 2},
//!            {"input": "$", "stack": "Z", "to": "q$", "rule": 3}],
//!     "qa": [{"stack": "S", "to": "qa", "push": "aSb", "rule": 4, "label": "S -> aSb"}]
//!   }
//! }
//! ```
//!
//! A `null` (or absent) `input`/`stack` guard means "don't care": the entry
//! neither inspects nor consumes that side.

use crate::error::{CoreError, StateRole};
use crate::trace::{GRAMMAR_RULE_HEADER, STATE_HEADER, TRANSITION_RULE_HEADER};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// A tape or stack symbol.
pub type Symbol = char;

/// A state in the machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(pub String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookahead condition of a transition. `None` means "don't care".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Condition {
    pub input: Option<Symbol>,
    pub stack: Option<Symbol>,
}

impl Condition {
    pub fn new(input: Option<Symbol>, stack: Option<Symbol>) -> Self {
        Self { input, stack }
    }

    /// Returns true if this condition accepts the observed input front and
    /// stack top.
    pub fn matches(&self, input_front: Option<Symbol>, stack_top: Option<Symbol>) -> bool {
        guard_matches(self.input, input_front) && guard_matches(self.stack, stack_top)
    }

    /// Returns true if every observation matched by `other` is also matched
    /// by `self`.
    pub fn subsumes(&self, other: &Condition) -> bool {
        (self.input.is_none() || self.input == other.input)
            && (self.stack.is_none() || self.stack == other.stack)
    }

    /// Returns true if some observation is matched by both conditions.
    pub fn overlaps(&self, other: &Condition) -> bool {
        guards_compatible(self.input, other.input) && guards_compatible(self.stack, other.stack)
    }
}

fn guard_matches(guard: Option<Symbol>, observed: Option<Symbol>) -> bool {
    match guard {
        None => true,
        Some(expected) => observed == Some(expected),
    }
}

fn guards_compatible(a: Option<Symbol>, b: Option<Symbol>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// What happens when a transition fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    /// Next state.
    pub to: State,
    /// Symbols pushed after the guards are consumed; the first symbol ends
    /// up on top.
    pub push: Vec<Symbol>,
    /// Transition rule number, in `1..=action_count`.
    pub rule: u32,
    /// Grammar production this transition corresponds to.
    pub label: Option<String>,
}

/// One validated table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRule {
    pub condition: Condition,
    pub action: Action,
}

/// One raw table entry as stored/transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransition {
    /// Expected next input symbol, consumed when the entry fires.
    #[serde(default)]
    pub input: Option<String>,

    /// Expected stack top, popped when the entry fires.
    #[serde(default)]
    pub stack: Option<String>,

    /// Target state.
    pub to: String,

    /// Symbols to push, top first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<String>,

    /// Transition rule number.
    pub rule: u32,

    /// Grammar rule label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RawTransition {
    /// Creates an entry that moves to `to` under rule number `rule`.
    pub fn new(to: impl Into<String>, rule: u32) -> Self {
        Self {
            input: None,
            stack: None,
            to: to.into(),
            push: None,
            rule,
            label: None,
        }
    }

    pub fn on_input(mut self, symbol: Symbol) -> Self {
        self.input = Some(symbol.to_string());
        self
    }

    pub fn on_stack(mut self, symbol: Symbol) -> Self {
        self.stack = Some(symbol.to_string());
        self
    }

    pub fn push(mut self, symbols: impl Into<String>) -> Self {
        self.push = Some(symbols.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Raw machine definition as stored/transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDefinitionRaw {
    /// Machine name, used in traces.
    #[serde(default)]
    pub name: String,

    /// Optional human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Start state.
    #[serde(default)]
    pub start: Option<String>,

    /// Accepting state.
    #[serde(default)]
    pub end: Option<String>,

    /// Ordered entries per source state.
    #[serde(default)]
    pub transitions: BTreeMap<String, Vec<RawTransition>>,
}

impl MachineDefinitionRaw {
    pub fn new(name: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            start: Some(start.into()),
            end: Some(end.into()),
            transitions: BTreeMap::new(),
        }
    }

    /// Appends entries for `state`, after any already declared for it.
    pub fn with_state(
        mut self,
        state: impl Into<String>,
        entries: impl IntoIterator<Item = RawTransition>,
    ) -> Self {
        self.transitions
            .entry(state.into())
            .or_default()
            .extend(entries);
        self
    }
}

/// Minimum column widths for trace rendering, fixed per definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayWidths {
    /// Longest state name (at least the header width).
    pub state: usize,
    /// Digits of the action count (at least the header width).
    pub transition_rule: usize,
    /// Longest grammar rule label (at least the header width).
    pub grammar_rule: usize,
}

/// How two entries of the same state interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapKind {
    /// The later entry can never fire.
    Shadowed,
    /// Both entries match some observation; declaration order decides.
    OrderDependent,
}

/// A lint finding about two entries of one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub state: State,
    pub kind: OverlapKind,
    /// Rule number of the entry declared first.
    pub first: u32,
    /// Rule number of the entry declared later.
    pub second: u32,
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OverlapKind::Shadowed => write!(
                f,
                "state '{}': rule {} is shadowed by rule {} and can never fire",
                self.state, self.second, self.first
            ),
            OverlapKind::OrderDependent => write!(
                f,
                "state '{}': rules {} and {} overlap; rule {} wins by declaration order",
                self.state, self.first, self.second, self.first
            ),
        }
    }
}

/// Validated and indexed machine definition.
#[derive(Debug, Clone)]
pub struct MachineDefinition {
    /// Machine name.
    pub name: String,

    /// Start state.
    pub start: State,

    /// Accepting state.
    pub end: State,

    /// Closed state set: start, end, every source and every target.
    states: BTreeSet<State>,

    /// Entries per source state, in declaration order.
    transitions: HashMap<State, Vec<TransitionRule>>,

    /// Every grammar rule label referenced by an action.
    labels: BTreeSet<String>,

    /// Number of declared actions across all states.
    action_count: u32,

    widths: DisplayWidths,

    /// Original raw definition.
    pub raw: MachineDefinitionRaw,

    /// Hash of the definition for identification in traces.
    pub checksum: String,
}

impl MachineDefinition {
    /// Parses and validates a machine definition from JSON.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoreError> {
        let raw: MachineDefinitionRaw = serde_json::from_value(json.clone())?;
        Self::from_raw(raw)
    }

    /// Validates a raw definition and derives its metadata.
    pub fn from_raw(raw: MachineDefinitionRaw) -> Result<Self, CoreError> {
        let start = required_state(raw.start.as_deref(), StateRole::Start)?;
        let end = required_state(raw.end.as_deref(), StateRole::End)?;

        let action_count = raw.transitions.values().map(Vec::len).sum::<usize>();
        let action_count = u32::try_from(action_count).map_err(|_| CoreError::InvalidDefinition {
            reason: format!("too many transitions: {}", action_count),
        })?;

        let mut states = BTreeSet::from([start.clone(), end.clone()]);
        let mut labels = BTreeSet::new();
        let mut seen_rules = HashSet::new();
        let mut transitions = HashMap::new();

        for (source, entries) in &raw.transitions {
            if source.is_empty() {
                return Err(CoreError::InvalidDefinition {
                    reason: "transition source state has an empty name".to_string(),
                });
            }
            let source = State::from(source.as_str());

            let mut rules = Vec::with_capacity(entries.len());
            for entry in entries {
                let rule = parse_entry(&source, entry, action_count)?;
                if !seen_rules.insert(rule.action.rule) {
                    return Err(CoreError::InvalidDefinition {
                        reason: format!("duplicate transition rule number {}", rule.action.rule),
                    });
                }
                states.insert(rule.action.to.clone());
                if let Some(label) = &rule.action.label {
                    labels.insert(label.clone());
                }
                rules.push(rule);
            }

            states.insert(source.clone());
            transitions.insert(source, rules);
        }

        let widths = DisplayWidths {
            state: states
                .iter()
                .map(|s| s.as_str().chars().count())
                .fold(STATE_HEADER.len(), usize::max),
            transition_rule: TRANSITION_RULE_HEADER
                .len()
                .max(action_count.to_string().len()),
            grammar_rule: labels
                .iter()
                .map(|l| l.chars().count())
                .fold(GRAMMAR_RULE_HEADER.len(), usize::max),
        };

        let json_bytes = serde_json::to_vec(&raw)?;
        let checksum = format!("{:08x}", crc32c::crc32c(&json_bytes));

        let definition = Self {
            name: raw.name.clone(),
            start,
            end,
            states,
            transitions,
            labels,
            action_count,
            widths,
            raw,
            checksum,
        };

        for finding in definition.lint() {
            tracing::warn!(machine = %definition.name, "{}", finding);
        }
        tracing::debug!(
            machine = %definition.name,
            states = definition.states.len(),
            actions = definition.action_count,
            labels = definition.labels.len(),
            checksum = %definition.checksum,
            "validated machine definition"
        );

        Ok(definition)
    }

    /// Returns the entries of `state` in declaration order.
    pub fn transitions_from(&self, state: &State) -> &[TransitionRule] {
        self.transitions
            .get(state)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Selects the first entry of `state` whose condition matches the
    /// observed input front and stack top.
    pub fn select(
        &self,
        state: &State,
        input_front: Option<Symbol>,
        stack_top: Option<Symbol>,
    ) -> Option<&TransitionRule> {
        self.transitions_from(state)
            .iter()
            .find(|t| t.condition.matches(input_front, stack_top))
    }

    /// Returns true if the given state is in the closed state set.
    pub fn has_state(&self, state: &State) -> bool {
        self.states.contains(state)
    }

    /// Returns true if `label` is used by some action.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Returns true if `rule` is a valid transition rule number.
    pub fn has_rule_number(&self, rule: u32) -> bool {
        (1..=self.action_count).contains(&rule)
    }

    /// Returns the closed state set in sorted order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    /// Returns the grammar rule labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Returns the number of declared actions.
    pub fn action_count(&self) -> u32 {
        self.action_count
    }

    pub fn widths(&self) -> DisplayWidths {
        self.widths
    }

    /// Returns the state names joined for error messages.
    pub fn describe_states(&self) -> String {
        self.states
            .iter()
            .map(State::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Reports entries that are shadowed by, or overlap with, an earlier
    /// entry of the same state.
    ///
    /// Overlaps are legal: declaration order resolves them.
    pub fn lint(&self) -> Vec<Overlap> {
        let mut findings = Vec::new();
        // Iterate in sorted state order so findings are stable.
        for state in &self.states {
            let rules = self.transitions_from(state);
            for (i, later) in rules.iter().enumerate() {
                for earlier in &rules[..i] {
                    let kind = if earlier.condition.subsumes(&later.condition) {
                        OverlapKind::Shadowed
                    } else if earlier.condition.overlaps(&later.condition) {
                        OverlapKind::OrderDependent
                    } else {
                        continue;
                    };
                    findings.push(Overlap {
                        state: state.clone(),
                        kind,
                        first: earlier.action.rule,
                        second: later.action.rule,
                    });
                }
            }
        }
        findings
    }

    /// Returns the raw definition as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        Ok(serde_json::to_value(&self.raw)?)
    }
}

fn required_state(name: Option<&str>, role: StateRole) -> Result<State, CoreError> {
    match name {
        Some(name) if !name.is_empty() => Ok(State::from(name)),
        _ => Err(CoreError::MissingRequiredState { role }),
    }
}

fn parse_entry(
    source: &State,
    entry: &RawTransition,
    action_count: u32,
) -> Result<TransitionRule, CoreError> {
    if !(1..=action_count).contains(&entry.rule) {
        return Err(CoreError::InvalidRuleNumber {
            rule: entry.rule,
            max: action_count,
        });
    }
    if entry.to.is_empty() {
        return Err(CoreError::InvalidDefinition {
            reason: format!(
                "rule {} from '{}' has an empty target state",
                entry.rule, source
            ),
        });
    }

    let condition = Condition {
        input: parse_symbol(entry.input.as_deref(), "input", entry.rule)?,
        stack: parse_symbol(entry.stack.as_deref(), "stack", entry.rule)?,
    };

    Ok(TransitionRule {
        condition,
        action: Action {
            to: State::from(entry.to.as_str()),
            push: entry.push.as_deref().unwrap_or_default().chars().collect(),
            rule: entry.rule,
            label: entry.label.clone().filter(|l| !l.is_empty()),
        },
    })
}

fn parse_symbol(value: Option<&str>, side: &str, rule: u32) -> Result<Option<Symbol>, CoreError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Ok(Some(symbol)),
        _ => Err(CoreError::InvalidDefinition {
            reason: format!(
                "rule {}: {} guard must be a single symbol, got '{}'",
                rule, side, value
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_definition() -> serde_json::Value {
        serde_json::json!({
            "name": "sample",
            "start": "p",
            "end": "f",
            "transitions": {
                "p": [
                    {"input": null, "stack": null, "to": "q", "push": "AZ", "rule": 1}
                ],
                "q": [
                    {"input": "x", "stack": "A", "to": "q", "push": "AA", "rule": 2, "label": "A -> xA"},
                    {"input": "y", "to": "r", "rule": 3},
                    {"stack": "Z", "to": "f", "rule": 4, "label": "A -> e"}
                ]
            }
        })
    }

    #[test]
    fn test_parse_definition() {
        let def = MachineDefinition::from_json(&sample_definition()).unwrap();

        assert_eq!(def.name, "sample");
        assert_eq!(def.start.as_str(), "p");
        assert_eq!(def.end.as_str(), "f");
        assert_eq!(def.action_count(), 4);
        assert_eq!(def.labels().collect::<Vec<_>>(), vec!["A -> e", "A -> xA"]);
        assert_eq!(def.checksum.len(), 8);
    }

    #[test]
    fn test_closed_state_set_includes_targets() {
        let def = MachineDefinition::from_json(&sample_definition()).unwrap();

        // "r" only ever appears as a target.
        assert!(def.has_state(&State::from("r")));
        let states: Vec<_> = def.states().map(State::as_str).collect();
        assert_eq!(states, vec!["f", "p", "q", "r"]);
        assert!(!def.has_state(&State::from("nope")));
    }

    #[test]
    fn test_select_uses_declaration_order() {
        let def = MachineDefinition::from_json(&sample_definition()).unwrap();
        let q = State::from("q");

        let rule = def.select(&q, Some('x'), Some('A')).unwrap();
        assert_eq!(rule.action.rule, 2);
        assert_eq!(rule.action.push, vec!['A', 'A']);

        // Rule 3 and rule 4 both match ('y', 'Z'); the earlier one wins.
        let rule = def.select(&q, Some('y'), Some('Z')).unwrap();
        assert_eq!(rule.action.rule, 3);

        let rule = def.select(&q, None, Some('Z')).unwrap();
        assert_eq!(rule.action.rule, 4);

        assert!(def.select(&q, Some('x'), Some('Z')).is_some());
        assert!(def.select(&q, Some('x'), None).is_none());
        assert!(def.select(&State::from("f"), None, None).is_none());
    }

    #[test]
    fn test_display_widths() {
        let def = MachineDefinition::from_json(&sample_definition()).unwrap();
        let widths = def.widths();

        assert_eq!(widths.state, "State".len());
        assert_eq!(widths.transition_rule, "Delta".len());
        assert_eq!(widths.grammar_rule, "A -> xA".len());
    }

    #[test]
    fn test_missing_end_state() {
        let json = serde_json::json!({
            "start": "p",
            "transitions": {"p": [{"to": "q", "rule": 1}]}
        });

        let result = MachineDefinition::from_json(&json);
        assert!(matches!(
            result,
            Err(CoreError::MissingRequiredState {
                role: StateRole::End
            })
        ));
    }

    #[test]
    fn test_missing_start_state() {
        let json = serde_json::json!({"start": "", "end": "f"});

        let result = MachineDefinition::from_json(&json);
        assert!(matches!(
            result,
            Err(CoreError::MissingRequiredState {
                role: StateRole::Start
            })
        ));
    }

    #[test]
    fn test_rule_number_out_of_range() {
        let json = serde_json::json!({
            "start": "p",
            "end": "f",
            "transitions": {"p": [{"to": "f", "rule": 2}]}
        });

        let result = MachineDefinition::from_json(&json);
        assert!(matches!(
            result,
            Err(CoreError::InvalidRuleNumber { rule: 2, max: 1 })
        ));
    }

    #[test]
    fn test_duplicate_rule_number() {
        let json = serde_json::json!({
            "start": "p",
            "end": "f",
            "transitions": {
                "p": [{"input": "a", "to": "f", "rule": 1}],
                "q": [{"input": "b", "to": "f", "rule": 1}]
            }
        });

        let result = MachineDefinition::from_json(&json);
        assert!(matches!(result, Err(CoreError::InvalidDefinition { .. })));
    }

    #[test]
    fn test_multi_symbol_guard_rejected() {
        let json = serde_json::json!({
            "start": "p",
            "end": "f",
            "transitions": {"p": [{"input": "ab", "to": "f", "rule": 1}]}
        });

        let result = MachineDefinition::from_json(&json);
        assert!(matches!(result, Err(CoreError::InvalidDefinition { .. })));
    }

    #[test]
    fn test_empty_label_is_no_label() {
        let raw = MachineDefinitionRaw::new("m", "p", "f")
            .with_state("p", [RawTransition::new("f", 1).label("")]);
        let def = MachineDefinition::from_raw(raw).unwrap();

        assert_eq!(def.labels().count(), 0);
        assert_eq!(def.widths().grammar_rule, "R".len());
    }

    #[test]
    fn test_lint_findings() {
        let raw = MachineDefinitionRaw::new("m", "p", "f").with_state(
            "p",
            [
                RawTransition::new("f", 1).on_input('a'),
                RawTransition::new("f", 2).on_stack('S'),
                RawTransition::new("f", 3).on_input('a').on_stack('S'),
            ],
        );
        let def = MachineDefinition::from_raw(raw).unwrap();
        let findings = def.lint();

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].kind, OverlapKind::OrderDependent);
        assert_eq!((findings[0].first, findings[0].second), (1, 2));
        assert!(findings[1..]
            .iter()
            .all(|f| f.kind == OverlapKind::Shadowed && f.second == 3));
    }

    #[test]
    fn test_checksum_is_stable() {
        let a = MachineDefinition::from_json(&sample_definition()).unwrap();
        let b = MachineDefinition::from_json(&sample_definition()).unwrap();
        assert_eq!(a.checksum, b.checksum);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }
}
