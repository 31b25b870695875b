//! Built-in machine: L = { aⁿbⁿ$ | n ≥ 1 }.
//!
//! The stack starts as `SZ`, where `Z` marks the bottom. Reading `a` expands
//! `S -> aSb` and matches the pushed `a`; reading the first `b` applies
//! `S -> e`; every `b` then matches a pushed `b`. The terminator `$` is only
//! accepted once the stack is back down to `Z`.
//!
//! | Rule | State | Input | Stack | Next | Push  | Production |
//! |------|-------|-------|-------|------|-------|------------|
//! | 1    | p     | -     | -     | q    | SZ    |            |
//! | 2    | q     | a     | -     | qa   |       |            |
//! | 3    | qa    | -     | a     | q    |       |            |
//! | 4    | q     | b     | -     | qb   |       |            |
//! | 5    | qb    | -     | b     | q    |       |            |
//! | 6    | q     | $     | Z     | q$   |       |            |
//! | 7    | qa    | -     | S     | qa   | aSb   | S -> aSb   |
//! | 8    | qb    | -     | S     | qb   |       | S -> e     |

use crate::definition::{MachineDefinition, MachineDefinitionRaw, RawTransition};
use crate::error::CoreError;

pub const ANBN_NAME: &str = "anbn";
pub const ANBN_START: &str = "p";
pub const ANBN_END: &str = "q$";

/// Raw table of the aⁿbⁿ$ machine.
pub fn anbn_raw() -> MachineDefinitionRaw {
    let mut raw = MachineDefinitionRaw::new(ANBN_NAME, ANBN_START, ANBN_END)
        .with_state("p", [RawTransition::new("q", 1).push("SZ")])
        .with_state(
            "q",
            [
                RawTransition::new("qa", 2).on_input('a'),
                RawTransition::new("qb", 4).on_input('b'),
                RawTransition::new(ANBN_END, 6).on_input('$').on_stack('Z'),
            ],
        )
        .with_state(
            "qa",
            [
                RawTransition::new("q", 3).on_stack('a'),
                RawTransition::new("qa", 7)
                    .on_stack('S')
                    .push("aSb")
                    .label("S -> aSb"),
            ],
        )
        .with_state(
            "qb",
            [
                RawTransition::new("q", 5).on_stack('b'),
                RawTransition::new("qb", 8).on_stack('S').label("S -> e"),
            ],
        );
    raw.description = Some("L = { a^n b^n $ | n >= 1 }".to_string());
    raw
}

/// Validated aⁿbⁿ$ machine.
pub fn anbn() -> Result<MachineDefinition, CoreError> {
    MachineDefinition::from_raw(anbn_raw())
}

/// Builds the input `a` * n, `b` * n, `$`.
pub fn anbn_input(n: usize) -> String {
    let mut input = String::with_capacity(2 * n + 1);
    input.extend(std::iter::repeat('a').take(n));
    input.extend(std::iter::repeat('b').take(n));
    input.push('$');
    input
}
