//! Box-drawing trace table.
//!
//! ```text
//! ┌─────────────────────────────────────┬──────────────────┐
//! │        DPDA Processing State        │    Rules used    │
//! ├──────┬───────┬──────────────┬───────┼───────┬──────────┤
//! │ Step │ State │ Unread input │ Stack │ Delta │ R        │
//! ├──────┼───────┼──────────────┼───────┼───────┼──────────┤
//! │    0 │ p     │ ab$          │     e │       │          │
//! │    1 │ q     │ ab$          │    SZ │     1 │          │
//! └──────┴───────┴──────────────┴───────┴───────┴──────────┘
//! ```

use pushdown_core::trace::{
    GRAMMAR_RULE_HEADER, INPUT_HEADER, STACK_HEADER, STATE_HEADER, STEP_HEADER,
    TRANSITION_RULE_HEADER,
};
use pushdown_core::{StepSnapshot, TraceHeader, TraceSink, Verdict};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Shown in place of an exhausted input or an empty stack.
pub const EMPTY: &str = "e";

const STATE_TITLE: &str = "DPDA Processing State";
const RULES_TITLE: &str = "Rules used";

/// Characters used to frame the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    pub bar: char,
    pub bar_down: char,
    pub bar_up: char,
    pub bar_left: char,
    pub bar_right: char,
    pub corner_bottom_left: char,
    pub corner_bottom_right: char,
    pub corner_top_left: char,
    pub corner_top_right: char,
    pub cross: char,
    pub hr: char,
}

impl Charset {
    pub const UTF8: Charset = Charset {
        bar: '│',
        bar_down: '┬',
        bar_up: '┴',
        bar_left: '┤',
        bar_right: '├',
        corner_bottom_left: '└',
        corner_bottom_right: '┘',
        corner_top_left: '┌',
        corner_top_right: '┐',
        cross: '┼',
        hr: '─',
    };

    pub const ASCII: Charset = Charset {
        bar: '|',
        bar_down: '+',
        bar_up: '+',
        bar_left: '+',
        bar_right: '+',
        corner_bottom_left: '+',
        corner_bottom_right: '+',
        corner_top_left: '+',
        corner_top_right: '+',
        cross: '+',
        hr: '-',
    };
}

/// Named character sets, as used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharsetKind {
    #[default]
    Utf8,
    Ascii,
}

impl CharsetKind {
    pub fn charset(self) -> Charset {
        match self {
            CharsetKind::Utf8 => Charset::UTF8,
            CharsetKind::Ascii => Charset::ASCII,
        }
    }
}

/// Column widths of one run's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    state: usize,
    input: usize,
    stack: usize,
    transition_rule: usize,
    grammar_rule: usize,
}

impl Layout {
    fn new(header: &TraceHeader) -> Self {
        let input_len = header.input_len();
        Self {
            state: header.widths.state,
            input: INPUT_HEADER.len().max(input_len),
            stack: STACK_HEADER.len().max(input_len.div_ceil(2) + 2),
            transition_rule: header.widths.transition_rule,
            grammar_rule: header.widths.grammar_rule,
        }
    }

    fn row(&self, cells: [&str; 6], left: char, right: char, join: char) -> String {
        let [step, state, input, stack, rule, label] = cells;
        let columns = [
            format!("{} {:>4}", left, step),
            format!("{:<w$}", state, w = self.state),
            format!("{:<w$}", input, w = self.input),
            format!("{:>w$}", stack, w = self.stack),
            format!("{:>w$}", rule, w = self.transition_rule),
            format!("{:<w$} {}", label, right, w = self.grammar_rule),
        ];
        columns.join(&format!(" {} ", join))
    }

    /// A horizontal rule following the column boundaries.
    fn rule_line(&self, left: char, right: char, join: char, hr: char) -> Vec<char> {
        self.row([""; 6], left, right, join)
            .chars()
            .map(|c| if c == ' ' { hr } else { c })
            .collect()
    }

    fn opening(&self, cs: &Charset) -> Vec<String> {
        let titles = self.row(
            [
                STEP_HEADER,
                STATE_HEADER,
                INPUT_HEADER,
                STACK_HEADER,
                TRANSITION_RULE_HEADER,
                GRAMMAR_RULE_HEADER,
            ],
            cs.bar,
            cs.bar,
            cs.bar,
        );
        let total = titles.chars().count();
        let rules_at = titles
            .find(TRANSITION_RULE_HEADER)
            .map(|byte| titles[..byte].chars().count())
            .unwrap_or(total);
        let left_width = rules_at.saturating_sub(5);
        let right_width = (total - rules_at).saturating_sub(2);

        let banner = format!(
            "{bar} {:^lw$} {bar} {:^rw$} {bar}",
            STATE_TITLE,
            RULES_TITLE,
            bar = cs.bar,
            lw = left_width,
            rw = right_width,
        );
        // Column of the bar splitting the two banner halves.
        let split = banner
            .chars()
            .skip(1)
            .position(|c| c == cs.bar)
            .map_or(0, |p| p + 1);

        let mut top = self.rule_line(cs.corner_top_left, cs.corner_top_right, cs.hr, cs.hr);
        let mut middle = self.rule_line(cs.bar_right, cs.bar_left, cs.bar_down, cs.hr);
        if split < top.len() {
            top[split] = cs.bar_down;
        }
        if split < middle.len() {
            middle[split] = cs.cross;
        }
        let under_titles: String = middle
            .iter()
            .map(|&c| if c == cs.bar_down { cs.cross } else { c })
            .collect();

        vec![
            top.into_iter().collect(),
            banner,
            middle.into_iter().collect(),
            titles,
            under_titles,
        ]
    }

    fn step(&self, snapshot: &StepSnapshot, cs: &Charset) -> String {
        let step = snapshot.step.to_string();
        let rule = snapshot
            .transition_rule
            .map(|r| r.to_string())
            .unwrap_or_default();
        self.row(
            [
                &step,
                &snapshot.state,
                non_empty(&snapshot.input),
                non_empty(&snapshot.stack),
                &rule,
                snapshot.grammar_rule.as_deref().unwrap_or_default(),
            ],
            cs.bar,
            cs.bar,
            cs.bar,
        )
    }

    fn closing(&self, cs: &Charset) -> String {
        self.rule_line(cs.corner_bottom_left, cs.corner_bottom_right, cs.bar_up, cs.hr)
            .into_iter()
            .collect()
    }
}

fn non_empty(text: &str) -> &str {
    if text.is_empty() {
        EMPTY
    } else {
        text
    }
}

/// Writes a run's trace as a framed table.
pub struct TableRenderer<W: Write> {
    out: W,
    charset: Charset,
    layout: Option<Layout>,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(out: W, charset: Charset) -> Self {
        Self {
            out,
            charset,
            layout: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn layout(&self) -> io::Result<Layout> {
        self.layout
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "trace step before begin"))
    }
}

impl<W: Write> TraceSink for TableRenderer<W> {
    fn begin(&mut self, header: &TraceHeader) -> io::Result<()> {
        let layout = Layout::new(header);
        for line in layout.opening(&self.charset) {
            writeln!(self.out, "{}", line)?;
        }
        self.layout = Some(layout);
        Ok(())
    }

    fn step(&mut self, snapshot: &StepSnapshot) -> io::Result<()> {
        let line = self.layout()?.step(snapshot, &self.charset);
        writeln!(self.out, "{}", line)
    }

    fn finish(&mut self, _verdict: Verdict) -> io::Result<()> {
        let line = self.layout()?.closing(&self.charset);
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }
}
