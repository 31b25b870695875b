//! JSON-lines trace output, one object per event.

use pushdown_core::{StepSnapshot, TraceHeader, TraceSink, Verdict};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum TraceEvent<'a> {
    Begin(&'a TraceHeader),
    Step(&'a StepSnapshot),
    Halt { verdict: Verdict },
}

/// Writes a run's trace as newline-delimited JSON.
pub struct JsonLinesRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: &TraceEvent<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")
    }
}

impl<W: Write> TraceSink for JsonLinesRenderer<W> {
    fn begin(&mut self, header: &TraceHeader) -> io::Result<()> {
        self.emit(&TraceEvent::Begin(header))
    }

    fn step(&mut self, snapshot: &StepSnapshot) -> io::Result<()> {
        self.emit(&TraceEvent::Step(snapshot))
    }

    fn finish(&mut self, verdict: Verdict) -> io::Result<()> {
        self.emit(&TraceEvent::Halt { verdict })?;
        self.out.flush()
    }
}
