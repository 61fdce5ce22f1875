use crate::common::{EventEnvelope, EventSink};
use std::io::Write;

/// Keeps every published envelope in memory.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    envelopes: Vec<EventEnvelope>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn envelopes(&self) -> &[EventEnvelope] {
        &self.envelopes
    }

    pub fn event_types(&self) -> Vec<&str> {
        self.envelopes.iter().map(|e| e.event_type.as_str()).collect()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.envelopes.iter().filter(|e| e.event_type == event_type).count()
    }

    pub fn into_envelopes(self) -> Vec<EventEnvelope> {
        self.envelopes
    }
}

impl EventSink for MemoryEventLog {
    fn publish(&mut self, envelope: EventEnvelope) -> Result<(), String> {
        self.envelopes.push(envelope);
        Ok(())
    }
}

/// Writes one JSON object per line to `writer`.
pub struct JsonLinesEventLog<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesEventLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesEventLog<W> {
    fn publish(&mut self, envelope: EventEnvelope) -> Result<(), String> {
        let line = serde_json::to_string(&envelope).map_err(|e| format!("Failed to encode event: {}", e))?;
        writeln!(self.writer, "{}", line).map_err(|e| format!("Failed to write event: {}", e))?;
        self.written += 1;
        Ok(())
    }
}
