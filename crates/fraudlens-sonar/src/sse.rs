//! Incremental decoder for `text/event-stream` bodies.
//!
//! Only `data:` fields matter for chat-completion streams. Consecutive
//! `data:` lines form one event, joined with `\n` and dispatched on a blank
//! line; `[DONE]` terminates the stream.

/// A decoded server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Splits arbitrary byte chunks into lines and lines into events. Bytes are
/// buffered until a newline so multi-byte characters split across chunks survive.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            events.extend(self.process_line(&line));
        }
        events
    }

    /// Flush a final line without a trailing newline and any undispatched event.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let line = std::mem::take(&mut self.buffer);
        let mut events: Vec<SseEvent> = self.process_line(&line).into_iter().collect();
        events.extend(self.dispatch());
        events
    }

    fn process_line(&mut self, line: &[u8]) -> Option<SseEvent> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        match data.trim() {
            "" => None,
            "[DONE]" => Some(SseEvent::Done),
            _ => Some(SseEvent::Data(data)),
        }
    }
}
