//! Incremental Server-Sent Events parsing.
//!
//! Feeds raw response chunks in, yields complete `data:` payloads out. Data
//! lines belonging to one event are newline-joined; comment lines and the
//! `event:`/`id:`/`retry:` fields are ignored. Carries partial lines across
//! chunk boundaries.

#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buffer: String,
    event_data: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk of the response body, returning every event data
    /// payload completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut completed = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line = self.buffer[..newline].trim_end_matches('\r').to_string();
            self.buffer.drain(..=newline);

            if line.is_empty() {
                // Blank line terminates the current event.
                if !self.event_data.is_empty() {
                    completed.push(std::mem::take(&mut self.event_data));
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                if !self.event_data.is_empty() {
                    self.event_data.push('\n');
                }
                self.event_data.push_str(data.trim_start());
            }
            // Comments (`:`) and other SSE fields are skipped.
        }
        completed
    }
}
