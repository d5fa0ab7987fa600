//! Caller-attachable decode tracing.
//!
//! The walkers narrate their progress (descriptor windows, unpack fields,
//! flush summaries) to a [`TraceSink`]. This exists purely for diagnostics:
//! the sink never influences decode results, and the default sink discards
//! everything. Callers that archive per-mesh decode logs can plug in
//! [`BufferSink`] or their own implementation.

/// Receives human-readable decode progress lines.
pub trait TraceSink {
    /// Called once per progress line, without a trailing newline.
    fn line(&mut self, text: &str);
}

/// Discards all trace output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn line(&mut self, _text: &str) {}
}

/// Collects trace output into memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Vec<String>,
}

impl BufferSink {
    /// Creates an empty sink.
    pub fn new() -> BufferSink {
        BufferSink::default()
    }

    /// The collected lines, in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl TraceSink for BufferSink {
    fn line(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }
}
