/// Append-only buffer for one run's interpreter output.
///
/// The active run owns the buffer exclusively. It is reset when the next run
/// starts and never shared across runs, so whatever `read` returns belongs to
/// a single execution.
#[derive(Debug, Default)]
pub struct OutputSink {
    buf: String,
}

impl OutputSink {
    pub fn new() -> Self {
        Self { buf: String::new() }
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Appends one chunk followed by a newline.
    pub fn append(&mut self, chunk: &str) {
        self.buf.push_str(chunk);
        self.buf.push('\n');
    }

    pub fn read(&self) -> String {
        self.buf.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_adds_newline_per_chunk() {
        let mut sink = OutputSink::new();
        sink.reset();
        sink.append("a");
        sink.append("b");
        assert_eq!(sink.read(), "a\nb\n");
    }

    #[test]
    fn test_reset_clears_previous_run() {
        let mut sink = OutputSink::new();
        sink.append("stale output");
        sink.reset();
        assert!(sink.is_empty());
        assert_eq!(sink.read(), "");
    }

    #[test]
    fn test_new_sink_reads_empty() {
        let sink = OutputSink::new();
        assert_eq!(sink.read(), "");
    }

    #[test]
    fn test_multiline_chunk_kept_verbatim() {
        let mut sink = OutputSink::new();
        sink.append("line 1\nline 2");
        assert_eq!(sink.read(), "line 1\nline 2\n");
    }
}
