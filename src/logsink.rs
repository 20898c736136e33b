use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::fmt::MakeWriter;

pub const LOG_CAPACITY: usize = 2_000;

/// Bounded in-memory ring of formatted log lines backing the log page.
#[derive(Debug, Clone)]
pub struct LogSink {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl LogSink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(256)))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, line: &str) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        for line in line.lines().filter(|line| !line.trim().is_empty()) {
            if lines.len() == self.capacity {
                lines.pop_front();
            }
            lines.push_back(line.to_string());
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One event's worth of formatted output; committed to the ring on drop.
pub struct SinkWriter {
    sink: LogSink,
    buffer: Vec<u8>,
}

impl io::Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let text = String::from_utf8_lossy(&self.buffer).into_owned();
            self.sink.push(&text);
            self.buffer.clear();
        }
        Ok(())
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            sink: self.clone(),
            buffer: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LogSink;
    use std::io::Write;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn ring_keeps_only_the_newest_lines() {
        let sink = LogSink::with_capacity(3);
        for index in 0..5 {
            sink.push(&format!("line {index}"));
        }
        assert_eq!(sink.snapshot(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn writer_commits_on_drop_and_splits_lines() {
        let sink = LogSink::default();
        {
            let mut writer = sink.make_writer();
            write!(writer, " WARN load timed out").unwrap();
            writeln!(writer).unwrap();
            write!(writer, " INFO second\n\n").unwrap();
            assert_eq!(sink.len(), 0);
        }
        assert_eq!(sink.snapshot(), vec![" WARN load timed out", " INFO second"]);
    }

    #[test]
    fn subscriber_output_lands_in_the_ring() {
        let sink = LogSink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .compact()
            .with_writer(sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(widget = "primary", "load timed out");
        });
        let lines = sink.snapshot();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("load timed out"), "{lines:?}");
        assert!(lines[0].contains("WARN"));
    }
}
