//! Progress reporting for long audit phases.

use tracing::info;

/// Receives incremental progress of one phase at a time.
pub trait ProgressSink {
    /// A new phase with `total` work items begins.
    fn start(&mut self, label: &str, total: usize);
    /// `n` more items are done.
    fn advance(&mut self, n: usize);
    fn finish(&mut self) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn start(&mut self, _label: &str, _total: usize) {}
    fn advance(&mut self, _n: usize) {}
}

/// Emits a `tracing` event every 10% of a phase.
#[derive(Debug, Clone, Default)]
pub struct LogProgress {
    label: String,
    total: usize,
    done: usize,
    next_percent: usize,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            (self.done.min(self.total) * 100) / self.total
        }
    }
}

impl ProgressSink for LogProgress {
    fn start(&mut self, label: &str, total: usize) {
        self.label = label.to_string();
        self.total = total;
        self.done = 0;
        self.next_percent = 10;
        info!(phase = %self.label, total, "started");
    }

    fn advance(&mut self, n: usize) {
        self.done += n;
        let percent = self.percent();
        if percent >= self.next_percent {
            info!(phase = %self.label, percent, "progress");
            self.next_percent = (percent / 10 + 1) * 10;
        }
    }

    fn finish(&mut self) {
        info!(phase = %self.label, items = self.done, "finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_clamped_and_handles_empty_phase() {
        let mut p = LogProgress::new();
        p.start("empty", 0);
        assert_eq!(p.percent(), 100);
        p.start("work", 4);
        p.advance(1);
        assert_eq!(p.percent(), 25);
        assert_eq!(p.next_percent, 30);
        p.advance(10);
        assert_eq!(p.percent(), 100);
    }
}
