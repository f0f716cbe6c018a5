use serde::Serialize;

/// No-data marker shown on the status surface before any sample exists.
const NO_DATA: &str = "—";

pub(crate) fn format_latency(ms: f64) -> String {
    format!("{ms:.1} ms")
}

/// Session-wide run outcome counters and latency history.
///
/// Built once at session start and mutated only by the run controller when a
/// run completes. Failed runs count toward `failures` but contribute no
/// latency sample, so `durations.len()` always equals the success count.
#[derive(Debug, Default)]
pub struct Telemetry {
    success: u64,
    failures: u64,
    durations: Vec<f64>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, duration_ms: f64) {
        self.success += 1;
        self.durations.push(duration_ms);
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn success_count(&self) -> u64 {
        self.success
    }

    pub fn failure_count(&self) -> u64 {
        self.failures
    }

    /// Arithmetic mean of the latency history, 0.0 when no sample exists.
    pub fn average_latency(&self) -> f64 {
        if self.durations.is_empty() {
            return 0.0;
        }
        self.durations.iter().sum::<f64>() / self.durations.len() as f64
    }

    pub fn last_latency(&self) -> Option<f64> {
        self.durations.last().copied()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let average = self.average_latency();
        let last = self.last_latency();
        TelemetrySnapshot {
            runs: self.success,
            failures: self.failures,
            average_ms: average,
            average_display: if self.durations.is_empty() {
                NO_DATA.to_string()
            } else {
                format_latency(average)
            },
            last_ms: last,
            last_display: last.map(format_latency).unwrap_or_else(|| NO_DATA.to_string()),
        }
    }
}

/// Read-only projection of [`Telemetry`] for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub runs: u64,
    pub failures: u64,
    pub average_ms: f64,
    pub average_display: String,
    pub last_ms: Option<f64>,
    pub last_display: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_sum_to_completed_runs() {
        let mut t = Telemetry::new();
        t.record_success(10.0);
        t.record_failure();
        t.record_success(20.0);
        t.record_failure();
        t.record_failure();
        assert_eq!(t.success_count() + t.failure_count(), 5);
        assert_eq!(t.success_count(), 2);
        assert_eq!(t.failure_count(), 3);
    }

    #[test]
    fn test_failures_add_no_latency_sample() {
        let mut t = Telemetry::new();
        t.record_failure();
        t.record_failure();
        assert_eq!(t.last_latency(), None);
        assert_eq!(t.snapshot().runs, 0);
    }

    #[test]
    fn test_average_on_empty_history_is_zero() {
        let t = Telemetry::new();
        assert_eq!(t.average_latency(), 0.0);
        assert_eq!(t.last_latency(), None);
    }

    #[test]
    fn test_sequential_runs_average_and_last() {
        let mut t = Telemetry::new();
        t.record_success(50.0);
        t.record_success(30.0);
        assert_eq!(t.last_latency(), Some(30.0));
        assert_eq!(t.average_latency(), 40.0);
    }

    #[test]
    fn test_snapshot_formats_one_decimal_with_unit() {
        let mut t = Telemetry::new();
        t.record_success(50.0);
        t.record_success(30.0);
        let snap = t.snapshot();
        assert_eq!(snap.average_display, "40.0 ms");
        assert_eq!(snap.last_display, "30.0 ms");
        assert_eq!(snap.runs, 2);
    }

    #[test]
    fn test_snapshot_empty_uses_no_data_marker() {
        let snap = Telemetry::new().snapshot();
        assert_eq!(snap.average_display, "—");
        assert_eq!(snap.last_display, "—");
        assert_eq!(snap.last_ms, None);
    }

    #[test]
    fn test_format_latency_rounds_to_one_decimal() {
        assert_eq!(format_latency(43.16), "43.2 ms");
        assert_eq!(format_latency(0.0), "0.0 ms");
    }
}
