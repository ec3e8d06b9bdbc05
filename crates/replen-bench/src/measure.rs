//! Per-stage wall time and resident memory.

use std::time::Instant;

use sysinfo::System;

/// Resident set size of this process, if the OS reports it.
pub fn capture_rss_bytes() -> Option<u64> {
    let pid = sysinfo::Pid::from(std::process::id() as usize);
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        sysinfo::ProcessesToUpdate::Some(&[pid]),
        true,
        sysinfo::ProcessRefreshKind::nothing().with_memory(),
    );
    sys.process(pid).map(|process| process.memory())
}

pub fn rss_delta(before: Option<u64>, after: Option<u64>) -> Option<i64> {
    match (before, after) {
        (Some(before), Some(after)) => Some(after as i64 - before as i64),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageMeasurement {
    pub stage: &'static str,
    pub duration_ms: f64,
    pub rss_before_bytes: Option<u64>,
    pub rss_after_bytes: Option<u64>,
}

impl StageMeasurement {
    pub fn rss_delta_bytes(&self) -> Option<i64> {
        rss_delta(self.rss_before_bytes, self.rss_after_bytes)
    }
}

/// Collects one measurement per named stage.
#[derive(Debug, Default)]
pub struct MeasurementRecorder {
    stages: Vec<StageMeasurement>,
}

impl MeasurementRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` as stage `stage` and record its cost.
    pub fn measure<T>(&mut self, stage: &'static str, work: impl FnOnce() -> T) -> T {
        let rss_before_bytes = capture_rss_bytes();
        let started = Instant::now();
        let output = work();
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.stages.push(StageMeasurement {
            stage,
            duration_ms,
            rss_before_bytes,
            rss_after_bytes: capture_rss_bytes(),
        });
        output
    }

    /// Recorded stages followed by a synthetic `total`.
    pub fn finish(mut self) -> Vec<StageMeasurement> {
        let total = StageMeasurement {
            stage: "total",
            duration_ms: self.stages.iter().map(|stage| stage.duration_ms).sum(),
            rss_before_bytes: self.stages.first().and_then(|stage| stage.rss_before_bytes),
            rss_after_bytes: self.stages.last().and_then(|stage| stage.rss_after_bytes),
        };
        self.stages.push(total);
        self.stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_appends_total() {
        let mut recorder = MeasurementRecorder::new();
        let value = recorder.measure("build", || 21 * 2);
        recorder.measure("solve", || ());
        let stages = recorder.finish();

        assert_eq!(value, 42);
        let names: Vec<&str> = stages.iter().map(|stage| stage.stage).collect();
        assert_eq!(names, vec!["build", "solve", "total"]);
        let sum = stages[0].duration_ms + stages[1].duration_ms;
        assert!((stages[2].duration_ms - sum).abs() < 1e-9);
    }

    #[test]
    fn delta_needs_both_sides() {
        assert_eq!(rss_delta(Some(1_000), Some(1_500)), Some(500));
        assert_eq!(rss_delta(None, Some(1_500)), None);
    }
}
