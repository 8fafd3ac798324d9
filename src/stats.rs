use std::collections::HashMap;

use serde::Serialize;

use crate::fetcher::DownloadOutcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    downloaded: u64,
    skipped: u64,
    failed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub success_rate_percent: f64,
}

impl RunSummary {
    pub fn attempted(&self) -> u64 {
        self.downloaded + self.skipped + self.failed
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded(_) => self.downloaded += 1,
            DownloadOutcome::AlreadyPresent(_) => self.skipped += 1,
            DownloadOutcome::NotFound
            | DownloadOutcome::TransientFailureExhausted
            | DownloadOutcome::Rejected(_) => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    pub fn attempted(&self) -> u64 {
        self.downloaded + self.skipped + self.failed
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            downloaded: self.downloaded,
            skipped: self.skipped,
            failed: self.failed,
            success_rate_percent: success_rate(self.downloaded, self.skipped, self.failed),
        }
    }
}

pub fn success_rate(downloaded: u64, skipped: u64, failed: u64) -> f64 {
    let total = downloaded + skipped + failed;
    if total == 0 {
        return 0.0;
    }
    let rate = (downloaded + skipped) as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesTally {
    counts: HashMap<String, u64>,
}

impl SpeciesTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries = self
            .counts
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }
}
