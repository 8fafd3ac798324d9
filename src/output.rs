use std::io::{self, Write};

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{FetchConfig, RunOptions};
use crate::error::HarvestError;
use crate::harvest::{HarvestReport, ProgressEvent, ProgressSink};
use crate::normalize::NormalizedMetadata;
use crate::paginator::Termination;
use crate::store::write_bytes_atomic;

pub const TOP_SPECIES: usize = 10;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentMetadata {
    pub generated_at: String,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_miles: f64,
    pub radius_km: f64,
    pub total_observations: usize,
    pub images_downloaded: u64,
    pub images_skipped: u64,
    pub images_failed: u64,
    pub success_rate_percent: f64,
    pub images_directory: Option<String>,
    pub authenticated: bool,
    pub pagination_complete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestDocument<'a> {
    pub metadata: DocumentMetadata,
    pub observations: &'a [NormalizedMetadata],
}

impl<'a> HarvestDocument<'a> {
    pub fn new(
        report: &'a HarvestReport,
        config: &FetchConfig,
        options: &RunOptions,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let summary = report.stats.summary();
        let metadata = DocumentMetadata {
            generated_at: generated_at.to_rfc3339(),
            center_latitude: config.center.lat(),
            center_longitude: config.center.lon(),
            radius_miles: config.radius.miles(),
            radius_km: config.radius.km(),
            total_observations: report.observations.len(),
            images_downloaded: summary.downloaded,
            images_skipped: summary.skipped,
            images_failed: summary.failed,
            success_rate_percent: summary.success_rate_percent,
            images_directory: options
                .download_images
                .then(|| options.images_dir.to_string()),
            authenticated: config.is_authenticated(),
            pagination_complete: report.pagination_complete(),
        };
        Self {
            metadata,
            observations: &report.observations,
        }
    }

    pub fn write(&self, path: &Utf8Path) -> Result<(), HarvestError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|err| HarvestError::Output(err.to_string()))?;
        write_bytes_atomic(path, &json)
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_document(document: &HarvestDocument<'_>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&document.metadata).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        let mut stderr = io::stderr();
        let _ = match event.elapsed {
            Some(elapsed) => writeln!(
                stderr,
                "{} ({:.1}s)",
                event.message,
                elapsed.as_secs_f64()
            ),
            None => writeln!(stderr, "{}", event.message),
        };
    }
}

pub fn summary_notes(report: &HarvestReport) -> Vec<String> {
    let summary = report.stats.summary();
    let mut notes = Vec::new();
    if summary.failed > 0 {
        notes.push(format!(
            "Note: {} photos could not be downloaded, mostly 404 errors. This is normal - photos \
             may have been deleted by users or moved on iNaturalist's servers.",
            summary.failed
        ));
    }
    if summary.skipped > 0 {
        notes.push(format!(
            "Note: {} images were skipped because they already exist. This allows you to safely \
             re-run the harvest to continue interrupted downloads.",
            summary.skipped
        ));
    }
    if let Termination::Aborted(reason) = &report.pagination {
        notes.push(format!(
            "Note: pagination stopped early ({reason}); the results are partial."
        ));
    }
    notes
}

pub fn print_summary(document: &HarvestDocument<'_>, report: &HarvestReport, output: &Utf8Path) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";
    let metadata = &document.metadata;

    println!("{cyan}📦 iNaturalist harvest summary{reset}");
    println!(
        "{green}✅ Observations: {}{reset}",
        metadata.total_observations
    );
    println!("{cyan}📁 metadata: {output}{reset}");
    if let Some(dir) = &metadata.images_directory {
        println!("{cyan}🖼️  images: {dir}{reset}");
        println!(
            "{green}⬇️ downloaded: {}  ♻️ skipped: {}{reset}",
            metadata.images_downloaded, metadata.images_skipped
        );
        println!(
            "{yellow}⚠️ failed: {}  success rate: {:.1}%{reset}",
            metadata.images_failed, metadata.success_rate_percent
        );
    }
    for note in summary_notes(report) {
        println!("{yellow}{note}{reset}");
    }

    let top = report.species.top(TOP_SPECIES);
    if !top.is_empty() {
        println!(
            "{cyan}Species found: {} distinct{reset}",
            report.species.distinct()
        );
        for (name, count) in top {
            println!("  • {name}: {count}");
        }
    }
}
