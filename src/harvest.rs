use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::{FetchConfig, RunOptions};
use crate::error::HarvestError;
use crate::fetcher::ResilientFetcher;
use crate::http::Transport;
use crate::locator;
use crate::normalize::{NormalizedMetadata, normalize};
use crate::paginator::{API_BASE, ObservationApi, ObservationRecord, PAGE_PACING, Termination};
use crate::stats::{RunStats, SpeciesTally};
use crate::store::ImageStore;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub observations: Vec<NormalizedMetadata>,
    pub stats: RunStats,
    pub species: SpeciesTally,
    pub pagination: Termination,
    pub pages_requested: u32,
}

impl HarvestReport {
    pub fn pagination_complete(&self) -> bool {
        matches!(self.pagination, Termination::Exhausted)
    }
}

pub struct Harvester<T: Transport> {
    fetcher: ResilientFetcher<T>,
    base_url: String,
    pacing: Duration,
}

impl<T: Transport> Harvester<T> {
    pub fn new(fetcher: ResilientFetcher<T>) -> Self {
        Self {
            fetcher,
            base_url: API_BASE.to_string(),
            pacing: PAGE_PACING,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn run(
        &self,
        config: &FetchConfig,
        options: &RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<HarvestReport, HarvestError> {
        let store = ImageStore::new(options.images_dir.clone());
        if options.download_images {
            store.ensure_root()?;
            info!("images will be saved to {}", store.root());
        }

        info!(
            "fetching observations within {} miles ({:.2} km) of ({}, {})",
            config.radius.miles(),
            config.radius.km(),
            config.center.lat(),
            config.center.lon()
        );
        sink.event(ProgressEvent {
            message: "phase=List; requesting observations".to_string(),
            elapsed: None,
        });

        let api = ObservationApi::new(&self.fetcher)
            .with_base_url(self.base_url.clone())
            .with_pacing(self.pacing);
        let mut pages = api.paginate(config);
        let limit = options.max_observations.unwrap_or(usize::MAX);

        let mut observations = Vec::new();
        let mut stats = RunStats::new();
        let mut species = SpeciesTally::new();

        while observations.len() < limit {
            let Some(raw) = pages.next() else {
                break;
            };
            let start = Instant::now();
            let position = observations.len() + 1;
            let raw = if config.is_authenticated() {
                self.with_details(&api, raw)
            } else {
                raw
            };

            let mut metadata = normalize(&raw);
            info!(
                "processing observation {position} (ID: {})",
                display_id(metadata.observation_id)
            );

            if options.download_images {
                let photo_stats = self.download_photos(&store, config, &mut metadata);
                log_observation(&metadata, &photo_stats);
                stats.merge(&photo_stats);
            }

            if let Some(name) = metadata.species_name() {
                species.observe(name);
            }

            sink.event(ProgressEvent {
                message: format!(
                    "phase=Observation; {position} id={}",
                    display_id(metadata.observation_id)
                ),
                elapsed: Some(start.elapsed()),
            });
            observations.push(metadata);
        }

        let pagination = pages.termination().cloned().unwrap_or_else(|| {
            info!("limited to {} observations", observations.len());
            Termination::Truncated
        });
        if observations.is_empty() {
            warn!("no observations found in the specified area");
        }

        Ok(HarvestReport {
            observations,
            stats,
            species,
            pagination,
            pages_requested: pages.pages_requested(),
        })
    }

    fn with_details(
        &self,
        api: &ObservationApi<'_, T>,
        raw: ObservationRecord,
    ) -> ObservationRecord {
        let Some(id) = raw.get("id").and_then(|v| v.as_u64()) else {
            return raw;
        };
        match api.observation_details(id) {
            Ok(Some(detailed)) => detailed,
            Ok(None) => raw,
            Err(err) => {
                error!("error fetching observation {id}: {err}");
                raw
            }
        }
    }

    fn download_photos(
        &self,
        store: &ImageStore,
        config: &FetchConfig,
        metadata: &mut NormalizedMetadata,
    ) -> RunStats {
        let mut photo_stats = RunStats::new();
        let Some(observation_id) = metadata.observation_id else {
            if !metadata.photos.is_empty() {
                warn!("observation without id, skipping its photos");
            }
            return photo_stats;
        };

        for (index, photo) in metadata.photos.iter_mut().enumerate() {
            let direct = (config.is_authenticated() && photo.has_direct_urls())
                .then(|| photo.direct_urls());
            let urls = locator::candidates(photo.id, config.image_quality, direct.as_ref());
            let destination = store.photo_path(observation_id, index);
            let outcome = self.fetcher.download(&urls, &destination);
            if let Some(path) = outcome.local_path() {
                photo.local_path = Some(path.to_path_buf());
            }
            photo_stats.record(&outcome);
        }
        photo_stats
    }
}

fn log_observation(metadata: &NormalizedMetadata, photo_stats: &RunStats) {
    let id = display_id(metadata.observation_id);
    let summary = photo_stats.summary();
    if summary.failed > 0 {
        info!(
            "  observation {id}: {} downloaded, {} skipped, {} missing/deleted",
            summary.downloaded, summary.skipped, summary.failed
        );
    } else if summary.skipped > 0 {
        info!(
            "  observation {id}: {} downloaded, {} skipped",
            summary.downloaded, summary.skipped
        );
    } else {
        info!(
            "  observation {id}: {}/{} photos downloaded",
            summary.downloaded,
            metadata.photos.len()
        );
    }
}

fn display_id(id: Option<u64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "unknown".to_string())
}
