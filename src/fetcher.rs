use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::error::HarvestError;
use crate::http::{Transport, TransportError};
use crate::store::{Placement, create_bytes_atomic};

pub const MAX_RETRIES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Metadata,
    ImageAsset,
}

impl FetchKind {
    fn retry_budget(&self) -> u32 {
        match self {
            FetchKind::Metadata => 0,
            FetchKind::ImageAsset => MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    NotFound,
    RateLimited,
    ServerError,
    Connection,
    Timeout,
    Permanent,
}

pub fn classify_status(status: u16) -> Option<FailureClass> {
    match status {
        200..=299 => None,
        404 => Some(FailureClass::NotFound),
        429 => Some(FailureClass::RateLimited),
        500..=599 => Some(FailureClass::ServerError),
        _ => Some(FailureClass::Permanent),
    }
}

fn classify_transport(err: &TransportError) -> FailureClass {
    match err {
        TransportError::Timeout(_) => FailureClass::Timeout,
        TransportError::Connect(_) => FailureClass::Connection,
        TransportError::Other(_) => FailureClass::Permanent,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub rate_limited: Duration,
    pub server_error: Duration,
    pub connection: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limited: Duration::from_secs(60),
            server_error: Duration::from_secs(10),
            connection: Duration::from_secs(10),
            timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn immediate() -> Self {
        Self {
            rate_limited: Duration::ZERO,
            server_error: Duration::ZERO,
            connection: Duration::ZERO,
            timeout: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, class: FailureClass) -> Option<Duration> {
        match class {
            FailureClass::RateLimited => Some(self.rate_limited),
            FailureClass::ServerError => Some(self.server_error),
            FailureClass::Connection => Some(self.connection),
            FailureClass::Timeout => Some(self.timeout),
            FailureClass::NotFound | FailureClass::Permanent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("asset not found")]
    NotFound,

    #[error("gave up after retry ({class:?}): {detail}")]
    TransientExhausted { class: FailureClass, detail: String },

    #[error("request rejected: {detail}")]
    Rejected { status: Option<u16>, detail: String },
}

impl From<FetchFailure> for HarvestError {
    fn from(value: FetchFailure) -> Self {
        match value {
            FetchFailure::NotFound => HarvestError::ApiStatus {
                status: 404,
                message: "not found".to_string(),
            },
            FetchFailure::Rejected {
                status: Some(status),
                detail,
            } => HarvestError::ApiStatus {
                status,
                message: detail,
            },
            FetchFailure::Rejected { status: None, detail } => HarvestError::ApiHttp(detail),
            FetchFailure::TransientExhausted { detail, .. } => HarvestError::ApiHttp(detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded(Utf8PathBuf),
    AlreadyPresent(Utf8PathBuf),
    NotFound,
    TransientFailureExhausted,
    Rejected(String),
}

impl DownloadOutcome {
    pub fn local_path(&self) -> Option<&Utf8Path> {
        match self {
            DownloadOutcome::Downloaded(path) | DownloadOutcome::AlreadyPresent(path) => {
                Some(path.as_path())
            }
            _ => None,
        }
    }
}

pub struct ResilientFetcher<T: Transport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> ResilientFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn fetch(
        &self,
        url: &str,
        query: &[(String, String)],
        kind: FetchKind,
    ) -> Result<Vec<u8>, FetchFailure> {
        let budget = kind.retry_budget();
        let mut attempt = 0u32;
        loop {
            let (class, status, detail) = match self.transport.get(url, query) {
                Ok(reply) => match classify_status(reply.status) {
                    None => return Ok(reply.body),
                    Some(class) => (
                        class,
                        Some(reply.status),
                        format!("{url} returned status {}", reply.status),
                    ),
                },
                Err(err) => (
                    classify_transport(&err),
                    None,
                    format!("{url}: {}", err.message()),
                ),
            };

            if class == FailureClass::NotFound && kind == FetchKind::ImageAsset {
                debug!(url, "asset not found, it may have been deleted");
                return Err(FetchFailure::NotFound);
            }

            let Some(delay) = self.policy.delay_for(class) else {
                return Err(FetchFailure::Rejected { status, detail });
            };

            if attempt >= budget {
                return Err(FetchFailure::TransientExhausted { class, detail });
            }

            warn!(
                url,
                ?class,
                delay_secs = delay.as_secs_f64(),
                "transient failure, retrying once"
            );
            thread::sleep(delay);
            attempt += 1;
        }
    }

    pub fn download(&self, candidates: &[String], destination: &Utf8Path) -> DownloadOutcome {
        if destination.as_std_path().exists() {
            debug!(path = %destination, "skipping existing file");
            return DownloadOutcome::AlreadyPresent(destination.to_path_buf());
        }

        let mut exhausted = false;
        let mut rejected = None;
        for url in candidates {
            match self.fetch(url, &[], FetchKind::ImageAsset) {
                Ok(bytes) => {
                    return match create_bytes_atomic(destination, &bytes) {
                        Ok(Placement::Created) => {
                            info!("downloaded {}", destination.file_name().unwrap_or(""));
                            DownloadOutcome::Downloaded(destination.to_path_buf())
                        }
                        Ok(Placement::AlreadyExists) => {
                            debug!(path = %destination, "file appeared during download, kept it");
                            DownloadOutcome::AlreadyPresent(destination.to_path_buf())
                        }
                        Err(err) => {
                            error!(path = %destination, "failed to store image: {err}");
                            DownloadOutcome::Rejected(err.to_string())
                        }
                    };
                }
                Err(FetchFailure::NotFound) => {}
                Err(FetchFailure::TransientExhausted { detail, .. }) => {
                    warn!("giving up on {detail}");
                    exhausted = true;
                }
                Err(FetchFailure::Rejected { detail, .. }) => {
                    warn!("download refused: {detail}");
                    rejected = Some(detail);
                }
            }
        }

        if exhausted {
            DownloadOutcome::TransientFailureExhausted
        } else if let Some(detail) = rejected {
            DownloadOutcome::Rejected(detail)
        } else {
            DownloadOutcome::NotFound
        }
    }
}
