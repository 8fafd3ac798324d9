use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info};

use crate::config::FetchConfig;
use crate::error::HarvestError;
use crate::fetcher::{FetchKind, ResilientFetcher};
use crate::http::Transport;

pub const API_BASE: &str = "https://api.inaturalist.org/v1";
pub const PAGE_PACING: Duration = Duration::from_millis(500);

pub type ObservationRecord = Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Exhausted,
    Aborted(String),
    Truncated,
}

pub struct ObservationApi<'a, T: Transport> {
    fetcher: &'a ResilientFetcher<T>,
    base_url: String,
    pacing: Duration,
}

impl<'a, T: Transport> ObservationApi<'a, T> {
    pub fn new(fetcher: &'a ResilientFetcher<T>) -> Self {
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

    pub fn observations_url(&self) -> String {
        format!("{}/observations", self.base_url.trim_end_matches('/'))
    }

    pub fn paginate(&self, config: &FetchConfig) -> ObservationPaginator<'a, T> {
        ObservationPaginator {
            fetcher: self.fetcher,
            endpoint: self.observations_url(),
            base_params: config.listing_params(),
            per_page: config.per_page as usize,
            pacing: self.pacing,
            next_page: 1,
            pages_requested: 0,
            buffer: VecDeque::new(),
            termination: None,
        }
    }

    pub fn observation_details(&self, id: u64) -> Result<Option<ObservationRecord>, HarvestError> {
        let url = format!("{}/{id}", self.observations_url());
        let bytes = self.fetcher.fetch(&url, &[], FetchKind::Metadata)?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|err| HarvestError::ApiPayload(err.to_string()))?;
        Ok(body
            .get("results")
            .and_then(|v| v.as_array())
            .and_then(|results| results.first())
            .cloned())
    }
}

pub struct ObservationPaginator<'a, T: Transport> {
    fetcher: &'a ResilientFetcher<T>,
    endpoint: String,
    base_params: Vec<(String, String)>,
    per_page: usize,
    pacing: Duration,
    next_page: u32,
    pages_requested: u32,
    buffer: VecDeque<ObservationRecord>,
    termination: Option<Termination>,
}

impl<T: Transport> ObservationPaginator<'_, T> {
    pub fn pages_requested(&self) -> u32 {
        self.pages_requested
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    fn page_params(&self, page: u32) -> Vec<(String, String)> {
        let mut params = self.base_params.clone();
        params.push(("page".to_string(), page.to_string()));
        params.push(("has_photos".to_string(), "true".to_string()));
        params.push(("identified".to_string(), "true".to_string()));
        params.push(("order_by".to_string(), "created_at".to_string()));
        params.push(("order".to_string(), "desc".to_string()));
        params
    }

    fn fetch_next_page(&mut self) {
        if self.pages_requested > 0 && !self.pacing.is_zero() {
            thread::sleep(self.pacing);
        }

        let page = self.next_page;
        let params = self.page_params(page);
        self.pages_requested += 1;

        let bytes = match self.fetcher.fetch(&self.endpoint, &params, FetchKind::Metadata) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(page, "error fetching observations: {err}");
                self.termination = Some(Termination::Aborted(err.to_string()));
                return;
            }
        };
        let body: Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(err) => {
                error!(page, "malformed observations page: {err}");
                self.termination = Some(Termination::Aborted(format!(
                    "malformed page {page}: {err}"
                )));
                return;
            }
        };

        let results = match body.get("results").and_then(|v| v.as_array()) {
            Some(results) if !results.is_empty() => results.clone(),
            _ => {
                self.termination = Some(Termination::Exhausted);
                return;
            }
        };

        info!("fetched page {page} with {} observations", results.len());
        if results.len() < self.per_page {
            self.termination = Some(Termination::Exhausted);
        }
        self.buffer.extend(results);
        self.next_page += 1;
    }
}

impl<T: Transport> Iterator for ObservationPaginator<'_, T> {
    type Item = ObservationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(record);
            }
            if self.termination.is_some() {
                return None;
            }
            self.fetch_next_page();
        }
    }
}
