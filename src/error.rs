use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("invalid radius: {0}")]
    InvalidRadius(String),

    #[error("invalid page size: {0} (expected 1..=200)")]
    InvalidPageSize(u32),

    #[error("invalid date bound: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("conflicting filters: {0}")]
    ConflictingFilters(String),

    #[error("missing config file at {0}")]
    MissingConfig(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("iNaturalist request failed: {0}")]
    ApiHttp(String),

    #[error("iNaturalist returned status {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("malformed iNaturalist response: {0}")]
    ApiPayload(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to serialize output: {0}")]
    Output(String),
}
