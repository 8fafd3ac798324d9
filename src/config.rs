use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialProvider;
use crate::domain::{
    Coordinate, Cultivation, Establishment, IconicTaxon, ImageQuality, QualityGrade, Radius,
    Rarity,
};
use crate::error::HarvestError;

pub const DEFAULT_CONFIG_FILE: &str = "inat-harvest.json";
pub const DEFAULT_LATITUDE: f64 = -8.132489362310453;
pub const DEFAULT_LONGITUDE: f64 = 115.36386760679501;
pub const DEFAULT_RADIUS_MILES: f64 = 5.0;
pub const DEFAULT_PER_PAGE: u32 = 200;
pub const MAX_PER_PAGE: u32 = 200;
pub const DEFAULT_OUTPUT: &str = "inaturalist_metadata.json";
pub const DEFAULT_IMAGES_DIR: &str = "./images";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub radius_miles: Option<f64>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub image_quality: Option<ImageQuality>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub images_dir: Option<String>,
    #[serde(default)]
    pub download_images: Option<bool>,
    #[serde(default)]
    pub max_observations: Option<usize>,
    #[serde(default)]
    pub filters: FilterConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub quality_grade: Option<QualityGrade>,
    #[serde(default)]
    pub iconic_taxon: Option<IconicTaxon>,
    #[serde(default)]
    pub observed_since: Option<String>,
    #[serde(default)]
    pub observed_before: Option<String>,
    #[serde(default)]
    pub captive_only: bool,
    #[serde(default)]
    pub wild_only: bool,
    #[serde(default)]
    pub introduced_only: bool,
    #[serde(default)]
    pub native_only: bool,
    #[serde(default)]
    pub threatened_only: bool,
    #[serde(default)]
    pub endemic_only: bool,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_miles: Option<f64>,
    pub per_page: Option<u32>,
    pub image_quality: Option<ImageQuality>,
    pub output: Option<String>,
    pub images_dir: Option<String>,
    pub skip_images: bool,
    pub max_observations: Option<usize>,
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationFilters {
    pub quality_grade: Option<QualityGrade>,
    pub iconic_taxon: Option<IconicTaxon>,
    pub observed_since: Option<NaiveDate>,
    pub observed_before: Option<NaiveDate>,
    pub cultivation: Cultivation,
    pub establishment: Establishment,
    pub rarity: Rarity,
}

impl ObservationFilters {
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(grade) = self.quality_grade {
            params.push(("quality_grade".to_string(), grade.as_str().to_string()));
        }
        if let Some(taxon) = self.iconic_taxon {
            params.push(("iconic_taxon_id".to_string(), taxon.taxon_id().to_string()));
        }
        if let Some(date) = self.observed_since {
            params.push(("d1".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.observed_before {
            params.push(("d2".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        let flags = [
            self.cultivation.query_param(),
            self.establishment.query_param(),
            self.rarity.query_param(),
        ];
        for (key, value) in flags.into_iter().flatten() {
            params.push((key.to_string(), value.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub center: Coordinate,
    pub radius: Radius,
    pub per_page: u32,
    pub filters: ObservationFilters,
    pub image_quality: ImageQuality,
    pub credential: Option<String>,
}

impl FetchConfig {
    pub fn new(center: Coordinate, radius: Radius) -> Self {
        Self {
            center,
            radius,
            per_page: DEFAULT_PER_PAGE,
            filters: ObservationFilters::default(),
            image_quality: ImageQuality::default(),
            credential: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn listing_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("lat".to_string(), self.center.lat().to_string()),
            ("lng".to_string(), self.center.lon().to_string()),
            ("radius".to_string(), self.radius.km().to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        params.extend(self.filters.query_params());
        params
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output: Utf8PathBuf,
    pub images_dir: Utf8PathBuf,
    pub download_images: bool,
    pub max_observations: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub fetch: FetchConfig,
    pub run: RunOptions,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
        credentials: &dyn CredentialProvider,
    ) -> Result<ResolvedConfig, HarvestError> {
        let config = Self::load(path)?;
        Self::resolve_config(config, overrides, credentials.token())
    }

    pub fn load(path: Option<&str>) -> Result<Config, HarvestError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if !config_path.exists() {
            if path.is_some() {
                return Err(HarvestError::MissingConfig(config_path));
            }
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HarvestError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| HarvestError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
        credential: Option<String>,
    ) -> Result<ResolvedConfig, HarvestError> {
        let center = Coordinate::new(
            overrides
                .latitude
                .or(config.latitude)
                .unwrap_or(DEFAULT_LATITUDE),
            overrides
                .longitude
                .or(config.longitude)
                .unwrap_or(DEFAULT_LONGITUDE),
        )?;
        let radius = Radius::from_miles(
            overrides
                .radius_miles
                .or(config.radius_miles)
                .unwrap_or(DEFAULT_RADIUS_MILES),
        )?;

        let per_page = overrides
            .per_page
            .or(config.per_page)
            .unwrap_or(DEFAULT_PER_PAGE);
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(HarvestError::InvalidPageSize(per_page));
        }

        let filters = resolve_filters(&config.filters, &overrides.filters)?;

        let fetch = FetchConfig {
            center,
            radius,
            per_page,
            filters,
            image_quality: overrides
                .image_quality
                .or(config.image_quality)
                .unwrap_or_default(),
            credential,
        };

        let run = RunOptions {
            output: Utf8PathBuf::from(
                overrides
                    .output
                    .or(config.output)
                    .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
            ),
            images_dir: Utf8PathBuf::from(
                overrides
                    .images_dir
                    .or(config.images_dir)
                    .unwrap_or_else(|| DEFAULT_IMAGES_DIR.to_string()),
            ),
            download_images: !overrides.skip_images && config.download_images.unwrap_or(true),
            max_observations: overrides
                .max_observations
                .or(config.max_observations)
                .filter(|cap| *cap > 0),
        };

        Ok(ResolvedConfig { fetch, run })
    }
}

fn resolve_filters(
    file: &FilterConfig,
    cli: &FilterConfig,
) -> Result<ObservationFilters, HarvestError> {
    let observed_since = cli
        .observed_since
        .as_deref()
        .or(file.observed_since.as_deref())
        .map(parse_date)
        .transpose()?;
    let observed_before = cli
        .observed_before
        .as_deref()
        .or(file.observed_before.as_deref())
        .map(parse_date)
        .transpose()?;
    if let (Some(since), Some(before)) = (observed_since, observed_before) {
        if since > before {
            return Err(HarvestError::ConflictingFilters(format!(
                "observed-since {since} is after observed-before {before}"
            )));
        }
    }

    Ok(ObservationFilters {
        quality_grade: cli.quality_grade.or(file.quality_grade),
        iconic_taxon: cli.iconic_taxon.or(file.iconic_taxon),
        observed_since,
        observed_before,
        cultivation: Cultivation::from_flags(
            cli.captive_only || file.captive_only,
            cli.wild_only || file.wild_only,
        )?,
        establishment: Establishment::from_flags(
            cli.introduced_only || file.introduced_only,
            cli.native_only || file.native_only,
        )?,
        rarity: Rarity::from_flags(
            cli.threatened_only || file.threatened_only,
            cli.endemic_only || file.endemic_only,
        )?,
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, HarvestError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| HarvestError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_without_file() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default(), None)
                .unwrap();
        assert_eq!(resolved.fetch.per_page, 200);
        assert_eq!(resolved.fetch.image_quality, ImageQuality::Best);
        assert_eq!(resolved.fetch.center.lat(), DEFAULT_LATITUDE);
        assert!(resolved.run.download_images);
        assert_eq!(resolved.run.output, Utf8PathBuf::from(DEFAULT_OUTPUT));
        assert!(!resolved.fetch.is_authenticated());
    }

    #[test]
    fn overrides_win_over_file() {
        let config = Config {
            radius_miles: Some(2.0),
            per_page: Some(50),
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            radius_miles: Some(10.0),
            ..ConfigOverrides::default()
        };
        let resolved = ConfigLoader::resolve_config(config, overrides, None).unwrap();
        assert_eq!(resolved.fetch.radius.miles(), 10.0);
        assert_eq!(resolved.fetch.per_page, 50);
    }

    #[test]
    fn rejects_oversized_page() {
        let overrides = ConfigOverrides {
            per_page: Some(500),
            ..ConfigOverrides::default()
        };
        let err = ConfigLoader::resolve_config(Config::default(), overrides, None).unwrap_err();
        assert_matches!(err, HarvestError::InvalidPageSize(500));
    }

    #[test]
    fn conflicting_pair_across_sources() {
        let config = Config {
            filters: FilterConfig {
                captive_only: true,
                ..FilterConfig::default()
            },
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            filters: FilterConfig {
                wild_only: true,
                ..FilterConfig::default()
            },
            ..ConfigOverrides::default()
        };
        let err = ConfigLoader::resolve_config(config, overrides, None).unwrap_err();
        assert_matches!(err, HarvestError::ConflictingFilters(_));
    }
}
