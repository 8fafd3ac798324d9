use assert_matches::assert_matches;

use inat_harvest::config::{Config, ConfigLoader, ConfigOverrides, FilterConfig};
use inat_harvest::credentials::{Anonymous, StaticToken};
use inat_harvest::domain::{IconicTaxon, ImageQuality, QualityGrade};
use inat_harvest::error::HarvestError;

fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

#[test]
fn load_file_and_apply_overrides() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("inat-harvest.json");
    std::fs::write(
        &path,
        r#"{
            "latitude": 48.85,
            "longitude": 2.35,
            "radius_miles": 2.5,
            "per_page": 100,
            "image_quality": "medium",
            "images_dir": "photos",
            "filters": {
                "quality_grade": "needs_id",
                "iconic_taxon": "Aves",
                "observed_since": "2024-01-01",
                "wild_only": true
            }
        }"#,
    )
    .unwrap();

    let overrides = ConfigOverrides {
        per_page: Some(50),
        filters: FilterConfig {
            observed_before: Some("2024-06-30".to_string()),
            ..FilterConfig::default()
        },
        ..ConfigOverrides::default()
    };
    let resolved =
        ConfigLoader::resolve(path.to_str(), overrides, &StaticToken::new("secret")).unwrap();

    assert_eq!(resolved.fetch.center.lat(), 48.85);
    assert_eq!(resolved.fetch.per_page, 50);
    assert_eq!(resolved.fetch.image_quality, ImageQuality::Medium);
    assert_eq!(resolved.fetch.filters.quality_grade, Some(QualityGrade::NeedsId));
    assert_eq!(resolved.fetch.filters.iconic_taxon, Some(IconicTaxon::Aves));
    assert!(resolved.fetch.is_authenticated());
    assert_eq!(resolved.run.images_dir.as_str(), "photos");

    let params = resolved.fetch.listing_params();
    assert_eq!(query_value(&params, "iconic_taxon_id"), Some("3"));
    assert_eq!(query_value(&params, "quality_grade"), Some("needs_id"));
    assert_eq!(query_value(&params, "d1"), Some("2024-01-01"));
    assert_eq!(query_value(&params, "d2"), Some("2024-06-30"));
    assert_eq!(query_value(&params, "captive"), Some("false"));
    assert_eq!(query_value(&params, "lng"), Some("2.35"));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str(), ConfigOverrides::default(), &Anonymous)
        .unwrap_err();
    assert_matches!(err, HarvestError::MissingConfig(_));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, "{ \"latitude\": ").unwrap();
    let err = ConfigLoader::resolve(path.to_str(), ConfigOverrides::default(), &Anonymous)
        .unwrap_err();
    assert_matches!(err, HarvestError::ConfigParse(_));
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        (
            ConfigOverrides {
                latitude: Some(120.0),
                ..ConfigOverrides::default()
            },
            "coordinate",
        ),
        (
            ConfigOverrides {
                radius_miles: Some(0.0),
                ..ConfigOverrides::default()
            },
            "radius",
        ),
        (
            ConfigOverrides {
                per_page: Some(0),
                ..ConfigOverrides::default()
            },
            "page",
        ),
        (
            ConfigOverrides {
                filters: FilterConfig {
                    observed_since: Some("01/02/2024".to_string()),
                    ..FilterConfig::default()
                },
                ..ConfigOverrides::default()
            },
            "date",
        ),
    ];

    for (overrides, label) in cases {
        let err = ConfigLoader::resolve_config(Default::default(), overrides, None).unwrap_err();
        match label {
            "coordinate" => assert_matches!(err, HarvestError::InvalidCoordinate(_)),
            "radius" => assert_matches!(err, HarvestError::InvalidRadius(_)),
            "page" => assert_matches!(err, HarvestError::InvalidPageSize(0)),
            _ => assert_matches!(err, HarvestError::InvalidDate(_)),
        }
    }
}

#[test]
fn inverted_date_window_conflicts() {
    let overrides = ConfigOverrides {
        filters: FilterConfig {
            observed_since: Some("2024-06-01".to_string()),
            observed_before: Some("2024-01-01".to_string()),
            ..FilterConfig::default()
        },
        ..ConfigOverrides::default()
    };
    let err = ConfigLoader::resolve_config(Default::default(), overrides, None).unwrap_err();
    assert_matches!(err, HarvestError::ConflictingFilters(_));
}

#[test]
fn skip_images_overrides_file() {
    let config = Config {
        download_images: Some(true),
        ..Default::default()
    };
    let overrides = ConfigOverrides {
        skip_images: true,
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve_config(config, overrides, None).unwrap();
    assert!(!resolved.run.download_images);
}

#[test]
fn zero_observation_cap_means_unlimited() {
    let config = Config {
        max_observations: Some(25),
        ..Default::default()
    };
    let overrides = ConfigOverrides {
        max_observations: Some(0),
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve_config(config, overrides, None).unwrap();
    assert_eq!(resolved.run.max_observations, None);

    let overrides = ConfigOverrides {
        max_observations: Some(3),
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve_config(Default::default(), overrides, None).unwrap();
    assert_eq!(resolved.run.max_observations, Some(3));
}
