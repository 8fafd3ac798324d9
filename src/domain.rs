use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

const KM_PER_MILE: f64 = 1.60934;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    #[default]
    Best,
    Original,
    Large,
    Medium,
    Small,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoTier {
    Original,
    Large,
    Medium,
    Small,
    Square,
}

impl PhotoTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoTier::Original => "original",
            PhotoTier::Large => "large",
            PhotoTier::Medium => "medium",
            PhotoTier::Small => "small",
            PhotoTier::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Research,
    #[value(name = "needs_id")]
    NeedsId,
    Casual,
}

impl QualityGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGrade::Research => "research",
            QualityGrade::NeedsId => "needs_id",
            QualityGrade::Casual => "casual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum IconicTaxon {
    #[value(name = "Animalia")]
    Animalia,
    #[value(name = "Plantae")]
    Plantae,
    #[value(name = "Insecta")]
    Insecta,
    #[value(name = "Aves")]
    Aves,
    #[value(name = "Mammalia")]
    Mammalia,
    #[value(name = "Reptilia")]
    Reptilia,
    #[value(name = "Amphibia")]
    Amphibia,
    #[value(name = "Mollusca")]
    Mollusca,
    #[value(name = "Arachnida")]
    Arachnida,
    #[value(name = "Fungi")]
    Fungi,
}

impl IconicTaxon {
    pub fn taxon_id(&self) -> u64 {
        match self {
            IconicTaxon::Animalia => 1,
            IconicTaxon::Plantae => 47126,
            IconicTaxon::Insecta => 47158,
            IconicTaxon::Aves => 3,
            IconicTaxon::Mammalia => 40151,
            IconicTaxon::Reptilia => 26036,
            IconicTaxon::Amphibia => 20978,
            IconicTaxon::Mollusca => 47115,
            IconicTaxon::Arachnida => 47119,
            IconicTaxon::Fungi => 47170,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, HarvestError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(HarvestError::InvalidCoordinate(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(HarvestError::InvalidCoordinate(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Radius {
    miles: f64,
}

impl Radius {
    pub fn from_miles(miles: f64) -> Result<Self, HarvestError> {
        if !miles.is_finite() || miles <= 0.0 {
            return Err(HarvestError::InvalidRadius(format!(
                "{miles} miles (must be positive)"
            )));
        }
        Ok(Self { miles })
    }

    pub fn miles(&self) -> f64 {
        self.miles
    }

    pub fn km(&self) -> f64 {
        self.miles * KM_PER_MILE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cultivation {
    #[default]
    Any,
    CaptiveOnly,
    WildOnly,
}

impl Cultivation {
    pub fn from_flags(captive_only: bool, wild_only: bool) -> Result<Self, HarvestError> {
        match (captive_only, wild_only) {
            (true, true) => Err(HarvestError::ConflictingFilters(
                "captive-only and wild-only".to_string(),
            )),
            (true, false) => Ok(Cultivation::CaptiveOnly),
            (false, true) => Ok(Cultivation::WildOnly),
            (false, false) => Ok(Cultivation::Any),
        }
    }

    pub fn query_param(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Cultivation::Any => None,
            Cultivation::CaptiveOnly => Some(("captive", "true")),
            Cultivation::WildOnly => Some(("captive", "false")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Establishment {
    #[default]
    Any,
    IntroducedOnly,
    NativeOnly,
}

impl Establishment {
    pub fn from_flags(introduced_only: bool, native_only: bool) -> Result<Self, HarvestError> {
        match (introduced_only, native_only) {
            (true, true) => Err(HarvestError::ConflictingFilters(
                "introduced-only and native-only".to_string(),
            )),
            (true, false) => Ok(Establishment::IntroducedOnly),
            (false, true) => Ok(Establishment::NativeOnly),
            (false, false) => Ok(Establishment::Any),
        }
    }

    pub fn query_param(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Establishment::Any => None,
            Establishment::IntroducedOnly => Some(("introduced", "true")),
            Establishment::NativeOnly => Some(("native", "true")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rarity {
    #[default]
    Any,
    ThreatenedOnly,
    EndemicOnly,
}

impl Rarity {
    pub fn from_flags(threatened_only: bool, endemic_only: bool) -> Result<Self, HarvestError> {
        match (threatened_only, endemic_only) {
            (true, true) => Err(HarvestError::ConflictingFilters(
                "threatened-only and endemic-only".to_string(),
            )),
            (true, false) => Ok(Rarity::ThreatenedOnly),
            (false, true) => Ok(Rarity::EndemicOnly),
            (false, false) => Ok(Rarity::Any),
        }
    }

    pub fn query_param(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Rarity::Any => None,
            Rarity::ThreatenedOnly => Some(("threatened", "true")),
            Rarity::EndemicOnly => Some(("endemic", "true")),
        }
    }
}
