use camino::Utf8PathBuf;
use serde::Serialize;
use serde_json::Value;

use crate::locator::DirectUrls;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedMetadata {
    pub observation_id: Option<u64>,
    pub observed_on: Option<String>,
    pub time_observed_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub positional_accuracy: Option<f64>,
    pub public_positional_accuracy: Option<f64>,
    pub quality_grade: Option<String>,
    pub num_identification_agreements: Option<u64>,
    pub num_identification_disagreements: Option<u64>,
    pub captive_cultivated: Option<bool>,
    pub description: Option<String>,
    pub place_guess: Option<String>,
    pub geoprivacy: Option<String>,
    pub obscured: Option<bool>,
    pub mappable: Option<bool>,
    pub license_code: Option<String>,
    pub uri: Option<String>,
    pub user: UserSummary,
    pub photos: Vec<PhotoDescriptor>,
    pub species: Option<SpeciesSummary>,
    pub identifications: Vec<IdentificationEntry>,
    pub comments_count: Option<u64>,
    pub faves_count: Option<u64>,
    pub tags: Vec<Value>,
}

impl NormalizedMetadata {
    pub fn species_name(&self) -> Option<&str> {
        self.species
            .as_ref()
            .and_then(|species| species.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: Option<u64>,
    pub login: Option<String>,
    pub name: Option<String>,
    pub observations_count: Option<u64>,
    pub species_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpeciesSummary {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub preferred_common_name: Option<String>,
    pub english_common_name: Option<String>,
    pub rank: Option<String>,
    pub rank_level: Option<f64>,
    pub ancestry: Option<String>,
    pub is_active: Option<bool>,
    pub conservation_status: Option<Value>,
    pub conservation_status_name: Option<String>,
    pub iconic_taxon_id: Option<u64>,
    pub iconic_taxon_name: Option<String>,
    pub wikipedia_url: Option<String>,
    pub extinct: Option<bool>,
    pub introduced: Option<bool>,
    pub native: Option<bool>,
    pub endemic: Option<bool>,
    pub threatened: Option<bool>,
    pub observations_count: Option<u64>,
    pub default_photo: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Dimensions {
    pub width: Option<u64>,
    pub height: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhotoDescriptor {
    pub id: Option<u64>,
    pub license_code: Option<String>,
    pub url: Option<String>,
    pub original_url: Option<String>,
    pub large_url: Option<String>,
    pub medium_url: Option<String>,
    pub small_url: Option<String>,
    pub square_url: Option<String>,
    pub original_dimensions: Option<Dimensions>,
    pub attribution: Option<String>,
    pub native_page_url: Option<String>,
    pub native_photo_id: Option<String>,
    #[serde(rename = "type")]
    pub photo_type: Option<String>,
    pub flags: Vec<Value>,
    pub moderator_actions: Vec<Value>,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<Utf8PathBuf>,
}

impl PhotoDescriptor {
    pub fn direct_urls(&self) -> DirectUrls {
        DirectUrls {
            original: self.original_url.clone(),
            large: self.large_url.clone(),
            medium: self.medium_url.clone(),
            small: self.small_url.clone(),
            url: self.url.clone(),
        }
    }

    pub fn has_direct_urls(&self) -> bool {
        self.original_url
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IdentificationEntry {
    pub id: Option<u64>,
    pub user: IdentifierSummary,
    pub taxon_id: Option<u64>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub current: Option<bool>,
    pub vision: Option<bool>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct IdentifierSummary {
    pub id: Option<u64>,
    pub login: Option<String>,
    pub name: Option<String>,
}

pub fn normalize(raw: &Value) -> NormalizedMetadata {
    let (location_lat, location_lon) = parse_location(raw.get("location"));
    let user = raw.get("user");

    NormalizedMetadata {
        observation_id: u64_field(raw, "id"),
        observed_on: str_field(raw, "observed_on"),
        time_observed_at: str_field(raw, "time_observed_at"),
        created_at: str_field(raw, "created_at"),
        updated_at: str_field(raw, "updated_at"),
        latitude: f64_field(raw, "latitude").or(location_lat),
        longitude: f64_field(raw, "longitude").or(location_lon),
        positional_accuracy: f64_field(raw, "positional_accuracy"),
        public_positional_accuracy: f64_field(raw, "public_positional_accuracy"),
        quality_grade: str_field(raw, "quality_grade"),
        num_identification_agreements: u64_field(raw, "num_identification_agreements"),
        num_identification_disagreements: u64_field(raw, "num_identification_disagreements"),
        captive_cultivated: bool_field(raw, "captive_cultivated"),
        description: str_field(raw, "description"),
        place_guess: str_field(raw, "place_guess"),
        geoprivacy: str_field(raw, "geoprivacy"),
        obscured: bool_field(raw, "obscured"),
        mappable: bool_field(raw, "mappable"),
        license_code: str_field(raw, "license_code"),
        uri: str_field(raw, "uri"),
        user: UserSummary {
            id: user.and_then(|v| u64_field(v, "id")),
            login: user.and_then(|v| str_field(v, "login")),
            name: user.and_then(|v| str_field(v, "name")),
            observations_count: user.and_then(|v| u64_field(v, "observations_count")),
            species_count: user.and_then(|v| u64_field(v, "species_count")),
        },
        photos: array_field(raw, "photos").iter().map(extract_photo).collect(),
        species: raw
            .get("taxon")
            .filter(|taxon| taxon.is_object())
            .map(extract_species),
        identifications: array_field(raw, "identifications")
            .iter()
            .map(extract_identification)
            .collect(),
        comments_count: u64_field(raw, "comments_count"),
        faves_count: u64_field(raw, "faves_count"),
        tags: array_field(raw, "tags").to_vec(),
    }
}

fn extract_species(taxon: &Value) -> SpeciesSummary {
    SpeciesSummary {
        id: u64_field(taxon, "id"),
        name: str_field(taxon, "name"),
        preferred_common_name: str_field(taxon, "preferred_common_name"),
        english_common_name: str_field(taxon, "english_common_name"),
        rank: str_field(taxon, "rank"),
        rank_level: f64_field(taxon, "rank_level"),
        ancestry: str_field(taxon, "ancestry"),
        is_active: bool_field(taxon, "is_active"),
        conservation_status: value_field(taxon, "conservation_status"),
        conservation_status_name: str_field(taxon, "conservation_status_name"),
        iconic_taxon_id: u64_field(taxon, "iconic_taxon_id"),
        iconic_taxon_name: str_field(taxon, "iconic_taxon_name"),
        wikipedia_url: str_field(taxon, "wikipedia_url"),
        extinct: bool_field(taxon, "extinct"),
        introduced: bool_field(taxon, "introduced"),
        native: bool_field(taxon, "native"),
        endemic: bool_field(taxon, "endemic"),
        threatened: bool_field(taxon, "threatened"),
        observations_count: u64_field(taxon, "observations_count"),
        default_photo: value_field(taxon, "default_photo"),
    }
}

fn extract_photo(photo: &Value) -> PhotoDescriptor {
    let original_dimensions = photo
        .get("original_dimensions")
        .filter(|dims| dims.is_object())
        .map(|dims| Dimensions {
            width: u64_field(dims, "width"),
            height: u64_field(dims, "height"),
        });

    PhotoDescriptor {
        id: u64_field(photo, "id"),
        license_code: str_field(photo, "license_code"),
        url: str_field(photo, "url"),
        original_url: str_field(photo, "original_url"),
        large_url: str_field(photo, "large_url"),
        medium_url: str_field(photo, "medium_url"),
        small_url: str_field(photo, "small_url"),
        square_url: str_field(photo, "square_url"),
        original_dimensions,
        attribution: str_field(photo, "attribution"),
        native_page_url: str_field(photo, "native_page_url"),
        native_photo_id: photo.get("native_photo_id").and_then(|v| match v {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }),
        photo_type: str_field(photo, "type"),
        flags: array_field(photo, "flags").to_vec(),
        moderator_actions: array_field(photo, "moderator_actions").to_vec(),
        hidden: bool_field(photo, "hidden").unwrap_or(false),
        local_path: None,
    }
}

fn extract_identification(ident: &Value) -> IdentificationEntry {
    let user = ident.get("user");
    IdentificationEntry {
        id: u64_field(ident, "id"),
        user: IdentifierSummary {
            id: user.and_then(|v| u64_field(v, "id")),
            login: user.and_then(|v| str_field(v, "login")),
            name: user.and_then(|v| str_field(v, "name")),
        },
        taxon_id: u64_field(ident, "taxon_id").or_else(|| {
            ident
                .get("taxon")
                .and_then(|taxon| u64_field(taxon, "id"))
        }),
        body: str_field(ident, "body"),
        category: str_field(ident, "category"),
        current: bool_field(ident, "current"),
        vision: bool_field(ident, "vision"),
        created_at: str_field(ident, "created_at"),
    }
}

// `location` is "lat,lon"
fn parse_location(value: Option<&Value>) -> (Option<f64>, Option<f64>) {
    let Some((lat, lon)) = value
        .and_then(|v| v.as_str())
        .and_then(|text| text.split_once(','))
    else {
        return (None, None);
    };
    (lat.trim().parse().ok(), lon.trim().parse().ok())
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

fn u64_field(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(|v| v.as_u64())
}

fn f64_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(|v| match v {
        Value::String(text) => text.trim().parse().ok(),
        other => other.as_f64(),
    })
}

fn bool_field(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(|v| v.as_bool())
}

fn value_field(value: &Value, key: &str) -> Option<Value> {
    value.get(key).filter(|v| !v.is_null()).cloned()
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| items.as_slice())
        .unwrap_or(&[])
}
