//! Domain model structs for species, observations and their media.
//!
//! Field names are camelCase on the wire so the JSON file and the HTTP API
//! share a single representation. Each top-level model has a `validate`
//! method that enforces the value ranges serde alone cannot express.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vogel_core::{Error, Result};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// IUCN Red List category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConservationStatus {
    /// Least Concern.
    Lc,
    /// Near Threatened.
    Nt,
    /// Vulnerable.
    Vu,
    /// Endangered.
    En,
    /// Critically Endangered.
    Cr,
    /// Extinct in the Wild.
    Ew,
    /// Extinct.
    Ex,
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// How an image should be cropped or positioned for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FitSettings {
    /// Zoom level (1 = default, >1 = zoom in), 0.5..=5.0.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Horizontal offset, -1 (left) ..= 1 (right).
    #[serde(default)]
    pub offset_x: f64,
    /// Vertical offset, -1 (up) ..= 1 (down).
    #[serde(default)]
    pub offset_y: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl FitSettings {
    pub fn validate(&self) -> Result<()> {
        check_range("fit.scale", self.scale, 0.5, 5.0)?;
        check_range("fit.offsetX", self.offset_x, -1.0, 1.0)?;
        check_range("fit.offsetY", self.offset_y, -1.0, 1.0)
    }
}

/// A photo attached to a species or an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BirdImage {
    /// Relative (`/uploads/...`) or absolute (`http...`) location.
    pub url: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fit: Option<FitSettings>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl BirdImage {
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with('/') || self.url.starts_with("http")) {
            return Err(Error::validation(
                "url must be relative (/uploads/...) or absolute (http...)",
            ));
        }
        if let Some(fit) = &self.fit {
            fit.validate()?;
        }
        Ok(())
    }
}

/// Sonogram image links of a xeno-canto recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct XenoCantoSono {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub med: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub full: Option<String>,
}

/// Oscillogram image links of a xeno-canto recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct XenoCantoOsci {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub med: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

/// An audio recording as returned by the xeno-canto API.
///
/// Field names mirror xeno-canto's own JSON, including the hyphenated ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct XenoCantoRecording {
    pub id: String,
    #[serde(default)]
    pub gen: Option<String>,
    #[serde(default)]
    pub sp: Option<String>,
    #[serde(default)]
    pub ssp: Option<String>,
    #[serde(default)]
    pub grp: Option<String>,
    #[serde(default)]
    pub en: Option<String>,
    #[serde(default)]
    pub rec: Option<String>,
    #[serde(default)]
    pub cnt: Option<String>,
    #[serde(default)]
    pub loc: Option<String>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, rename = "file-name", alias = "file_name")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub sono: Option<XenoCantoSono>,
    #[serde(default)]
    pub osci: Option<XenoCantoOsci>,
    #[serde(default)]
    pub lic: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub uploaded: Option<String>,
    #[serde(default)]
    pub also: Vec<String>,
    #[serde(default)]
    pub rmk: Option<String>,
    #[serde(default, rename = "animal-seen", alias = "animal_seen")]
    pub animal_seen: Option<String>,
    #[serde(default, rename = "playback-used", alias = "playback_used")]
    pub playback_used: Option<String>,
    #[serde(default)]
    pub temp: Option<String>,
    #[serde(default)]
    pub regnr: Option<String>,
    #[serde(default)]
    pub auto: Option<String>,
    #[serde(default)]
    pub dvc: Option<String>,
    #[serde(default)]
    pub mic: Option<String>,
    #[serde(default)]
    pub smp: Option<String>,
}

// ---------------------------------------------------------------------------
// Core records
// ---------------------------------------------------------------------------

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn validate(&self) -> Result<()> {
        check_range("location.latitude", self.latitude, -90.0, 90.0)?;
        check_range("location.longitude", self.longitude, -180.0, 180.0)
    }
}

/// A taxonomic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BirdSpecies {
    pub id: String,
    pub common_name: String,
    pub scientific_name: String,
    pub family: String,
    #[serde(default)]
    pub conservation_status: Option<ConservationStatus>,
    #[serde(default)]
    pub images: Vec<BirdImage>,
    #[serde(default)]
    pub recordings: Vec<XenoCantoRecording>,
}

impl BirdSpecies {
    pub fn validate(&self) -> Result<()> {
        for image in &self.images {
            image.validate()?;
        }
        Ok(())
    }
}

/// A single recorded sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BirdObservation {
    pub id: String,
    pub species_id: String,
    /// ISO 8601 date or date-time, stored exactly as supplied.
    pub date: String,
    pub location: LatLng,
    pub observer: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub image: Option<BirdImage>,
    #[serde(default)]
    pub recording: Option<XenoCantoRecording>,
    #[serde(default)]
    pub mystery: bool,
    #[serde(default = "default_true")]
    pub include_audio_in_marker: bool,
}

fn default_true() -> bool {
    true
}

impl BirdObservation {
    pub fn validate(&self) -> Result<()> {
        if !is_iso8601(&self.date) {
            return Err(Error::validation("date must be an ISO 8601 string"));
        }
        self.location.validate()?;
        if let Some(image) = &self.image {
            image.validate()?;
        }
        Ok(())
    }
}

/// Wrapper for count endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Count {
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_nan() || value < min || value > max {
        return Err(Error::validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Accepts a calendar date, a local date-time, or a date-time with a UTC
/// offset or trailing `Z`.
pub fn is_iso8601(value: &str) -> bool {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return true;
    }

    let normalized = match value.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };

    if DateTime::parse_from_rfc3339(&normalized).is_ok() {
        return true;
    }
    if OFFSET_DATETIME_FORMATS
        .iter()
        .any(|fmt| DateTime::parse_from_str(&normalized, fmt).is_ok())
    {
        return true;
    }
    LOCAL_DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}
