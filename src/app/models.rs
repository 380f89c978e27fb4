//! Data models for RainGRS acquisition and extraction
//!
//! Core value types shared by the cache, the source fetcher, the acquisition
//! pipeline and the series extractor.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::constants::files;
use crate::errors::{AppError, Result};

/// Accepted input formats for timestamps
const TIMESTAMP_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse an hourly timestamp from user input
///
/// Accepts `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM` and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    TIMESTAMP_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| {
            AppError::generic(format!(
                "Invalid timestamp '{}'. Expected YYYY-MM-DDTHH:MM",
                input
            ))
        })
}

/// Deterministic raster file name for an hour
///
/// `2024-07-20 15:00` becomes `202407201500_acc0060_grs.asc`.
pub fn raster_file_name(timestamp: &NaiveDateTime) -> String {
    format!(
        "{}{}",
        timestamp.format(files::RASTER_TIMESTAMP_FORMAT),
        files::RASTER_FILE_SUFFIX
    )
}

/// Inclusive range of hourly timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    /// Create a range from `start` to `end`, both inclusive
    ///
    /// # Errors
    ///
    /// Returns an error if either end is not on the hour or if `start` is
    /// after `end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        for (name, value) in [("start", start), ("end", end)] {
            if value.minute() != 0 || value.second() != 0 || value.nanosecond() != 0 {
                return Err(AppError::generic(format!(
                    "Range {} {} is not aligned to a full hour",
                    name, value
                )));
            }
        }
        if start > end {
            return Err(AppError::generic(format!(
                "Range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering a single hour
    pub fn single(hour: NaiveDateTime) -> Result<Self> {
        Self::new(hour, hour)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Number of hourly timestamps in the range
    pub fn len(&self) -> usize {
        ((self.end - self.start).num_hours() + 1) as usize
    }

    /// A valid range always holds at least one hour
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the range one hour at a time, both ends included
    pub fn hours(&self) -> HourlySteps {
        HourlySteps {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Iterator over the hours of a [`TimeRange`]
#[derive(Debug, Clone)]
pub struct HourlySteps {
    next: Option<NaiveDateTime>,
    end: NaiveDateTime,
}

impl Iterator for HourlySteps {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if current > self.end {
            self.next = None;
            return None;
        }
        self.next = current.checked_add_signed(Duration::hours(1));
        Some(current)
    }
}

/// Calendar day identifying one daily archive on the archive source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchiveKey {
    day: NaiveDate,
}

impl ArchiveKey {
    pub fn new(day: NaiveDate) -> Self {
        Self { day }
    }

    /// Archive published `lag_days` after the date of `timestamp`
    pub fn lagged(timestamp: &NaiveDateTime, lag_days: i64) -> Self {
        let shifted = *timestamp + Duration::days(lag_days);
        Self::new(shifted.date())
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Four-digit year bucket (`2024`)
    pub fn year(&self) -> String {
        self.day.format("%Y").to_string()
    }

    /// Two-digit month bucket (`07`)
    pub fn month(&self) -> String {
        self.day.format("%m").to_string()
    }

    /// Archive file name, e.g. `grs_60_asc_2024-07-22.tar`
    pub fn file_name(&self) -> String {
        format!(
            "{}{}{}",
            files::ARCHIVE_FILE_PREFIX,
            self.day.format("%Y-%m-%d"),
            files::ARCHIVE_FILE_EXTENSION
        )
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year(), self.month(), self.file_name())
    }
}

/// Point of interest in geographic coordinates (EPSG:4326)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Caller-supplied identifier, carried through to the output rows
    pub label: Option<String>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label if present, otherwise `lat,lon`
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("{},{}", self.latitude, self.longitude),
        }
    }
}

impl FromStr for GeoPoint {
    type Err = AppError;

    /// Parse `LAT,LON` or `LAT,LON,LABEL`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ',').map(str::trim);
        let parse_coord = |value: Option<&str>, name: &str| -> Result<f64> {
            value
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::generic(format!("Point '{}' is missing {}", s, name)))?
                .parse::<f64>()
                .map_err(|e| AppError::generic(format!("Point '{}' has invalid {}: {}", s, name, e)))
        };

        let latitude = parse_coord(parts.next(), "latitude")?;
        let longitude = parse_coord(parts.next(), "longitude")?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::generic(format!(
                "Point '{}' is outside geographic bounds",
                s
            )));
        }

        let point = GeoPoint::new(latitude, longitude);
        Ok(match parts.next().filter(|label| !label.is_empty()) {
            Some(label) => point.with_label(label),
            None => point,
        })
    }
}

/// Coordinate in the planar grid reference system (EPSG:2180 metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    /// Easting
    pub x: f64,
    /// Northing
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Index pair into a raster array
///
/// Signed because a point west or south of the grid origin resolves to a
/// negative index; bounds are checked at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row: i64,
    pub col: i64,
}

impl GridCell {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One extracted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub timestamp: NaiveDateTime,
    pub point: GeoPoint,
    pub cell: GridCell,
    /// Precipitation in mm, `None` for no-data cells and absent rasters
    pub value: Option<f64>,
}

/// Per-source counters of an acquisition pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionStats {
    /// Already present before the pass
    pub cached: usize,
    /// Written from the live source
    pub live: usize,
    /// Recovered from the archive published two days later
    pub archive_primary: usize,
    /// Recovered from the archive published one day later
    pub archive_fallback: usize,
    /// Not available after all sources were tried
    pub unavailable: usize,
}

/// Outcome of one acquisition pass: hour to "raster available locally"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRecord {
    entries: BTreeMap<NaiveDateTime, bool>,
    stats: AcquisitionStats,
}

impl AcquisitionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, timestamp: NaiveDateTime, source: Option<RasterSource>) {
        match source {
            Some(RasterSource::Cache) => self.stats.cached += 1,
            Some(RasterSource::Live) => self.stats.live += 1,
            Some(RasterSource::ArchivePrimary) => self.stats.archive_primary += 1,
            Some(RasterSource::ArchiveFallback) => self.stats.archive_fallback += 1,
            None => self.stats.unavailable += 1,
        }
        self.entries.insert(timestamp, source.is_some());
    }

    /// Availability of one hour, `None` if the hour was not part of the pass
    pub fn get(&self, timestamp: &NaiveDateTime) -> Option<bool> {
        self.entries.get(timestamp).copied()
    }

    /// Hours in chronological order with their availability
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &bool)> {
        self.entries.iter()
    }

    /// Hours that could not be acquired
    pub fn unavailable(&self) -> Vec<NaiveDateTime> {
        self.entries
            .iter()
            .filter(|(_, available)| !**available)
            .map(|(timestamp, _)| *timestamp)
            .collect()
    }

    pub fn available_count(&self) -> usize {
        self.entries.values().filter(|available| **available).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every hour of the pass is available
    pub fn is_complete(&self) -> bool {
        self.entries.values().all(|available| *available)
    }

    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }
}

/// Where an available raster came from during an acquisition pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterSource {
    Cache,
    Live,
    ArchivePrimary,
    ArchiveFallback,
}
