//! `terracart-datasets` provides the domain layer of the terracart ecosystem:
//! labeled remote-sensing plot tables, their ingestion from CSV, spatial and
//! temporal filtering, categorical encoding and the styling of classified
//! plots for a map renderer.
//!
//! ## The big picture
//!
//! A plot table is a collection of labeled samples: one point location per
//! row with an acquisition year, a dominant land-cover class and a fixed set
//! of numeric predictors (spectral reflectance bands, a vegetation index and
//! elevation). The table is filtered to an area and a year, deduplicated by
//! plot identifier, encoded and converted into a
//! [`terracart::Dataset`](terracart::Dataset) for model fitting.
//!
//! ## Using the bundled sample table
//!
//! A small synthetic plot table ships with the crate for tests and examples:
//!
//! ```
//! use terracart_datasets::{landcover_plots, Bounds};
//!
//! let table = landcover_plots()
//!     .filter(&Bounds::conus(), 2018)
//!     .dedup_by_plotid();
//! assert!(!table.is_empty());
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::warn;
use ndarray::{Array1, Array2};
use serde::Deserialize;
use thiserror::Error;

use terracart::dataset::split_assignments;
use terracart::Dataset;

pub mod encode;
pub mod style;

pub use encode::{CategoricalEncoder, UNMAPPED};
pub use style::{Legend, LegendRow, Palette, StyledLayer, StyledPoint, CLICK_RADIUS_METERS};

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read plot table")]
    Io(#[from] std::io::Error),
    #[error("failed to parse plot table: {0}")]
    Csv(#[from] csv::Error),
    #[error("one class code per record is required ({0} vs {1})")]
    MismatchedLengths(usize, usize),
    #[error("palette holds {colors} colors but {classes} classes are mapped")]
    PaletteTooSmall { classes: usize, colors: usize },
    #[error("class code {code} is out of range for a palette of {len} colors")]
    CodeOutOfRange { code: usize, len: usize },
    #[error(transparent)]
    Core(#[from] terracart::error::Error),
}

/// The predictor columns used for classification, in matrix column order
pub const PREDICTOR_NAMES: [&str; 8] = [
    "NDVI",
    "SR_B1",
    "SR_B2",
    "SR_B3",
    "SR_B4",
    "SR_B5",
    "SR_B7",
    "elevation_meters",
];

/// One labeled sample of a plot table
///
/// Field names follow the CSV header of the source table; missing or
/// non-numeric predictor values make the whole file fail to parse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlotRecord {
    pub plotid: u64,
    pub lon: f64,
    pub lat: f64,
    pub image_year: i32,
    pub dominant_landcover: String,
    #[serde(rename = "NDVI")]
    pub ndvi: f64,
    #[serde(rename = "SR_B1")]
    pub sr_b1: f64,
    #[serde(rename = "SR_B2")]
    pub sr_b2: f64,
    #[serde(rename = "SR_B3")]
    pub sr_b3: f64,
    #[serde(rename = "SR_B4")]
    pub sr_b4: f64,
    #[serde(rename = "SR_B5")]
    pub sr_b5: f64,
    #[serde(rename = "SR_B7")]
    pub sr_b7: f64,
    pub elevation_meters: f64,
}

impl PlotRecord {
    /// Predictor values in [`PREDICTOR_NAMES`] order
    pub fn predictors(&self) -> [f64; 8] {
        [
            self.ndvi,
            self.sr_b1,
            self.sr_b2,
            self.sr_b3,
            self.sr_b4,
            self.sr_b5,
            self.sr_b7,
            self.elevation_meters,
        ]
    }
}

/// An axis-aligned geographic bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Bounds {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Rough bounds of the continental United States, with a buffer
    pub fn conus() -> Self {
        Bounds::new(-130.0, 24.0, -65.0, 50.0)
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// An ordered collection of plot records
#[derive(Debug, Clone, Default)]
pub struct PlotTable {
    records: Vec<PlotRecord>,
}

impl PlotTable {
    pub fn new(records: Vec<PlotRecord>) -> Self {
        PlotTable { records }
    }

    /// Parse a plot table from CSV with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b',')
            .from_reader(reader);

        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<PlotRecord>, _>>()?;

        Ok(PlotTable { records })
    }

    /// Read a plot table from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn records(&self) -> &[PlotRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// An empty table is a valid result of filtering; callers must check
    /// before training.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep the rows inside `bounds` whose acquisition year is `image_year`
    pub fn filter(&self, bounds: &Bounds, image_year: i32) -> Self {
        let records = self
            .records
            .iter()
            .filter(|r| bounds.contains(r.lon, r.lat) && r.image_year == image_year)
            .cloned()
            .collect();

        PlotTable { records }
    }

    /// Remove duplicate plot identifiers, keeping the first occurrence
    pub fn dedup_by_plotid(&self) -> Self {
        let mut seen = std::collections::HashSet::new();
        let records = self
            .records
            .iter()
            .filter(|r| seen.insert(r.plotid))
            .cloned()
            .collect();

        PlotTable { records }
    }

    /// Distinct land-cover classes in first-seen order
    pub fn landcover_classes(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.dominant_landcover) {
                seen.push(record.dominant_landcover.clone());
            }
        }

        seen
    }

    /// Number of rows per land-cover class, sorted by class name
    pub fn class_histogram(&self) -> Vec<(String, usize)> {
        let mut histogram = BTreeMap::new();
        for record in &self.records {
            *histogram.entry(record.dominant_landcover.clone()).or_insert(0) += 1;
        }

        histogram.into_iter().collect()
    }

    /// Split rows at random into a training and a testing table
    ///
    /// Uses the same per-row assignment procedure as
    /// [`Dataset::random_split`](terracart::Dataset::random_split), so a
    /// table split and a dataset split with identical ratio and seed select
    /// the same rows. The partitions are disjoint and together contain every
    /// row.
    pub fn random_split(&self, ratio: f64, seed: u64) -> Result<(Self, Self)> {
        let assignments = split_assignments(self.len(), ratio, seed)?;

        let (train, test): (Vec<_>, Vec<_>) = self
            .records
            .iter()
            .cloned()
            .zip(assignments.into_iter())
            .partition(|(_, in_training)| *in_training);

        Ok((
            PlotTable::new(train.into_iter().map(|(r, _)| r).collect()),
            PlotTable::new(test.into_iter().map(|(r, _)| r).collect()),
        ))
    }

    /// Convert the table into a dataset of predictors and encoded labels
    ///
    /// Rows whose land-cover class is unknown to the encoder would receive
    /// the [`UNMAPPED`] sentinel; feeding the sentinel to a classifier as a
    /// real class is unsound, so such rows are dropped with a warning
    /// instead. The returned indices identify, for each dataset row, the
    /// table record it was built from.
    pub fn to_dataset(&self, encoder: &CategoricalEncoder) -> (Dataset<f64, usize>, Vec<usize>) {
        let mut data = Vec::with_capacity(self.len() * PREDICTOR_NAMES.len());
        let mut targets = Vec::with_capacity(self.len());
        let mut kept = Vec::with_capacity(self.len());
        let mut dropped = 0;

        for (idx, record) in self.records.iter().enumerate() {
            let code = encoder.code(&record.dominant_landcover);
            if code == UNMAPPED {
                dropped += 1;
                continue;
            }

            data.extend_from_slice(&record.predictors());
            targets.push(code as usize);
            kept.push(idx);
        }

        if dropped > 0 {
            warn!(
                "dropped {} row(s) with land-cover classes unknown to the encoder",
                dropped
            );
        }

        let records = Array2::from_shape_vec((kept.len(), PREDICTOR_NAMES.len()), data).unwrap();
        let dataset = Dataset::new(records, Array1::from(targets))
            .with_feature_names(PREDICTOR_NAMES.to_vec());

        (dataset, kept)
    }
}

/// The bundled synthetic land-cover plot table
///
/// Contains duplicate plot identifiers, off-year rows and out-of-bounds rows
/// on purpose, so that the full filtering pipeline can be exercised.
pub fn landcover_plots() -> PlotTable {
    let data = include_bytes!("../data/landcover_plots.csv");

    PlotTable::from_reader(&data[..]).unwrap()
}
