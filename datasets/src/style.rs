//! Map styling for classified plots
//!
//! A rendered map is represented by value types only: styled point layers
//! (one colored point per plot), ordered legends and a synchronous
//! nearest-point query standing in for an interactive click handler. The
//! embedding UI, if any, owns the event loop and calls
//! [`StyledLayer::find_nearest`] once per click.

use crate::{DataError, PlotRecord, Result};

/// Display colors for land-cover classes, indexed by class code
pub const LANDCOVER_PALETTE: [&str; 7] = [
    "mediumblue",
    "deepskyblue",
    "springgreen",
    "mediumslateblue",
    "mediumseagreen",
    "darkcyan",
    "lightcyan",
];

/// Display colors for misclassification transition types, indexed by
/// transition code
pub const ERROR_PALETTE: [&str; 6] = [
    "crimson",
    "darkorange",
    "peachpuff",
    "gold",
    "yellow",
    "deeppink",
];

/// Default search radius for the point query, in meters
pub const CLICK_RADIUS_METERS: f64 = 9_000.0;

const POINT_SIZE: f32 = 6.0;
const STROKE_WIDTH: f32 = 0.5;

/// An ordered mapping from class code to display color
///
/// The palette is validated at construction against the number of classes it
/// has to cover; a code outside the validated range fails loudly on lookup
/// instead of wrapping around.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    /// Build a palette covering `n_classes` classes
    ///
    /// ### Errors
    ///
    /// Fails if fewer colors than classes are supplied.
    pub fn new<S: Into<String>>(colors: Vec<S>, n_classes: usize) -> Result<Self> {
        if colors.len() < n_classes {
            return Err(DataError::PaletteTooSmall {
                classes: n_classes,
                colors: colors.len(),
            });
        }

        Ok(Palette {
            colors: colors.into_iter().map(|x| x.into()).collect(),
        })
    }

    /// The stock land-cover palette, validated against `n_classes`
    pub fn landcover(n_classes: usize) -> Result<Self> {
        Self::new(LANDCOVER_PALETTE.to_vec(), n_classes)
    }

    /// The stock misclassification palette, validated against `n_classes`
    pub fn errors(n_classes: usize) -> Result<Self> {
        Self::new(ERROR_PALETTE.to_vec(), n_classes)
    }

    /// Color assigned to a class code
    ///
    /// ### Errors
    ///
    /// Fails if the code is out of range for this palette.
    pub fn color(&self, code: usize) -> Result<&str> {
        self.colors
            .get(code)
            .map(|x| x.as_str())
            .ok_or(DataError::CodeOutOfRange {
                code,
                len: self.colors.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// A plot styled for display, carrying its full attribute set
#[derive(Debug, Clone)]
pub struct StyledPoint {
    pub record: PlotRecord,
    pub color: String,
    pub point_size: f32,
    pub stroke_width: f32,
}

/// A named set of styled points, ready to be handed to a map renderer
#[derive(Debug, Clone)]
pub struct StyledLayer {
    name: String,
    points: Vec<StyledPoint>,
}

impl StyledLayer {
    /// Style one point per record, colored by its class code
    ///
    /// ### Errors
    ///
    /// Fails if the number of codes does not match the number of records, or
    /// if any code is out of range for the palette.
    pub fn from_codes<S: Into<String>>(
        name: S,
        records: &[PlotRecord],
        codes: &[usize],
        palette: &Palette,
    ) -> Result<Self> {
        if records.len() != codes.len() {
            return Err(DataError::MismatchedLengths(records.len(), codes.len()));
        }

        let points = records
            .iter()
            .zip(codes.iter())
            .map(|(record, &code)| {
                Ok(StyledPoint {
                    record: record.clone(),
                    color: palette.color(code)?.to_owned(),
                    point_size: POINT_SIZE,
                    stroke_width: STROKE_WIDTH,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(StyledLayer {
            name: name.into(),
            points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[StyledPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find the styled point closest to a query coordinate
    ///
    /// Returns the nearest point within `radius_meters` of the query, or
    /// `None` when no point lies that close. The latter is the benign
    /// "no feature found" outcome of a map click, not an error.
    pub fn find_nearest(&self, lon: f64, lat: f64, radius_meters: f64) -> Option<&StyledPoint> {
        self.points
            .iter()
            .map(|point| {
                (
                    point,
                    haversine_meters(lon, lat, point.record.lon, point.record.lat),
                )
            })
            .filter(|(_, distance)| *distance <= radius_meters)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(point, _)| point)
    }
}

/// One color/label row of a legend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendRow {
    pub color: String,
    pub label: String,
}

/// An ordered legend panel: a title and one color/label row per class
///
/// Different legends, such as the true land-cover legend and the
/// misclassification legend, are independent values and never share state.
#[derive(Debug, Clone)]
pub struct Legend {
    title: String,
    rows: Vec<LegendRow>,
}

impl Legend {
    /// Build a legend with one row per label, colored in label order
    ///
    /// ### Errors
    ///
    /// Fails if the palette holds fewer colors than there are labels.
    pub fn new<T, S>(title: T, labels: &[S], palette: &Palette) -> Result<Self>
    where
        T: Into<String>,
        S: AsRef<str>,
    {
        let rows = labels
            .iter()
            .enumerate()
            .map(|(code, label)| {
                Ok(LegendRow {
                    color: palette.color(code)?.to_owned(),
                    label: label.as_ref().to_owned(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Legend {
            title: title.into(),
            rows,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[LegendRow] {
        &self.rows
    }
}

/// Great-circle distance between two coordinates in meters
pub fn haversine_meters(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}
