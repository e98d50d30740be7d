//! Datasets
//!
//! This module implements the dataset container shared by all terracart
//! algorithms: a dense matrix of numeric predictors with one categorical
//! target per row, plus human readable feature names.
use ndarray::{Array1, Array2, Axis};

use num_traits::{FromPrimitive, NumCast};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::iter::Sum;

use crate::error::{Error, Result};

/// Assign every observation of a set to either the training (`true`) or the
/// testing (`false`) partition
///
/// Every observation receives an independent uniform draw in `[0, 1)`; draws
/// below `ratio` select the training partition. The seed makes the assignment
/// reproducible. Used by [`Dataset::random_split`] and by the plot-table
/// splitter in `terracart-datasets`, so that both split the same way.
///
/// ### Errors
///
/// Fails if `ratio` lies outside the open interval `(0, 1)`.
pub fn split_assignments(nsamples: usize, ratio: f64, seed: u64) -> Result<Vec<bool>> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(Error::Parameters(format!(
            "split ratio should lie in (0, 1), but was {}",
            ratio
        )));
    }

    let mut rng = SmallRng::seed_from_u64(seed);

    Ok((0..nsamples).map(|_| rng.gen::<f64>() < ratio).collect())
}

/// Floating point numbers
///
/// This trait bound multiplexes the common assumptions about floating point
/// numbers and implements them for 32bit and 64bit floats. They are used for
/// the predictor values of a dataset.
pub trait Float:
    num_traits::Float + FromPrimitive + Default + Sum + fmt::Display + fmt::Debug + 'static
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}
impl Float for f64 {}

/// Discrete labels
///
/// Labels are countable, comparable and hashable. Booleans (binary tasks),
/// integer class codes and strings (multi-class tasks) are supported.
pub trait Label: PartialEq + Eq + Hash + Clone {}

impl Label for bool {}
impl Label for usize {}
impl Label for u32 {}
impl Label for u64 {}
impl Label for i32 {}
impl Label for i64 {}
impl Label for String {}
impl Label for &str {}

/// A labeled dataset
///
/// Rows of `records` are observations, columns are named features. The target
/// array assigns one label per observation.
#[derive(Debug, Clone)]
pub struct Dataset<F, L> {
    records: Array2<F>,
    targets: Array1<L>,
    feature_names: Vec<String>,
}

impl<F: Float, L: Label> Dataset<F, L> {
    /// Create a dataset from a record matrix and a target array.
    ///
    /// ### Panics
    ///
    /// If the number of rows in `records` does not match the number of
    /// targets.
    pub fn new(records: Array2<F>, targets: Array1<L>) -> Self {
        assert_eq!(
            records.nrows(),
            targets.len(),
            "the number of records must match the number of targets"
        );

        let feature_names = (0..records.ncols()).map(|i| format!("feature-{}", i)).collect();

        Dataset {
            records,
            targets,
            feature_names,
        }
    }

    /// Replace the auto-generated feature names
    pub fn with_feature_names<S: Into<String>>(mut self, names: Vec<S>) -> Self {
        assert_eq!(
            names.len(),
            self.records.ncols(),
            "one feature name per column is required"
        );

        self.feature_names = names.into_iter().map(|x| x.into()).collect();
        self
    }

    /// Predictor matrix, one row per observation
    pub fn records(&self) -> &Array2<F> {
        &self.records
    }

    /// Target labels, one per observation
    pub fn targets(&self) -> &Array1<L> {
        &self.targets
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn nsamples(&self) -> usize {
        self.records.nrows()
    }

    pub fn nfeatures(&self) -> usize {
        self.records.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.nsamples() == 0
    }

    /// Count the occurrence of every label among the visible observations
    ///
    /// The mask must have one entry per observation; hidden observations do
    /// not contribute to the frequencies.
    pub fn label_frequencies_with_mask(&self, mask: &[bool]) -> HashMap<L, usize> {
        let mut freqs = HashMap::new();

        for (target, _) in self.targets.iter().zip(mask.iter()).filter(|(_, &m)| m) {
            *freqs.entry(target.clone()).or_insert(0) += 1;
        }

        freqs
    }

    /// Count the occurrence of every label
    pub fn label_frequencies(&self) -> HashMap<L, usize> {
        self.label_frequencies_with_mask(&vec![true; self.nsamples()])
    }

    /// Distinct labels in order of first occurrence
    pub fn labels(&self) -> Vec<L> {
        let mut seen = Vec::new();
        for target in self.targets.iter() {
            if !seen.contains(target) {
                seen.push(target.clone());
            }
        }

        seen
    }

    /// Split observations at random into a training and a testing partition
    ///
    /// Every observation receives an independent uniform draw in `[0, 1)`;
    /// draws below `ratio` select the training partition, the rest the testing
    /// partition. The seed makes the partition reproducible: the same seed
    /// always yields the same assignment. The two partitions are disjoint and
    /// together contain every observation, but the achieved ratio is only
    /// approximately `ratio` (no stratification).
    ///
    /// ### Errors
    ///
    /// Fails if `ratio` lies outside the open interval `(0, 1)`.
    pub fn random_split(&self, ratio: f64, seed: u64) -> Result<(Self, Self)> {
        let assignments = split_assignments(self.nsamples(), ratio, seed)?;

        let mut train_idx = Vec::new();
        let mut test_idx = Vec::new();
        for (row, in_training) in assignments.into_iter().enumerate() {
            if in_training {
                train_idx.push(row);
            } else {
                test_idx.push(row);
            }
        }

        Ok((self.select_rows(&train_idx), self.select_rows(&test_idx)))
    }

    fn select_rows(&self, indices: &[usize]) -> Self {
        let records = self.records.select(Axis(0), indices);
        let targets = indices
            .iter()
            .map(|&i| self.targets[i].clone())
            .collect::<Array1<_>>();

        Dataset {
            records,
            targets,
            feature_names: self.feature_names.clone(),
        }
    }
}
