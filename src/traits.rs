//! Provide traits for different classes of algorithms
//!
use ndarray::{Array1, ArrayBase, Data, Ix2};

use crate::dataset::{Dataset, Float, Label};
use crate::error::Result;

/// Fit a model on a labeled dataset
pub trait Fit<F: Float, L: Label> {
    type Object;

    fn fit(&self, dataset: &Dataset<F, L>) -> Result<Self::Object>;
}

/// Predict a label for each row of a record matrix
pub trait Predict<F: Float, L> {
    fn predict<D: Data<Elem = F>>(&self, records: &ArrayBase<D, Ix2>) -> Array1<L>;
}
