//! Error types in terracart
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("prediction and ground truth differ in length ({0} vs {1})")]
    MismatchedLengths(usize, usize),
    #[error("not enough samples")]
    NotEnoughSamples,
}
