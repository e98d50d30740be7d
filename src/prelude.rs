//! Terracart prelude.
//!
//! This module contains the most used types, type aliases, traits and
//! functions that you can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::dataset::{split_assignments, Dataset, Float, Label};

#[doc(no_inline)]
pub use crate::metrics_classification::{
    misclassifications, transition_histogram, ConfusionMatrix, Misclassification,
    ToConfusionMatrix,
};

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;
