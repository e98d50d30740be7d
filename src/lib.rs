//! `terracart` provides the building blocks for supervised land-cover
//! classification workflows over remote-sensing plot tables.
//!
//! The crate collects the pieces every such workflow shares: a labeled
//! [`Dataset`] container with named predictor columns, a seeded random
//! train/test splitter, the [`Fit`](traits::Fit)/[`Predict`](traits::Predict)
//! seams implemented by the classifiers in the `algorithms/` crates, checked
//! hyperparameters via [`ParamGuard`], and the classification metrics used to
//! judge a fitted model (confusion matrix, overall accuracy, Cohen's kappa,
//! producer's and consumer's accuracy, misclassification analysis).
//!
//! Domain-side concerns, such as reading a plot table from CSV, encoding
//! land-cover labels and styling classified points for a map, live in the
//! `terracart-datasets` crate; the CART classifier lives in
//! `terracart-trees`.

pub mod dataset;
pub mod error;
mod metrics_classification;
pub mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::{Dataset, Float, Label};
pub use param_guard::ParamGuard;

/// Common metrics functions for classification
pub mod metrics {
    pub use crate::metrics_classification::{
        misclassifications, transition_histogram, ConfusionMatrix, Misclassification,
        ToConfusionMatrix,
    };
}
