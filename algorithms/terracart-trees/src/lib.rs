//!
//! # Decision tree learning
//! `terracart-trees` provides a pure Rust implementation of single-tree CART
//! fitting for classification.
//!
//! # The big picture
//!
//! `terracart-trees` is a crate in the terracart ecosystem, a toolkit for
//! supervised land-cover classification from remote-sensing plot tables.
//! A decision tree predicts the value of a categorical target, such as the
//! dominant land cover of a plot, by learning simple decision rules inferred
//! from numeric predictors like spectral reflectance bands, vegetation
//! indices and elevation.
//!
//! The full classification workflow, from a raw plot table to a styled map
//! layer, is shown in `examples/landcover_cart.rs`.
//!

mod decision_trees;

pub use decision_trees::*;

pub use terracart::error::Result;
