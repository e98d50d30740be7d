use std::marker::PhantomData;

use terracart::{
    error::{Error, Result},
    Float, Label, ParamGuard,
};

use crate::DecisionTree;

/// The metric used to determine the feature by which a node is split
#[derive(Clone, Copy, Debug)]
pub enum SplitQuality {
    /// Measures the probability of a randomly chosen observation in the
    /// subtree being misclassified, defined as one minus the sum over all
    /// labels of the squared probability of encountering that label. At each
    /// step the split which decreases the weighted Gini impurity of its two
    /// subtrees the most is applied.
    Gini,
    /// Measures the entropy of a subtree, defined as the sum over all labels
    /// of the probability of encountering that label in the subtree times its
    /// logarithm in base two, with negative sign. At each step the split with
    /// the biggest information gain is applied.
    Entropy,
}

/// The set of hyperparameters that can be specified for fitting a
/// [decision tree](crate::DecisionTree).
///
/// ### Example
///
/// ```rust
/// use terracart_trees::{DecisionTree, SplitQuality};
/// use terracart::prelude::*;
/// use ndarray::array;
///
/// let records = array![[0.1, 12.0], [0.2, 30.0], [0.8, 410.0], [0.7, 380.0]];
/// let targets = array!["Water", "Water", "Trees", "Trees"];
/// let dataset = Dataset::new(records, targets);
///
/// let tree = DecisionTree::params()
///     .split_quality(SplitQuality::Entropy)
///     .max_depth(Some(3))
///     .fit(&dataset)
///     .unwrap();
///
/// assert_eq!(tree.predict(dataset.records()), *dataset.targets());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DecisionTreeValidParams<F, L> {
    split_quality: SplitQuality,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    min_impurity_decrease: F,

    label_marker: PhantomData<L>,
}

impl<F: Float, L> DecisionTreeValidParams<F, L> {
    pub fn split_quality(&self) -> SplitQuality {
        self.split_quality
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn min_impurity_decrease(&self) -> F {
        self.min_impurity_decrease
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DecisionTreeParams<F, L>(DecisionTreeValidParams<F, L>);

impl<F: Float, L: Label> DecisionTreeParams<F, L> {
    pub fn new() -> Self {
        Self(DecisionTreeValidParams {
            split_quality: SplitQuality::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_impurity_decrease: F::cast(0.00001),
            label_marker: PhantomData,
        })
    }

    /// Sets the metric used to decide the feature on which to split a node
    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.split_quality = split_quality;
        self
    }

    /// Sets the optional limit to the depth of the decision tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Sets the minimum number of observations required to split a node
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Sets the minimum number of observations that a split has to place in
    /// each leaf
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Sets the minimum decrease in impurity that a split needs to bring in
    /// order for it to be applied
    pub fn min_impurity_decrease(mut self, min_impurity_decrease: F) -> Self {
        self.0.min_impurity_decrease = min_impurity_decrease;
        self
    }
}

impl<F: Float, L: Label> Default for DecisionTreeParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Label> DecisionTree<F, L> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `split_quality = SplitQuality::Gini`
    /// * `max_depth = None`
    /// * `min_samples_split = 2`
    /// * `min_samples_leaf = 1`
    /// * `min_impurity_decrease = 0.00001`
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> DecisionTreeParams<F, L> {
        DecisionTreeParams::new()
    }
}

impl<F: Float, L> ParamGuard for DecisionTreeParams<F, L> {
    type Checked = DecisionTreeValidParams<F, L>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.min_impurity_decrease < F::epsilon() {
            Err(Error::Parameters(format!(
                "Minimum impurity decrease should be greater than zero, but was {}",
                self.0.min_impurity_decrease
            )))
        } else if self.0.min_samples_leaf == 0 {
            Err(Error::Parameters(
                "A split must place at least one observation in each leaf".to_string(),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
