//! CART decision trees
//!
use std::collections::{HashMap, HashSet};

use ndarray::{Array1, ArrayBase, Axis, Data, Ix1, Ix2};

use super::NodeIter;
use super::{DecisionTreeValidParams, SplitQuality};
use terracart::{
    error::{Error, Result},
    traits::{Fit, Predict},
    Dataset, Float, Label,
};

/// Tracks which observations are visible to a subtree
///
/// The decision tree algorithm splits observations at a certain split value
/// for a specific feature, so each subtree only sees a subset of the
/// observations. The subset is tracked with a boolean per row instead of
/// copying the data.
struct ActiveRows {
    rows: Vec<bool>,
    count: usize,
}

impl ActiveRows {
    fn all(nsamples: usize) -> Self {
        ActiveRows {
            rows: vec![true; nsamples],
            count: nsamples,
        }
    }

    fn none(nsamples: usize) -> Self {
        ActiveRows {
            rows: vec![false; nsamples],
            count: 0,
        }
    }

    fn activate(&mut self, row: usize) {
        self.rows[row] = true;
        self.count += 1;
    }
}

/// Observations of a single feature, presorted ascending by value
///
/// Sorting once per feature before fitting lets every node evaluate all
/// candidate split values for that feature in a single pass.
struct FeatureOrder<'a, F> {
    name: &'a str,
    positions: Vec<(usize, F)>,
}

impl<'a, F: Float> FeatureOrder<'a, F> {
    fn of_column(
        records: &ArrayBase<impl Data<Elem = F>, Ix2>,
        feature_idx: usize,
        name: &'a str,
    ) -> Self {
        let mut positions = records
            .index_axis(Axis(1), feature_idx)
            .iter()
            .cloned()
            .enumerate()
            .collect::<Vec<(usize, F)>>();
        positions.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Greater));

        FeatureOrder { name, positions }
    }
}

/// A node in the decision tree
#[derive(Debug, Clone)]
pub struct TreeNode<F, L> {
    feature_idx: usize,
    feature_name: String,
    split_value: F,
    impurity_decrease: F,
    left: Option<Box<TreeNode<F, L>>>,
    right: Option<Box<TreeNode<F, L>>>,
    leaf: bool,
    prediction: L,
    depth: usize,
}

impl<F: Float, L: Label> TreeNode<F, L> {
    fn leaf(prediction: L, depth: usize) -> Self {
        TreeNode {
            feature_idx: 0,
            feature_name: String::new(),
            split_value: F::zero(),
            impurity_decrease: F::zero(),
            left: None,
            right: None,
            leaf: true,
            prediction,
            depth,
        }
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Returns the depth of the node in the decision tree
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `Some(prediction)` for leaf nodes and `None` for internal nodes
    pub fn prediction(&self) -> Option<L> {
        if self.leaf {
            Some(self.prediction.clone())
        } else {
            None
        }
    }

    /// Returns both children, first left then right
    pub fn children(&self) -> Vec<&Option<Box<TreeNode<F, L>>>> {
        vec![&self.left, &self.right]
    }

    /// Return the split (feature index, value) and its impurity decrease
    pub fn split(&self) -> (usize, F, F) {
        (self.feature_idx, self.split_value, self.impurity_decrease)
    }

    /// Returns the name of the feature used in the split if the node is
    /// internal, `None` otherwise
    pub fn feature_name(&self) -> Option<&String> {
        if self.leaf {
            None
        } else {
            Some(&self.feature_name)
        }
    }

    /// Recursively fits the node
    fn fit(
        dataset: &Dataset<F, L>,
        active: &ActiveRows,
        hyperparameters: &DecisionTreeValidParams<F, L>,
        orders: &[FeatureOrder<F>],
        depth: usize,
    ) -> Result<Self> {
        // class frequencies among the observations visible to this node; the
        // node predicts the modal class of that subset
        let parent_freq = dataset.label_frequencies_with_mask(&active.rows);
        let prediction = modal_class(&parent_freq).ok_or(Error::NotEnoughSamples)?;
        let targets = dataset.targets();

        // stop when too few observations remain or the maximal depth is reached
        if active.count < hyperparameters.min_samples_split()
            || hyperparameters
                .max_depth()
                .map(|max_depth| depth >= max_depth)
                .unwrap_or(false)
        {
            return Ok(Self::leaf(prediction, depth));
        }

        // Find the best split over all features. For each feature the
        // observations start out in the right subset and move one by one, in
        // ascending feature order, to the left subset. Every boundary between
        // two distinct neighbouring values is a candidate split, scored by the
        // weighted impurity of the two resulting subsets.
        let mut best: Option<(usize, F, f64)> = None;

        for (feature_idx, order) in orders.iter().enumerate() {
            let mut right_freq = parent_freq.clone();
            let mut left_freq: HashMap<L, usize> = HashMap::new();

            let total = active.count;
            let mut n_right = total;
            let mut n_left = 0;

            for i in 0..order.positions.len() - 1 {
                let (row, value) = order.positions[i];

                // skip observations hidden from this subtree
                if !active.rows[row] {
                    continue;
                }

                let class = &targets[row];
                *right_freq.get_mut(class).unwrap() -= 1;
                n_right -= 1;
                *left_freq.entry(class.clone()).or_insert(0) += 1;
                n_left += 1;

                // equal neighbouring values must end up on the same side
                if (value - order.positions[i + 1].1).abs() < F::cast(1e-5) {
                    continue;
                }

                if n_left < hyperparameters.min_samples_leaf()
                    || n_right < hyperparameters.min_samples_leaf()
                {
                    continue;
                }

                let (left_score, right_score) = match hyperparameters.split_quality() {
                    SplitQuality::Gini => (gini_impurity(&left_freq), gini_impurity(&right_freq)),
                    SplitQuality::Entropy => (entropy(&left_freq), entropy(&right_freq)),
                };

                let score =
                    (n_left as f64 * left_score + n_right as f64 * right_score) / total as f64;

                // take the midpoint between this value and the next as the split
                let split_value = (value + order.positions[i + 1].1) / F::cast(2.0);

                best = match best.take() {
                    None => Some((feature_idx, split_value, score)),
                    Some((_, _, best_score)) if score < best_score => {
                        Some((feature_idx, split_value, score))
                    }
                    x => x,
                };
            }
        }

        // The impurity decrease is the impurity of the unsplit node minus the
        // weighted impurity of the best split. The split is only applied when
        // the decrease clears the configured threshold, otherwise the node
        // becomes a leaf predicting the modal class.
        let impurity_decrease = if let Some((_, _, best_score)) = best {
            let parent_score = match hyperparameters.split_quality() {
                SplitQuality::Gini => gini_impurity(&parent_freq),
                SplitQuality::Entropy => entropy(&parent_freq),
            };

            F::cast(parent_score) - F::cast(best_score)
        } else {
            F::zero()
        };

        if impurity_decrease < hyperparameters.min_impurity_decrease() {
            return Ok(Self::leaf(prediction, depth));
        }

        let (feature_idx, split_value, _) = best.unwrap();

        let mut left_rows = ActiveRows::none(dataset.nsamples());
        let mut right_rows = ActiveRows::none(dataset.nsamples());

        for row in 0..dataset.nsamples() {
            if active.rows[row] {
                if dataset.records()[(row, feature_idx)] <= split_value {
                    left_rows.activate(row);
                } else {
                    right_rows.activate(row);
                }
            }
        }

        let left = if left_rows.count > 0 {
            Some(Box::new(TreeNode::fit(
                dataset,
                &left_rows,
                hyperparameters,
                orders,
                depth + 1,
            )?))
        } else {
            None
        };

        let right = if right_rows.count > 0 {
            Some(Box::new(TreeNode::fit(
                dataset,
                &right_rows,
                hyperparameters,
                orders,
                depth + 1,
            )?))
        } else {
            None
        };

        let leaf = left.is_none() || right.is_none();

        Ok(TreeNode {
            feature_idx,
            feature_name: orders[feature_idx].name.to_owned(),
            split_value,
            impurity_decrease,
            left,
            right,
            leaf,
            prediction,
            depth,
        })
    }

    /// Prune the tree after fitting it
    ///
    /// Removes subtrees in which every leaf carries the same prediction, so
    /// that the fitted tree stays as small as possible.
    fn prune(&mut self) -> Option<L> {
        if self.is_leaf() {
            return Some(self.prediction.clone());
        }

        let left = self.left.as_mut().and_then(|x| x.prune());
        let right = self.right.as_mut().and_then(|x| x.prune());

        match (left, right) {
            (Some(x), Some(y)) => {
                if x == y {
                    self.prediction = x.clone();
                    self.left = None;
                    self.right = None;
                    self.leaf = true;

                    Some(x)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// A fitted CART model for classification
///
/// ### Structure
///
/// A decision tree is a binary tree where each internal node holds a feature
/// and a split value: observations with `feature <= split_value` fall in the
/// left subtree, the others in the right subtree. Leaf nodes predict the most
/// common label among the observations that reached them.
///
/// ### Algorithm
///
/// Starting from a single root node, the tree is grown by greedy recursive
/// splitting. Each node evaluates, for every feature, every boundary between
/// two distinct observed values, and applies the split with the best
/// [quality score](SplitQuality). If no candidate split decreases the
/// impurity enough, the node becomes a leaf.
///
/// ### Predictions
///
/// To predict the label of an observation the tree is traversed from the root
/// to a leaf, choosing the left or right child at each internal node by
/// comparing the observation's feature values against the split values.
#[derive(Debug)]
pub struct DecisionTree<F: Float, L: Label> {
    root: TreeNode<F, L>,
    num_features: usize,
}

impl<F: Float, L: Label> Predict<F, L> for DecisionTree<F, L> {
    /// Predict one label for each row of a matrix of predictors
    fn predict<D: Data<Elem = F>>(&self, records: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::from_iter(
            records
                .rows()
                .into_iter()
                .map(|row| classify(&row, &self.root)),
        )
    }
}

impl<F: Float, L: Label> Fit<F, L> for DecisionTreeValidParams<F, L> {
    type Object = DecisionTree<F, L>;

    /// Fit a decision tree on a labeled dataset
    ///
    /// ### Errors
    ///
    /// Fails with [`Error::NotEnoughSamples`] when the training set is empty.
    fn fit(&self, dataset: &Dataset<F, L>) -> Result<Self::Object> {
        if dataset.is_empty() {
            return Err(Error::NotEnoughSamples);
        }

        let records = dataset.records();
        let feature_names = dataset.feature_names();
        let orders = (0..records.ncols())
            .map(|feature_idx| {
                FeatureOrder::of_column(records, feature_idx, &feature_names[feature_idx])
            })
            .collect::<Vec<_>>();

        let mut root = TreeNode::fit(
            dataset,
            &ActiveRows::all(records.nrows()),
            self,
            &orders,
            0,
        )?;
        root.prune();

        Ok(DecisionTree {
            root,
            num_features: records.ncols(),
        })
    }
}

impl<F: Float, L: Label> DecisionTree<F, L> {
    /// Create a node iterator in level-order (BFT)
    pub fn iter_nodes(&self) -> NodeIter<F, L> {
        NodeIter::new(vec![&self.root])
    }

    /// Return the indices of the features used by at least one split
    pub fn features(&self) -> Vec<usize> {
        let mut fitted_features = HashSet::new();

        for node in self.iter_nodes().filter(|node| !node.is_leaf()) {
            fitted_features.insert(node.feature_idx);
        }

        fitted_features.into_iter().collect::<Vec<_>>()
    }

    /// Return the mean impurity decrease for each feature
    pub fn mean_impurity_decrease(&self) -> Vec<F> {
        let mut impurity_decrease = vec![F::zero(); self.num_features];
        let mut num_nodes = vec![0; self.num_features];

        for node in self.iter_nodes().filter(|node| !node.leaf) {
            impurity_decrease[node.feature_idx] = impurity_decrease[node.feature_idx] + node.impurity_decrease;
            num_nodes[node.feature_idx] += 1;
        }

        impurity_decrease
            .into_iter()
            .zip(num_nodes.into_iter())
            .map(|(val, n)| if n == 0 { F::zero() } else { val / F::cast(n) })
            .collect()
    }

    /// Return the relative impurity decrease for each feature
    pub fn relative_impurity_decrease(&self) -> Vec<F> {
        let mean_impurity_decrease = self.mean_impurity_decrease();
        let sum: F = mean_impurity_decrease.iter().cloned().sum();

        if sum == F::zero() {
            return mean_impurity_decrease;
        }

        mean_impurity_decrease
            .into_iter()
            .map(|x| x / sum)
            .collect()
    }

    /// Return the feature importance, i.e. the relative impurity decrease, for
    /// each feature
    pub fn feature_importance(&self) -> Vec<F> {
        self.relative_impurity_decrease()
    }

    /// Return the root node of the tree
    pub fn root_node(&self) -> &TreeNode<F, L> {
        &self.root
    }

    /// Return the maximal depth of the tree
    pub fn max_depth(&self) -> usize {
        self.iter_nodes()
            .fold(0, |max, node| usize::max(max, node.depth))
    }

    /// Return the number of leaves in this tree
    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }
}

/// Classify a single observation by traversing the tree from `node` downwards
fn classify<F: Float, L: Label>(
    row: &ArrayBase<impl Data<Elem = F>, Ix1>,
    node: &TreeNode<F, L>,
) -> L {
    if node.leaf {
        node.prediction.clone()
    } else if row[node.feature_idx] <= node.split_value {
        classify(row, node.left.as_ref().unwrap())
    } else {
        classify(row, node.right.as_ref().unwrap())
    }
}

/// Find the most frequent class in a frequency map. If two classes occur
/// equally often the first one encountered is returned. Returns `None` for an
/// empty map.
fn modal_class<L: Label>(class_freq: &HashMap<L, usize>) -> Option<L> {
    class_freq
        .iter()
        .fold(None, |acc: Option<(&L, usize)>, (class, &freq)| match acc {
            Some((_, best_freq)) if best_freq >= freq => acc,
            _ => Some((class, freq)),
        })
        .map(|(class, _)| class.clone())
}

/// Given the class frequencies calculates the Gini impurity of the subset
fn gini_impurity<L: Label>(class_freq: &HashMap<L, usize>) -> f64 {
    let n_samples = class_freq.values().sum::<usize>();
    assert!(n_samples > 0);

    let purity = class_freq
        .values()
        .map(|&x| x as f64 / n_samples as f64)
        .map(|x| x * x)
        .sum::<f64>();

    1.0 - purity
}

/// Given the class frequencies calculates the entropy of the subset
fn entropy<L: Label>(class_freq: &HashMap<L, usize>) -> f64 {
    let n_samples = class_freq.values().sum::<usize>();
    assert!(n_samples > 0);

    class_freq
        .values()
        .map(|&x| x as f64 / n_samples as f64)
        .map(|x| if x > 0.0 { -x * x.log2() } else { 0.0 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, s, Array, Array1, Array2, Axis};
    use rand::rngs::SmallRng;

    use terracart::metrics::ToConfusionMatrix;
    use terracart::ParamGuard;

    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};

    #[test]
    fn modal_class_example() {
        let class_freq = vec![("Trees", 6), ("Water", 2)].into_iter().collect();

        assert_eq!(modal_class(&class_freq), Some("Trees"));
        assert_eq!(modal_class::<usize>(&HashMap::new()), None);
    }

    #[test]
    fn gini_impurity_example() {
        let class_freq = vec![(0, 6), (1, 2), (2, 0)].into_iter().collect();

        // Class 0 occurs 75% of the time
        // Class 1 occurs 25% of the time
        // Class 2 occurs 0% of the time
        // Gini impurity is 1 - 0.75*0.75 - 0.25*0.25 - 0*0 = 0.375
        assert_abs_diff_eq!(gini_impurity(&class_freq), 0.375, epsilon = 1e-5);
    }

    #[test]
    fn entropy_example() {
        let class_freq = vec![(0, 6), (1, 2), (2, 0)].into_iter().collect();

        // Entropy is -0.75*log2(0.75) - 0.25*log2(0.25) - 0*log2(0) = 0.81127812
        assert_abs_diff_eq!(entropy(&class_freq), 0.81127, epsilon = 1e-5);

        // If the subset is pure then the entropy is zero
        let perfect_class_freq = vec![(0, 8), (1, 0), (2, 0)].into_iter().collect();

        assert_abs_diff_eq!(entropy(&perfect_class_freq), 0.0, epsilon = 1e-5);
    }

    #[test]
    /// Single feature test
    ///
    /// Generate a dataset where a single feature perfectly correlates with the
    /// target while the remaining features are uniform noise and do not add
    /// any information.
    fn single_feature_random_noise_binary() -> terracart::error::Result<()> {
        let mut rng = SmallRng::seed_from_u64(13);
        let mut data = Array::random_using((50, 10), Uniform::new(-4., 4.), &mut rng);
        data.slice_mut(s![.., 8]).assign(
            &(0..50)
                .map(|x| if x < 25 { 0.0 } else { 1.0 })
                .collect::<Array1<_>>(),
        );

        let targets = (0..50).map(|x| x < 25).collect::<Array1<_>>();
        let dataset = Dataset::new(data, targets);

        let model = DecisionTree::params().max_depth(Some(2)).fit(&dataset)?;

        // only feature 8 carries information
        assert_eq!(&model.features(), &[8]);

        let ground_truth = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];

        for (imp, truth) in model.feature_importance().iter().zip(&ground_truth) {
            assert_abs_diff_eq!(imp, truth, epsilon = 1e-15);
        }

        // check for perfect accuracy
        let cm = model
            .predict(dataset.records())
            .confusion_matrix(dataset.targets())?;
        assert_abs_diff_eq!(cm.accuracy(), 1.0, epsilon = 1e-15);

        Ok(())
    }

    #[test]
    /// Check that for random data the max depth is used
    fn check_max_depth() -> terracart::error::Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);

        // create very sparse data
        let data = Array::random_using((50, 50), Uniform::new(-1., 1.), &mut rng);
        let targets = (0..50).collect::<Array1<usize>>();

        let dataset = Dataset::new(data, targets);

        // check that the provided depth is actually used
        for max_depth in &[1, 5, 10, 20] {
            let model = DecisionTree::params()
                .max_depth(Some(*max_depth))
                .min_impurity_decrease(1e-10f64)
                .min_samples_split(2)
                .fit(&dataset)?;
            assert_eq!(model.max_depth(), *max_depth);
        }

        Ok(())
    }

    #[test]
    /// Small perfectly separable dataset test
    ///
    /// This dataset of three elements is perfectly separable using the second
    /// feature.
    fn perfectly_separable_small() -> terracart::error::Result<()> {
        let data = array![[1., 2., 3.], [1., 2., 4.], [1., 3., 3.5]];
        let targets = array![0, 0, 1];

        let dataset = Dataset::new(data.clone(), targets);
        let model = DecisionTree::params().max_depth(Some(1)).fit(&dataset)?;

        assert_eq!(model.predict(&data), array![0, 0, 1]);

        Ok(())
    }

    #[test]
    /// String labels survive fitting and prediction untouched
    fn string_labels() -> terracart::error::Result<()> {
        let data = array![[0.05, 3.0], [0.1, 5.0], [0.7, 305.0], [0.8, 310.0]];
        let targets = array![
            "Water".to_string(),
            "Water".to_string(),
            "Trees".to_string(),
            "Trees".to_string()
        ];

        let dataset = Dataset::new(data.clone(), targets.clone());
        let model = DecisionTree::params().fit(&dataset)?;

        assert_eq!(model.predict(&data), targets);

        Ok(())
    }

    #[test]
    /// Four well separated clusters, one per class
    fn multilabel_four_uniform() -> terracart::error::Result<()> {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut data = concatenate(
            Axis(0),
            &[Array2::random_using((40, 2), Uniform::new(-1., 1.), &mut rng).view()],
        )
        .unwrap();

        data.outer_iter_mut().enumerate().for_each(|(i, mut p)| {
            if i < 10 {
                p += &array![-2., -2.]
            } else if i < 20 {
                p += &array![-2., 2.];
            } else if i < 30 {
                p += &array![2., -2.];
            } else {
                p += &array![2., 2.];
            }
        });

        let targets = (0..40)
            .map(|x| match x {
                x if x < 10 => 0,
                x if x < 20 => 1,
                x if x < 30 => 2,
                _ => 3,
            })
            .collect::<Array1<_>>();

        let dataset = Dataset::new(data.clone(), targets);

        let model = DecisionTree::params().fit(&dataset)?;
        let prediction = model.predict(&data);

        let cm = prediction.confusion_matrix(dataset.targets())?;
        assert!(cm.accuracy() > 0.99);

        Ok(())
    }

    #[test]
    fn empty_training_set_fails() {
        let data = Array2::<f64>::zeros((0, 3));
        let targets = Array1::<usize>::zeros(0);
        let dataset = Dataset::new(data, targets);

        assert!(DecisionTree::params().fit(&dataset).is_err());
    }

    #[test]
    #[should_panic]
    /// Check that a small or negative impurity decrease panics
    fn panic_min_impurity_decrease() {
        DecisionTree::<f64, bool>::params()
            .min_impurity_decrease(0.0)
            .check()
            .unwrap();
    }
}
