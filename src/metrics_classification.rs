//! Common metrics for evaluating a classifier
//!
//! Scoring is essential for a classification task. This module implements a
//! confusion matrix and the scores derived from it: overall accuracy, Cohen's
//! kappa, producer's and consumer's accuracy per class, f-scores and per-class
//! misclassification rates, as well as helpers to inspect the individual
//! misclassified observations.
use std::collections::HashMap;
use std::fmt;

use ndarray::prelude::*;
use ndarray::Data;

use crate::dataset::Label;
use crate::error::{Error, Result};

/// Confusion matrix for multi-class evaluation
///
/// A confusion matrix shows predictions in a matrix, where rows correspond to
/// the actual class and columns to the predicted class. The diagonal entries
/// are correct predictions.
pub struct ConfusionMatrix<L> {
    matrix: Array2<usize>,
    members: Vec<L>,
}

impl<L: Label> ConfusionMatrix<L> {
    /// Raw counts, indexed `[actual, predicted]`
    pub fn counts(&self) -> &Array2<usize> {
        &self.matrix
    }

    /// The classes spanning the matrix, in the order of rows and columns
    pub fn members(&self) -> &[L] {
        &self.members
    }

    /// Total number of evaluated observations
    pub fn total(&self) -> usize {
        self.matrix.sum()
    }

    /// Number of correctly predicted observations
    pub fn correct(&self) -> usize {
        self.matrix.diag().sum()
    }

    /// Overall accuracy, the fraction of correct predictions
    pub fn accuracy(&self) -> f64 {
        self.correct() as f64 / self.total() as f64
    }

    /// Cohen's kappa coefficient
    ///
    /// Chance-corrected agreement between actual and predicted labels. The
    /// expected agreement is derived from the marginal distributions of the
    /// matrix. Always lies in `[-1, 1]`. If the marginals degenerate to an
    /// expected agreement of one, the coefficient is reported as zero.
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        let row_sums = self.matrix.sum_axis(Axis(1));
        let col_sums = self.matrix.sum_axis(Axis(0));

        let expected = row_sums
            .iter()
            .zip(col_sums.iter())
            .map(|(r, c)| (*r as f64) * (*c as f64))
            .sum::<f64>()
            / (total * total);

        if (1.0 - expected).abs() < f64::EPSILON {
            return 0.0;
        }

        (self.accuracy() - expected) / (1.0 - expected)
    }

    /// Producer's accuracy (recall) for every class
    ///
    /// Fraction of the actual members of a class that were predicted
    /// correctly. Classes absent from the ground truth score zero.
    pub fn producers_accuracy(&self) -> Array1<f64> {
        let row_sums = self.matrix.sum_axis(Axis(1));

        Array1::from_iter(
            self.matrix
                .diag()
                .iter()
                .zip(row_sums.iter())
                .map(|(d, s)| if *s == 0 { 0.0 } else { *d as f64 / *s as f64 }),
        )
    }

    /// Consumer's accuracy (precision) for every class
    ///
    /// Fraction of the predicted members of a class that actually belong to
    /// it. Classes never predicted score zero.
    pub fn consumers_accuracy(&self) -> Array1<f64> {
        let col_sums = self.matrix.sum_axis(Axis(0));

        Array1::from_iter(
            self.matrix
                .diag()
                .iter()
                .zip(col_sums.iter())
                .map(|(d, s)| if *s == 0 { 0.0 } else { *d as f64 / *s as f64 }),
        )
    }

    /// Recall for every class, alias of [`producers_accuracy`](Self::producers_accuracy)
    pub fn recall(&self) -> Array1<f64> {
        self.producers_accuracy()
    }

    /// Precision for every class, alias of [`consumers_accuracy`](Self::consumers_accuracy)
    pub fn precision(&self) -> Array1<f64> {
        self.consumers_accuracy()
    }

    /// Beta-weighted f-score for every class
    pub fn f_score(&self, beta: f64) -> Array1<f64> {
        let sb = beta * beta;
        let precision = self.precision();
        let recall = self.recall();

        Array1::from_iter(precision.iter().zip(recall.iter()).map(|(p, r)| {
            let denom = sb * p + r;
            if denom == 0.0 {
                0.0
            } else {
                (1.0 + sb) * (p * r) / denom
            }
        }))
    }

    /// f-score with beta=1 for every class
    pub fn f1_score(&self) -> Array1<f64> {
        self.f_score(1.0)
    }

    /// Misclassification rate for every class
    ///
    /// Fraction of the actual members of a class that were predicted as some
    /// other class, the complement of the producer's accuracy.
    pub fn misclassification_rates(&self) -> Array1<f64> {
        let row_sums = self.matrix.sum_axis(Axis(1));

        Array1::from_iter(
            self.matrix
                .diag()
                .iter()
                .zip(row_sums.iter())
                .map(|(d, s)| {
                    if *s == 0 {
                        0.0
                    } else {
                        (*s - *d) as f64 / *s as f64
                    }
                }),
        )
    }
}

/// Print a confusion matrix
impl<L> fmt::Debug for ConfusionMatrix<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let len = self.matrix.len_of(Axis(0));
        for _ in 0..len * 4 + 1 {
            write!(f, "-")?;
        }
        writeln!(f)?;

        for i in 0..len {
            write!(f, "| ")?;

            for j in 0..len {
                write!(f, "{} | ", self.matrix[(i, j)])?;
            }
            writeln!(f)?;
        }

        for _ in 0..len * 4 + 1 {
            write!(f, "-")?;
        }

        Ok(())
    }
}

/// Construct a confusion matrix from a prediction
///
/// The matrix spans the union of the classes observed in the prediction and
/// the ground truth, sorted ascending.
pub trait ToConfusionMatrix<L: Label> {
    fn confusion_matrix<D: Data<Elem = L>>(
        &self,
        ground_truth: &ArrayBase<D, Ix1>,
    ) -> Result<ConfusionMatrix<L>>;
}

impl<L: Label + Ord, C: Data<Elem = L>> ToConfusionMatrix<L> for ArrayBase<C, Ix1> {
    fn confusion_matrix<D: Data<Elem = L>>(
        &self,
        ground_truth: &ArrayBase<D, Ix1>,
    ) -> Result<ConfusionMatrix<L>> {
        if self.len() != ground_truth.len() {
            return Err(Error::MismatchedLengths(self.len(), ground_truth.len()));
        }
        if self.is_empty() {
            return Err(Error::NotEnoughSamples);
        }

        let mut classes = ground_truth
            .iter()
            .chain(self.iter())
            .cloned()
            .collect::<Vec<_>>();
        classes.sort();
        classes.dedup();

        let index = classes
            .iter()
            .enumerate()
            .map(|(i, class)| (class, i))
            .collect::<HashMap<_, usize>>();

        let mut matrix = Array2::zeros((classes.len(), classes.len()));
        for (truth, predicted) in ground_truth.iter().zip(self.iter()) {
            matrix[(index[truth], index[predicted])] += 1;
        }

        Ok(ConfusionMatrix {
            matrix,
            members: classes,
        })
    }
}

/// A single misclassified observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misclassification<L> {
    /// Row index of the observation in the evaluated set
    pub index: usize,
    pub actual: L,
    pub predicted: L,
}

impl<L: fmt::Display> Misclassification<L> {
    /// Transition descriptor in the form `actual -> predicted`
    pub fn transition(&self) -> String {
        format!("{} -> {}", self.actual, self.predicted)
    }
}

/// Collect the observations for which prediction and ground truth disagree
pub fn misclassifications<L: Label, C: Data<Elem = L>, D: Data<Elem = L>>(
    prediction: &ArrayBase<C, Ix1>,
    ground_truth: &ArrayBase<D, Ix1>,
) -> Result<Vec<Misclassification<L>>> {
    if prediction.len() != ground_truth.len() {
        return Err(Error::MismatchedLengths(
            prediction.len(),
            ground_truth.len(),
        ));
    }

    Ok(ground_truth
        .iter()
        .zip(prediction.iter())
        .enumerate()
        .filter(|(_, (actual, predicted))| actual != predicted)
        .map(|(index, (actual, predicted))| Misclassification {
            index,
            actual: actual.clone(),
            predicted: predicted.clone(),
        })
        .collect())
}

/// Histogram of transition descriptors, most frequent first
///
/// Ties are broken by the descriptor itself so that the histogram is stable
/// across runs.
pub fn transition_histogram<L: Label + fmt::Display>(
    errors: &[Misclassification<L>],
) -> Vec<(String, usize)> {
    let mut histogram = HashMap::new();
    for error in errors {
        *histogram.entry(error.transition()).or_insert(0) += 1;
    }

    let mut histogram = histogram.into_iter().collect::<Vec<_>>();
    histogram.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn assert_eq_slice(a: Array1<f64>, b: &[f64]) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn confusion_matrix_counts() {
        let predicted = array![0, 1, 0, 1, 0, 1];
        let ground_truth = array![1, 1, 0, 1, 0, 1];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();

        assert_eq!(cm.counts(), &array![[2, 0], [1, 3]]);
        assert_eq!(cm.total(), 6);
        assert_eq!(cm.correct(), 5);
    }

    #[test]
    fn worked_two_class_example() {
        // actual class 0: five correct, one predicted as 1
        // actual class 1: two predicted as 0, four correct
        let ground_truth = Array1::from_iter(
            std::iter::repeat(0).take(6).chain(std::iter::repeat(1).take(6)),
        );
        let predicted = array![0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 1, 1];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();

        assert_eq!(cm.counts(), &array![[5, 1], [2, 4]]);
        assert_abs_diff_eq!(cm.accuracy(), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(cm.producers_accuracy()[0], 5.0 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cm.consumers_accuracy()[0], 5.0 / 7.0, epsilon = 1e-12);
        // expected agreement (6*7 + 6*5) / 144 = 0.5
        assert_abs_diff_eq!(cm.kappa(), 0.5, epsilon = 1e-12);
        assert_eq_slice(cm.misclassification_rates(), &[1.0 / 6.0, 2.0 / 6.0]);
    }

    #[test]
    fn accuracy_and_kappa_bounds() {
        let predicted = array![2, 0, 1, 1, 2, 0, 0, 1];
        let ground_truth = array![0, 1, 2, 1, 2, 0, 1, 0];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();

        let accuracy = cm.accuracy();
        assert!((0.0..=1.0).contains(&accuracy));
        let kappa = cm.kappa();
        assert!((-1.0..=1.0).contains(&kappa));
        assert_eq!(cm.total(), 8);
        assert_eq!(cm.correct(), 3);
    }

    #[test]
    fn matrix_spans_union_of_classes() {
        // class 2 appears only in the prediction
        let predicted = array![0, 2, 0];
        let ground_truth = array![0, 1, 1];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();
        assert_eq!(cm.members(), &[0, 1, 2]);
        assert_eq!(cm.total(), 3);
        // no actual members of class 2, so its rates are reported as zero
        assert_eq!(cm.producers_accuracy()[2], 0.0);
        assert_eq!(cm.misclassification_rates()[2], 0.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let predicted = array![0, 1];
        let ground_truth = array![0, 1, 1];

        assert!(predicted.confusion_matrix(&ground_truth).is_err());
        assert!(misclassifications(&predicted, &ground_truth).is_err());
    }

    #[test]
    fn f1_scores() {
        let predicted = array![0, 1, 0, 1, 0, 1];
        let ground_truth = array![1, 1, 0, 1, 0, 1];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();
        assert_eq_slice(cm.f1_score(), &[4.0 / 5.0, 6.0 / 7.0]);
    }

    #[test]
    fn misclassification_transitions() {
        let predicted = array![1, 1, 0, 2, 2];
        let ground_truth = array![0, 1, 0, 1, 1];

        let errors = misclassifications(&predicted, &ground_truth).unwrap();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].index, 0);
        assert_eq!(errors[0].transition(), "0 -> 1");

        let histogram = transition_histogram(&errors);
        assert_eq!(
            histogram,
            vec![("1 -> 2".to_string(), 2), ("0 -> 1".to_string(), 1)]
        );
    }

    #[test]
    fn trace_equals_correct_count() {
        let predicted = array![0, 0, 1, 1, 2, 2, 0, 1];
        let ground_truth = array![0, 1, 1, 1, 2, 0, 0, 2];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();
        let correct = predicted
            .iter()
            .zip(ground_truth.iter())
            .filter(|(a, b)| a == b)
            .count();

        assert_eq!(cm.correct(), correct);
        assert_eq!(cm.total(), predicted.len());
    }
}
