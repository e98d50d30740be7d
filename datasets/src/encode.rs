//! Dense integer encoding for categorical values
//!
//! Classifiers in the terracart ecosystem work on integer class codes, while
//! plot tables carry land-cover classes as strings. The encoder assigns dense
//! codes `0..K` in first-seen order, so that the same input ordering always
//! produces the same codes. The same type encodes misclassification
//! transition descriptors for the error-analysis map layer.

use std::collections::HashMap;

/// Sentinel code for values outside the observed set
pub const UNMAPPED: i64 = -1;

/// Maps distinct categorical values to dense integer codes
///
/// The mapping is total: looking up a value that was not observed when the
/// encoder was fitted yields the [`UNMAPPED`] sentinel instead of a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl CategoricalEncoder {
    /// Derive the encoding from the values in `labels`, in first-seen order
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes = Vec::new();
        let mut codes = HashMap::new();

        for label in labels {
            let label = label.as_ref();
            if !codes.contains_key(label) {
                codes.insert(label.to_owned(), classes.len());
                classes.push(label.to_owned());
            }
        }

        CategoricalEncoder { classes, codes }
    }

    /// Code of a value, or [`UNMAPPED`] if the value was not observed
    pub fn code(&self, label: &str) -> i64 {
        self.codes
            .get(label)
            .map(|&code| code as i64)
            .unwrap_or(UNMAPPED)
    }

    /// The value a code stands for
    pub fn class_name(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(|x| x.as_str())
    }

    /// All observed values, ordered by their code
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of distinct observed values
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_order() {
        let encoder = CategoricalEncoder::fit(vec!["Water", "Trees", "Water", "Barren"]);

        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.code("Water"), 0);
        assert_eq!(encoder.code("Trees"), 1);
        assert_eq!(encoder.code("Barren"), 2);
        assert_eq!(encoder.classes(), &["Water", "Trees", "Barren"]);
    }

    #[test]
    fn bijection_and_idempotence() {
        let labels = vec!["Trees", "Water", "Shrubs", "Trees", "Water"];
        let encoder = CategoricalEncoder::fit(labels.clone());

        // every observed label maps to a unique code in [0, K)
        let mut codes = labels
            .iter()
            .map(|l| encoder.code(l))
            .collect::<Vec<_>>();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes, vec![0, 1, 2]);

        // every code maps back to its label
        for label in &labels {
            let code = encoder.code(label) as usize;
            assert_eq!(encoder.class_name(code), Some(*label));
        }

        // refitting on the same input reproduces the encoder exactly
        assert_eq!(CategoricalEncoder::fit(labels), encoder);
    }

    #[test]
    fn unmapped_values_yield_sentinel() {
        let encoder = CategoricalEncoder::fit(vec!["Water", "Trees"]);

        assert_eq!(encoder.code("Snow/ice"), UNMAPPED);
        assert_eq!(encoder.class_name(17), None);
    }

    #[test]
    fn transition_descriptors_encode_like_any_category() {
        let transitions = vec!["Trees -> Grass", "Grass -> Trees", "Trees -> Grass"];
        let encoder = CategoricalEncoder::fit(transitions);

        assert_eq!(encoder.len(), 2);
        assert_eq!(encoder.code("Trees -> Grass"), 0);
        assert_eq!(encoder.code("Grass -> Trees"), 1);
    }
}
