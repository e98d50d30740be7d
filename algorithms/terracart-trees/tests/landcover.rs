//! End-to-end land-cover classification on the bundled plot table.

use terracart::prelude::*;
use terracart_datasets::{landcover_plots, Bounds, CategoricalEncoder};
use terracart_trees::DecisionTree;

fn prepared_table() -> terracart_datasets::PlotTable {
    landcover_plots()
        .filter(&Bounds::conus(), 2018)
        .dedup_by_plotid()
}

#[test]
fn pipeline_invariants() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let table = prepared_table();
    assert!(!table.is_empty());

    let encoder = CategoricalEncoder::fit(table.landcover_classes());
    let (dataset, kept) = table.to_dataset(&encoder);

    // the encoder knows every class of the filtered table, so no row is lost
    assert_eq!(kept.len(), table.len());

    let (train, test) = dataset.random_split(0.7, 42)?;
    assert_eq!(train.nsamples() + test.nsamples(), dataset.nsamples());
    assert!(!train.is_empty());
    assert!(!test.is_empty());

    let model = DecisionTree::params().fit(&train)?;
    let predicted = model.predict(test.records());
    assert_eq!(predicted.len(), test.nsamples());

    let cm = predicted.confusion_matrix(test.targets())?;
    assert_eq!(cm.total(), test.nsamples());

    let correct = predicted
        .iter()
        .zip(test.targets().iter())
        .filter(|(a, b)| a == b)
        .count();
    assert_eq!(cm.correct(), correct);

    // the classes separate well, a tree should do clearly better than chance
    assert!(cm.accuracy() > 0.6);
    assert!(cm.kappa() > -1.0 - f64::EPSILON && cm.kappa() < 1.0 + f64::EPSILON);

    let errors = misclassifications(&predicted, test.targets())?;
    assert_eq!(errors.len(), cm.total() - cm.correct());

    Ok(())
}

#[test]
fn same_seed_reproduces_the_partition() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let table = prepared_table();
    let encoder = CategoricalEncoder::fit(table.landcover_classes());
    let (dataset, _) = table.to_dataset(&encoder);

    let (train_a, test_a) = dataset.random_split(0.7, 7)?;
    let (train_b, test_b) = dataset.random_split(0.7, 7)?;

    assert_eq!(train_a.targets(), train_b.targets());
    assert_eq!(test_a.targets(), test_b.targets());
    assert_eq!(train_a.records(), train_b.records());
    assert_eq!(test_a.records(), test_b.records());

    Ok(())
}

#[test]
fn training_on_the_full_table_memorizes_it() -> std::result::Result<(), Box<dyn std::error::Error>>
{
    let table = prepared_table();
    let encoder = CategoricalEncoder::fit(table.landcover_classes());
    let (dataset, _) = table.to_dataset(&encoder);

    let model = DecisionTree::params().fit(&dataset)?;
    let cm = model
        .predict(dataset.records())
        .confusion_matrix(dataset.targets())?;

    // an unconstrained tree separates the bundled table almost perfectly
    assert!(cm.accuracy() > 0.95);

    Ok(())
}
