//! Fit and evaluate a CART classifier for land-cover classification.
//!
//! The workflow mirrors a typical photo-interpretation analysis: load a
//! labeled plot table, filter it to an area and a year, deduplicate plots,
//! encode the land-cover classes, split 70/30 with a fixed seed, train a
//! decision tree on the spectral/terrain predictors and evaluate it with a
//! confusion matrix. Classified and misclassified plots are then styled into
//! map layers with legends, and a point query stands in for a map click.

use terracart::prelude::*;
use terracart_datasets::{
    landcover_plots, Bounds, CategoricalEncoder, Legend, Palette, StyledLayer,
    CLICK_RADIUS_METERS,
};
use terracart_trees::DecisionTree;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // 1. Load and prepare the data
    let table = landcover_plots()
        .filter(&Bounds::conus(), 2018)
        .dedup_by_plotid();
    if table.is_empty() {
        return Err("no plots match the requested bounds and year".into());
    }

    let classes = table.landcover_classes();
    println!("Unique 'dominant_landcover' values: {:?}", classes);
    println!("Total points per class: {:?}", table.class_histogram());

    // the encoding is derived once, after filtering and deduplication, and
    // reused unchanged for both partitions
    let encoder = CategoricalEncoder::fit(&classes);

    // 2. Split into training and testing tables (70/30, seeded)
    let (train_table, test_table) = table.random_split(0.7, 42)?;
    let (train, _) = train_table.to_dataset(&encoder);
    let (test, test_rows) = test_table.to_dataset(&encoder);

    // 3. Train the CART classifier on the fixed predictors
    let model = DecisionTree::params().fit(&train)?;
    println!("Classifier trained on {} plots", train.nsamples());
    println!("Features used by splits: {:?}", model.features());

    // 4. Classify the testing set
    let predicted = model.predict(test.records());

    // 5. Confusion matrix and derived metrics
    let cm = predicted.confusion_matrix(test.targets())?;
    println!("Confusion matrix:\n{:?}", cm);
    println!("Overall accuracy: {:.3}", cm.accuracy());
    println!("Kappa coefficient: {:.3}", cm.kappa());
    println!("Class recall (producer's accuracy): {:?}", cm.producers_accuracy().to_vec());
    println!("Class precision (consumer's accuracy): {:?}", cm.consumers_accuracy().to_vec());
    println!("Misclassification rates by class: {:?}", cm.misclassification_rates().to_vec());

    // 6. Style the classified plots and build the land-cover legend
    let class_palette = Palette::landcover(encoder.len())?;
    let codes = predicted.iter().cloned().collect::<Vec<_>>();
    let classified =
        StyledLayer::from_codes("classified plots", test_table.records(), &codes, &class_palette)?;
    let class_legend = Legend::new("True Landcover Legend", &classes, &class_palette)?;
    println!("Layer '{}' holds {} styled plots", classified.name(), classified.len());
    for row in class_legend.rows() {
        println!("  [{}] {}", row.color, row.label);
    }

    // 7. Error analysis: misclassified plots styled by transition type
    let errors = misclassifications(&predicted, test.targets())?;
    let named_errors = errors
        .iter()
        .map(|e| Misclassification {
            index: e.index,
            actual: encoder.class_name(e.actual).unwrap_or("?").to_string(),
            predicted: encoder.class_name(e.predicted).unwrap_or("?").to_string(),
        })
        .collect::<Vec<_>>();

    println!("Misclassification types: {:?}", transition_histogram(&named_errors));

    let transition_encoder =
        CategoricalEncoder::fit(named_errors.iter().map(|e| e.transition()));
    let error_palette = Palette::errors(transition_encoder.len())?;
    let error_records = errors
        .iter()
        .map(|e| test_table.records()[test_rows[e.index]].clone())
        .collect::<Vec<_>>();
    let error_codes = named_errors
        .iter()
        .map(|e| transition_encoder.code(&e.transition()) as usize)
        .collect::<Vec<_>>();
    let error_layer = StyledLayer::from_codes(
        "Misclassification Types",
        &error_records,
        &error_codes,
        &error_palette,
    )?;
    let error_legend = Legend::new(
        "Misclassifications Legend",
        transition_encoder.classes(),
        &error_palette,
    )?;
    println!(
        "Layer '{}' holds {} misclassified plots",
        error_layer.name(),
        error_layer.len()
    );
    for row in error_legend.rows() {
        println!("  [{}] {}", row.color, row.label);
    }

    // 8. Point queries in place of an interactive click handler
    if let Some(point) = classified.points().first() {
        let (lon, lat) = (point.record.lon, point.record.lat);
        match classified.find_nearest(lon, lat, CLICK_RADIUS_METERS) {
            Some(hit) => println!("Clicked point properties: {:?}", hit.record),
            None => println!("No feature found near the clicked location."),
        }
    }
    // a click in the middle of the Atlantic finds nothing
    if classified.find_nearest(-40.0, 35.0, CLICK_RADIUS_METERS).is_none() {
        println!("No feature found near the clicked location.");
    }

    println!("Size of distinct dataset: {}", table.len());
    println!("Size of training set: {}", train.nsamples());
    println!("Size of testing set: {}", test.nsamples());
    println!("Size of misclassified set: {}", errors.len());

    Ok(())
}
