//! Linear regression runs through the full pipeline.

use tabular_eval::*;

mod common;
use common::*;

#[test]
fn test_linear_regression_scenario() {
    let dataset = regression_dataset(50);
    let output = run(config("y", &["x"], ModelSpec::LinearRegression), &dataset);

    assert_eq!(output.task_type, TaskType::Regression);
    assert_eq!((output.train_rows, output.test_rows), (40, 10));

    let eval = &output.evaluation;
    assert_eq!(eval.metric_names(), vec!["mse", "mae", "rmse", "r2"]);
    let mse = eval.metric("mse").unwrap();
    let mae = eval.metric("mae").unwrap();
    let rmse = eval.metric("rmse").unwrap();
    let r2 = eval.metric("r2").unwrap();
    assert!((rmse - mse.sqrt()).abs() < 1e-9);
    assert!(mae <= rmse + 1e-12);
    assert!(r2 <= 1.0);
    assert!(r2 > 0.9, "noise is small against the slope, got r2 {}", r2);

    assert!(eval.confusion_matrix.is_none());
    assert!(eval.roc_curve.is_none());

    assert_eq!(
        artifact_kinds(&output),
        vec![
            ArtifactKind::ActualVsPredictedScatter,
            ArtifactKind::ErrorHistogram,
            ArtifactKind::ErrorBoxplot,
            ArtifactKind::SeriesOverlay,
            ArtifactKind::MetricsBar,
            ArtifactKind::FeatureVsTargetScatter,
        ]
    );
}

#[test]
fn test_regression_artifact_payloads() {
    let dataset = regression_dataset(60);
    let output = run(config("y", &["x"], ModelSpec::LinearRegression), &dataset);

    let Payload::Histogram { edges, counts } = &output.artifacts[1].payload else {
        panic!("histogram expected");
    };
    assert_eq!(counts.len(), 30);
    assert_eq!(edges.len(), 31);
    assert_eq!(counts.iter().sum::<usize>(), output.test_rows);

    let Payload::Bars { categories, values } = &output.artifacts[4].payload else {
        panic!("metric bars expected");
    };
    assert_eq!(categories, &["MSE", "MAE", "RMSE", "R-squared"]);
    assert_eq!(values[0], output.evaluation.metric("mse").unwrap());

    let Payload::Series { series } = &output.artifacts[3].payload else {
        panic!("series expected");
    };
    assert_eq!(series.len(), 2);
    assert!(series.iter().all(|s| s.values.len() == output.test_rows));
}

#[test]
fn test_feature_scatter_keeps_first_hundred_test_rows() {
    let dataset = regression_dataset(600);
    let output = run(config("y", &["x"], ModelSpec::LinearRegression), &dataset);
    assert_eq!(output.test_rows, 120);

    let artifact = output
        .artifacts
        .iter()
        .find(|a| a.kind == ArtifactKind::FeatureVsTargetScatter)
        .unwrap();
    let Payload::FeatureScatter {
        features,
        actual,
        predicted,
    } = &artifact.payload
    else {
        panic!("feature scatter expected");
    };
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].name, "x");
    assert_eq!(features[0].values.len(), 100);
    assert_eq!(actual.len(), 100);
    assert_eq!(predicted.len(), 100);

    let Payload::Series { series } = &output.artifacts[3].payload else {
        panic!("series expected");
    };
    assert!(series.iter().all(|s| s.values.len() == 120));
}

#[test]
fn test_collinear_features_fail_training() {
    let n = 30;
    let dataset = Dataset::new(vec![
        Column::numeric("x", (0..n).map(|i| Some(i as f64)).collect()),
        Column::numeric("x_copy", (0..n).map(|i| Some(i as f64)).collect()),
        Column::numeric("y", (0..n).map(|i| Some(3.0 * i as f64)).collect()),
    ])
    .unwrap();

    let err = Pipeline::new(config("y", &["x", "x_copy"], ModelSpec::LinearRegression))
        .run(&dataset)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrainingFailure);
}

#[test]
fn test_categorical_target_rejected_for_regression() {
    let dataset = binary_dataset(40);
    let err = Pipeline::new(config("outcome", &["score"], ModelSpec::LinearRegression))
        .run(&dataset)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrainingFailure);
}
