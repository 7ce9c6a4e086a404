//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tabular_eval::*;

/// One numeric feature `score` and a binary categorical target `outcome`
/// ("no"/"yes") that mostly follows the feature.
pub fn binary_dataset(n: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut score = Vec::with_capacity(n);
    let mut outcome = Vec::with_capacity(n);
    for i in 0..n {
        let x = 10.0 * i as f64 / n as f64;
        let noisy = x + rng.gen_range(-2.0..2.0);
        score.push(Some(x));
        outcome.push(Some(if noisy > 5.0 { "yes" } else { "no" }));
    }
    Dataset::new(vec![
        Column::numeric("score", score),
        Column::categorical("outcome", outcome),
    ])
    .expect("valid fixture")
}

/// Two numeric features `a`, `b` and a binary target `class` separated by
/// the line `a + b = 0`, with some label noise.
pub fn two_feature_dataset(n: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut a = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    let mut class = Vec::with_capacity(n);
    for _ in 0..n {
        let x: f64 = rng.gen_range(-3.0..3.0);
        let y: f64 = rng.gen_range(-3.0..3.0);
        let flip = rng.gen_bool(0.1);
        a.push(Some(x));
        b.push(Some(y));
        class.push(Some(if (x + y > 0.0) != flip { "pos" } else { "neg" }));
    }
    Dataset::new(vec![
        Column::numeric("a", a),
        Column::numeric("b", b),
        Column::categorical("class", class),
    ])
    .expect("valid fixture")
}

/// Three well separated clusters along `x`, labelled "setosa", "versicolor"
/// and "virginica".
pub fn multiclass_dataset(n: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let species = ["setosa", "versicolor", "virginica"];
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut label = Vec::with_capacity(n);
    for i in 0..n {
        let k = i % 3;
        x.push(Some(k as f64 * 5.0 + rng.gen_range(-1.0..1.0)));
        y.push(Some(rng.gen_range(-1.0..1.0)));
        label.push(Some(species[k]));
    }
    Dataset::new(vec![
        Column::numeric("x", x),
        Column::numeric("y", y),
        Column::categorical("species", label),
    ])
    .expect("valid fixture")
}

/// Numeric feature `x` and target `y = 2x + 1 + noise`.
pub fn regression_dataset(n: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let v = i as f64 * 0.5;
        x.push(Some(v));
        y.push(Some(2.0 * v + 1.0 + rng.gen_range(-1.0..1.0)));
    }
    Dataset::new(vec![Column::numeric("x", x), Column::numeric("y", y)]).expect("valid fixture")
}

/// Configuration for `target` and `features` with `spec`
pub fn config(target: &str, features: &[&str], spec: ModelSpec) -> PipelineConfig {
    PipelineConfig::new(
        target,
        features.iter().map(|f| f.to_string()).collect(),
        spec,
    )
}

/// Run a configuration, panicking on error
pub fn run(config: PipelineConfig, dataset: &Dataset) -> PipelineOutput {
    Pipeline::new(config).run(dataset).expect("pipeline run")
}

/// Artifact kinds of an output, in emission order
pub fn artifact_kinds(output: &PipelineOutput) -> Vec<ArtifactKind> {
    output.artifacts.iter().map(|a| a.kind).collect()
}

/// Class labels of the test partition, recomputed from the fixed split
pub fn test_labels(dataset: &Dataset, target: &str) -> Vec<String> {
    let (_, test_rows) = Splitter::default()
        .indices(dataset.num_rows())
        .expect("splittable");
    let column = dataset.column(target).expect("target column");
    let ColumnData::Categorical(values) = column.data() else {
        panic!("categorical target expected");
    };
    test_rows
        .iter()
        .map(|&r| values[r].clone().expect("no missing labels"))
        .collect()
}

/// Write `content` to `dir/name`
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture file");
    path
}
