//! tabular-eval command line driver.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabular_eval::{
    CsvLoader, HyperParameters, ModelKind, Pipeline, PipelineConfig, PipelineConfigBuilder,
    PipelineOutput,
};

#[derive(Parser)]
#[command(name = "tabular-eval", version, about = "Train and evaluate a model on a CSV table")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and print its test metrics and diagnostic artifacts
    Evaluate {
        /// CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,
        /// Run configuration (.json or .toml); flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Target column
        #[arg(short, long)]
        target: Option<String>,
        /// Comma-separated feature columns
        #[arg(short, long, value_delimiter = ',')]
        features: Vec<String>,
        /// Model, e.g. "random_forest" or "K-Nearest Neighbors"
        #[arg(short, long)]
        model: Option<String>,
        /// Number of trees (random forest)
        #[arg(long)]
        estimators: Option<i64>,
        /// Depth limit (random forest, decision tree)
        #[arg(long)]
        max_depth: Option<i64>,
        /// Inverse regularization strength (logistic regression, SVM)
        #[arg(long)]
        c: Option<f64>,
        /// SVM kernel: linear, poly, rbf or sigmoid
        #[arg(long)]
        kernel: Option<String>,
        /// Neighbor count (KNN)
        #[arg(long)]
        neighbors: Option<i64>,
        /// Backward fill missing cells and one-hot encode categorical columns
        #[arg(long)]
        preprocess: bool,
        /// Write the full output as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the inferred column types and missing counts of a CSV file
    Inspect {
        /// CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tabular_eval::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            data,
            config,
            target,
            features,
            model,
            estimators,
            max_depth,
            c,
            kernel,
            neighbors,
            preprocess,
            output,
        } => {
            let params = HyperParameters {
                estimators,
                max_depth,
                c,
                kernel,
                neighbors,
            };
            let config =
                resolve_config(config.as_deref(), target, features, model, params, preprocess)?;
            cmd_evaluate(&data, config, output.as_deref())
        }
        Commands::Inspect { data } => cmd_inspect(&data),
    }
}

fn resolve_config(
    file: Option<&Path>,
    target: Option<String>,
    features: Vec<String>,
    model: Option<String>,
    params: HyperParameters,
    preprocess: bool,
) -> anyhow::Result<PipelineConfig> {
    let base = file
        .map(|path| {
            PipelineConfig::load_from_file(path)
                .with_context(|| format!("loading config {}", path.display()))
        })
        .transpose()?;

    let kind = match (&model, &base) {
        (Some(tag), _) => tag.parse::<ModelKind>()?,
        (None, Some(base)) => base.model.kind(),
        (None, None) => bail!("--model is required when no --config file is given"),
    };
    let target = target
        .or_else(|| base.as_ref().map(|b| b.target.clone()))
        .context("--target is required when no --config file is given")?;
    let features = if features.is_empty() {
        base.as_ref().map(|b| b.features.clone()).unwrap_or_default()
    } else {
        features
    };

    // Flags win over the file; unset flags keep the file's values
    let file_params = base
        .as_ref()
        .map(|b| HyperParameters::from(&b.model))
        .unwrap_or_default();

    let mut builder = PipelineConfigBuilder::new()
        .target(target)
        .features(features)
        .preprocess(preprocess || base.as_ref().is_some_and(|b| b.preprocess))
        .model(kind)
        .hyperparameters(params.or(file_params));
    if let Some(base) = &base {
        builder = builder.residual_nulls(base.residual_nulls);
    }
    Ok(builder.build()?)
}

fn cmd_evaluate(data: &Path, config: PipelineConfig, output: Option<&Path>) -> anyhow::Result<()> {
    let dataset = CsvLoader::new()
        .load_csv(data)
        .with_context(|| format!("reading {}", data.display()))?;
    let result = Pipeline::new(config)
        .run(&dataset)
        .context("pipeline run failed")?;

    print_summary(&result);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("\nFull output written to {}", path.display());
    }
    Ok(())
}

fn print_summary(result: &PipelineOutput) {
    println!(
        "{} ({}) on {} train / {} test rows",
        result.model_kind.display_name(),
        result.task_type,
        result.train_rows,
        result.test_rows
    );
    println!("Features: {}", result.feature_names.join(", "));

    println!("\nMetrics");
    for (name, value) in result.evaluation.display_metrics() {
        println!("  {:<10} {:>8}", name, value);
    }

    if let Some(cm) = &result.evaluation.confusion_matrix {
        println!("\nConfusion matrix (rows actual, columns predicted)");
        let header: String = cm.labels.iter().map(|l| format!("{:>8}", l)).collect();
        println!("  {:>12} {}", "", header);
        for (label, row) in cm.labels.iter().zip(cm.matrix.rows()) {
            let counts: String = row.iter().map(|c| format!("{:>8}", c)).collect();
            println!("  {:>12} {}", label, counts);
        }
    }

    println!("\nArtifacts");
    for artifact in &result.artifacts {
        println!("  {:<28} {}", artifact.kind.to_string(), artifact.title);
    }
}

fn cmd_inspect(data: &Path) -> anyhow::Result<()> {
    let dataset = CsvLoader::new()
        .load_csv(data)
        .with_context(|| format!("reading {}", data.display()))?;

    println!("{} rows, {} columns", dataset.num_rows(), dataset.num_columns());
    println!("  {:<24} {:<12} {:>8} {:>8}", "column", "type", "missing", "distinct");
    for summary in dataset.describe() {
        println!(
            "  {:<24} {:<12} {:>8} {:>8}",
            summary.name,
            summary.column_type.to_string(),
            summary.missing,
            summary.distinct
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabular_eval::config::SvmParams;
    use tabular_eval::{ModelSpec, SvmKernel};

    fn svm_config_file(dir: &Path) -> PathBuf {
        let path = dir.join("svm.toml");
        let config = PipelineConfigBuilder::new()
            .target("label")
            .features(["a", "b"])
            .model(ModelKind::Svm)
            .hyperparameters(HyperParameters {
                c: Some(3.0),
                kernel: Some("rbf".to_string()),
                ..Default::default()
            })
            .build()
            .unwrap();
        config.save_to_file(&path).unwrap();
        path
    }

    #[test]
    fn test_flag_overrides_single_file_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = svm_config_file(dir.path());
        let flags = HyperParameters {
            c: Some(2.0),
            ..Default::default()
        };

        let config = resolve_config(Some(&path), None, Vec::new(), None, flags, false).unwrap();
        assert_eq!(
            config.model,
            ModelSpec::Svm(SvmParams {
                c: 2.0,
                kernel: SvmKernel::Rbf
            })
        );
        assert_eq!(config.features, vec!["a", "b"]);
    }

    #[test]
    fn test_file_values_kept_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = svm_config_file(dir.path());

        let config = resolve_config(
            Some(&path),
            Some("label".to_string()),
            vec!["a".to_string()],
            None,
            HyperParameters::default(),
            false,
        )
        .unwrap();
        assert_eq!(
            config.model,
            ModelSpec::Svm(SvmParams {
                c: 3.0,
                kernel: SvmKernel::Rbf
            })
        );
        assert_eq!(config.features, vec!["a"]);
    }

    #[test]
    fn test_model_required_without_file() {
        let err = resolve_config(
            None,
            Some("label".to_string()),
            vec!["a".to_string()],
            None,
            HyperParameters::default(),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("--model"));
    }
}
