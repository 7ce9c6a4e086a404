//! Classification metrics.
//!
//! Hard-label metrics (accuracy, confusion matrix, precision, recall, F1)
//! work on global class indices. The threshold curves and their AUC are
//! defined for binary targets only and are computed from continuous
//! positive-class scores; the positive class is label index 1.

use crate::core::error::{EvalError, Result};
use crate::core::types::ClassIndex;
use crate::dataset::TargetVector;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Label index treated as the positive class of a binary target.
pub const POSITIVE_CLASS: ClassIndex = 1;

fn check_lengths(metric: &str, y_true: usize, y_pred: usize) -> Result<()> {
    if y_true != y_pred {
        return Err(EvalError::shape_mismatch(
            format!("{} predictions for {}", y_true, metric),
            format!("{} predictions", y_pred),
        ));
    }
    if y_true == 0 {
        return Err(EvalError::undefined_metric(metric, "no samples to evaluate"));
    }
    Ok(())
}

/// Fraction of exact matches.
pub fn accuracy(y_true: &[ClassIndex], y_pred: &[ClassIndex]) -> Result<f64> {
    check_lengths("accuracy", y_true.len(), y_pred.len())?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Counts of a binary confusion table for one positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryCounts {
    /// True positives
    pub tp: usize,
    /// False positives
    pub fp: usize,
    /// True negatives
    pub tn: usize,
    /// False negatives
    pub fn_: usize,
}

impl BinaryCounts {
    /// Tally `y_pred` against `y_true` treating `positive` as the positive class
    pub fn tally(y_true: &[ClassIndex], y_pred: &[ClassIndex], positive: ClassIndex) -> Self {
        let mut counts = BinaryCounts::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == positive, p == positive) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fn_ += 1,
            }
        }
        counts
    }

    /// tp / (tp + fp), 0 when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// tp / (tp + fn), 0 when there are no positives
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Harmonic mean of precision and recall, 0 when both are 0
    pub fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Precision of the positive class.
pub fn precision(y_true: &[ClassIndex], y_pred: &[ClassIndex]) -> Result<f64> {
    check_lengths("precision", y_true.len(), y_pred.len())?;
    Ok(BinaryCounts::tally(y_true, y_pred, POSITIVE_CLASS).precision())
}

/// Recall of the positive class.
pub fn recall(y_true: &[ClassIndex], y_pred: &[ClassIndex]) -> Result<f64> {
    check_lengths("recall", y_true.len(), y_pred.len())?;
    Ok(BinaryCounts::tally(y_true, y_pred, POSITIVE_CLASS).recall())
}

/// F1 score of the positive class.
pub fn f1_score(y_true: &[ClassIndex], y_pred: &[ClassIndex]) -> Result<f64> {
    check_lengths("f1_score", y_true.len(), y_pred.len())?;
    Ok(BinaryCounts::tally(y_true, y_pred, POSITIVE_CLASS).f1())
}

/// Confusion matrix; rows are actual classes, columns predicted classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Global class index of each row and column
    pub classes: Vec<ClassIndex>,
    /// Label of each row and column
    pub labels: Vec<String>,
    /// Counts, indexed `[actual, predicted]`
    pub matrix: Array2<usize>,
}

impl ConfusionMatrix {
    /// Tally over `classes` plus any class that occurs in `y_true` or `y_pred`.
    ///
    /// `labels` is the full label set of the target.
    pub fn compute(
        y_true: &[ClassIndex],
        y_pred: &[ClassIndex],
        classes: &[ClassIndex],
        labels: &[String],
    ) -> Result<Self> {
        check_lengths("confusion_matrix", y_true.len(), y_pred.len())?;

        let mut axis: Vec<ClassIndex> = classes
            .iter()
            .chain(y_true)
            .chain(y_pred)
            .copied()
            .collect();
        axis.sort_unstable();
        axis.dedup();

        if let Some(&bad) = axis.iter().find(|&&c| c >= labels.len()) {
            return Err(EvalError::shape_mismatch(
                format!("class indices below {}", labels.len()),
                format!("class index {}", bad),
            ));
        }

        let mut matrix = Array2::zeros((axis.len(), axis.len()));
        for (t, p) in y_true.iter().zip(y_pred) {
            // Both were inserted into `axis` above
            let (Ok(row), Ok(col)) = (axis.binary_search(t), axis.binary_search(p)) else {
                continue;
            };
            matrix[[row, col]] += 1;
        }

        Ok(ConfusionMatrix {
            labels: axis.iter().map(|&c| labels[c].clone()).collect(),
            classes: axis,
            matrix,
        })
    }

    /// Number of evaluated samples
    pub fn total(&self) -> usize {
        self.matrix.sum()
    }

    /// Samples per actual class
    pub fn row_sums(&self) -> Vec<usize> {
        self.matrix.rows().into_iter().map(|r| r.sum()).collect()
    }

    /// Count for an actual/predicted pair of global class indices
    pub fn count(&self, actual: ClassIndex, predicted: ClassIndex) -> usize {
        match (
            self.classes.binary_search(&actual),
            self.classes.binary_search(&predicted),
        ) {
            (Ok(r), Ok(c)) => self.matrix[[r, c]],
            _ => 0,
        }
    }
}

/// Receiver operating characteristic curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    /// False positive rate per threshold, non-decreasing
    pub fpr: Vec<f64>,
    /// True positive rate per threshold, non-decreasing
    pub tpr: Vec<f64>,
    /// Descending score thresholds; the first is `+inf`
    pub thresholds: Vec<f64>,
}

/// Precision-recall curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecallCurve {
    /// Precision per point; the last is 1
    pub precision: Vec<f64>,
    /// Recall per point, non-increasing; the last is 0
    pub recall: Vec<f64>,
    /// Ascending score thresholds, one fewer than the points
    pub thresholds: Vec<f64>,
}

/// Positive flags of a binary target, or `UndefinedMetric`.
fn binary_truth(metric: &str, y_true: &TargetVector, scores: &Array1<f64>) -> Result<Vec<bool>> {
    let (indices, labels) = y_true
        .classes()
        .ok_or_else(|| EvalError::undefined_metric(metric, "target is continuous"))?;
    if labels.len() != 2 {
        return Err(EvalError::undefined_metric(
            metric,
            format!("target has {} classes; only binary targets are supported", labels.len()),
        ));
    }
    check_lengths(metric, indices.len(), scores.len())?;
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(EvalError::undefined_metric(metric, "scores hold non-finite values"));
    }

    let truth: Vec<bool> = indices.iter().map(|&i| i == POSITIVE_CLASS).collect();
    let positives = truth.iter().filter(|&&t| t).count();
    if positives == 0 || positives == truth.len() {
        return Err(EvalError::undefined_metric(
            metric,
            "evaluation partition holds a single class",
        ));
    }
    Ok(truth)
}

/// Cumulative (fp, tp, threshold) at each distinct score, highest score first.
fn threshold_counts(truth: &[bool], scores: &Array1<f64>) -> Vec<(usize, usize, f64)> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = Vec::new();
    let (mut tp, mut fp) = (0, 0);
    for (pos, &i) in order.iter().enumerate() {
        if truth[i] {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_score {
            points.push((fp, tp, scores[i]));
        }
    }
    points
}

/// ROC curve of a binary target from positive-class scores.
pub fn roc_curve(y_true: &TargetVector, scores: &Array1<f64>) -> Result<RocCurve> {
    let truth = binary_truth("roc_curve", y_true, scores)?;
    let positives = truth.iter().filter(|&&t| t).count() as f64;
    let negatives = truth.len() as f64 - positives;

    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    for (fp, tp, threshold) in threshold_counts(&truth, scores) {
        curve.fpr.push(fp as f64 / negatives);
        curve.tpr.push(tp as f64 / positives);
        curve.thresholds.push(threshold);
    }
    Ok(curve)
}

/// Precision-recall curve of a binary target from positive-class scores.
///
/// Points stop once full recall is reached and are returned with recall
/// decreasing, closed by the point (recall 0, precision 1).
pub fn precision_recall_curve(
    y_true: &TargetVector,
    scores: &Array1<f64>,
) -> Result<PrecisionRecallCurve> {
    let truth = binary_truth("precision_recall_curve", y_true, scores)?;
    let positives = truth.iter().filter(|&&t| t).count();

    let mut counts = threshold_counts(&truth, scores);
    if let Some(full) = counts.iter().position(|&(_, tp, _)| tp == positives) {
        counts.truncate(full + 1);
    }
    counts.reverse();

    let mut curve = PrecisionRecallCurve {
        precision: Vec::with_capacity(counts.len() + 1),
        recall: Vec::with_capacity(counts.len() + 1),
        thresholds: Vec::with_capacity(counts.len()),
    };
    for (fp, tp, threshold) in counts {
        curve.precision.push(ratio(tp, tp + fp));
        curve.recall.push(tp as f64 / positives as f64);
        curve.thresholds.push(threshold);
    }
    curve.precision.push(1.0);
    curve.recall.push(0.0);
    Ok(curve)
}

/// Area under a piecewise linear curve by the trapezoidal rule.
///
/// `x` must be monotonic; a decreasing `x` yields the same positive area.
pub fn auc(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(EvalError::shape_mismatch(
            format!("{} y values", x.len()),
            format!("{} y values", y.len()),
        ));
    }
    if x.len() < 2 {
        return Err(EvalError::undefined_metric("auc", "at least 2 points are required"));
    }
    let increasing = x.windows(2).all(|w| w[0] <= w[1]);
    let decreasing = x.windows(2).all(|w| w[0] >= w[1]);
    if !increasing && !decreasing {
        return Err(EvalError::undefined_metric("auc", "x is not monotonic"));
    }

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum();
    Ok(area.abs())
}

/// Area under the ROC curve.
pub fn roc_auc(y_true: &TargetVector, scores: &Array1<f64>) -> Result<f64> {
    let curve = roc_curve(y_true, scores)?;
    auc(&curve.fpr, &curve.tpr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn binary(indices: Vec<usize>) -> TargetVector {
        TargetVector::Classes {
            indices,
            labels: vec!["neg".into(), "pos".into()],
        }
    }

    #[test]
    fn test_accuracy() {
        assert_abs_diff_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap(), 0.75);
        assert_eq!(
            accuracy(&[0, 1], &[0]).unwrap_err().kind(),
            ErrorKind::ShapeMismatch
        );
        assert_eq!(
            accuracy(&[], &[]).unwrap_err().kind(),
            ErrorKind::UndefinedMetric
        );
    }

    #[test]
    fn test_precision_recall_f1() {
        let y_true = [1, 1, 1, 0, 0];
        let y_pred = [1, 1, 0, 1, 0];
        assert_abs_diff_eq!(precision(&y_true, &y_pred).unwrap(), 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(recall(&y_true, &y_pred).unwrap(), 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f1_score(&y_true, &y_pred).unwrap(), 2.0 / 3.0, epsilon = 1e-12);

        // Nothing predicted positive
        assert_eq!(precision(&[1, 0], &[0, 0]).unwrap(), 0.0);
        assert_eq!(f1_score(&[0, 0], &[0, 0]).unwrap(), 0.0);
    }

    #[test]
    fn test_confusion_matrix() {
        let labels: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let cm = ConfusionMatrix::compute(&[0, 0, 2, 2, 1], &[0, 2, 2, 2, 0], &[0, 2], &labels)
            .unwrap();

        assert_eq!(cm.classes, vec![0, 1, 2]);
        assert_eq!(cm.labels, vec!["a", "b", "c"]);
        assert_eq!(cm.count(0, 0), 1);
        assert_eq!(cm.count(0, 2), 1);
        assert_eq!(cm.count(2, 2), 2);
        assert_eq!(cm.count(1, 0), 1);
        assert_eq!(cm.row_sums(), vec![2, 1, 2]);
        assert_eq!(cm.total(), 5);
    }

    #[test]
    fn test_roc_curve_perfect_ranking() {
        let y = binary(vec![0, 0, 1, 1]);
        let scores = array![0.1, 0.4, 0.35, 0.8];
        let curve = roc_curve(&y, &scores).unwrap();

        assert_eq!(curve.thresholds[0], f64::INFINITY);
        assert_eq!(curve.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert_abs_diff_eq!(roc_auc(&y, &scores).unwrap(), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_roc_curve_groups_ties() {
        let y = binary(vec![0, 1, 0, 1]);
        let scores = array![0.5, 0.5, 0.5, 0.5];
        let curve = roc_curve(&y, &scores).unwrap();
        assert_eq!(curve.fpr, vec![0.0, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 1.0]);
        assert_abs_diff_eq!(auc(&curve.fpr, &curve.tpr).unwrap(), 0.5);
    }

    #[test]
    fn test_precision_recall_curve() {
        let y = binary(vec![0, 0, 1, 1]);
        let scores = array![0.1, 0.4, 0.35, 0.8];
        let curve = precision_recall_curve(&y, &scores).unwrap();

        assert_eq!(curve.recall, vec![1.0, 0.5, 0.5, 0.0]);
        assert_abs_diff_eq!(curve.precision[0], 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(curve.precision[1..], [0.5, 1.0, 1.0]);
        assert_eq!(curve.thresholds, vec![0.35, 0.4, 0.8]);
    }

    #[test]
    fn test_curves_undefined() {
        let multi = TargetVector::Classes {
            indices: vec![0, 1, 2],
            labels: vec!["a".into(), "b".into(), "c".into()],
        };
        let err = roc_curve(&multi, &array![0.1, 0.2, 0.3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedMetric);

        let single = binary(vec![1, 1, 1]);
        let err = precision_recall_curve(&single, &array![0.1, 0.2, 0.3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedMetric);
    }

    #[test]
    fn test_auc_requires_monotonic_x() {
        assert!(auc(&[0.0, 1.0, 0.5], &[0.0, 1.0, 1.0]).is_err());
        assert_abs_diff_eq!(auc(&[1.0, 0.0], &[1.0, 1.0]).unwrap(), 1.0);
    }
}
