//! XGBoost-style gradient boosting with second-order approximation
//!
//! Binary classifier with logistic loss:
//! - Uses both gradient (first derivative) and hessian (second derivative) of loss
//! - Regularized leaf weights: w* = -G / (H + lambda)
//! - Gain-based split scoring: Gain = 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)] - γ
//! - Minimum child weight constraint on hessian sums
//! - Positive-class scaling: gradient and hessian of every positive example are
//!   multiplied by `scale_pos_weight`

use crate::error::{DelayError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// XGBoost configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XGBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// Minimum loss reduction to make a split (gamma)
    pub gamma: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    /// Multiplier on the loss of positive examples
    pub scale_pos_weight: f64,
    /// Initial prediction as a probability
    pub base_score: f64,
    pub random_state: Option<u64>,
}

impl Default for XGBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            scale_pos_weight: 1.0,
            base_score: 0.5,
            random_state: Some(42),
        }
    }
}

impl XGBoostConfig {
    /// Settings of the flight delay model: slow learning rate, shallow trees,
    /// heavy children and a fixed seed.
    pub fn delay_model(scale_pos_weight: f64) -> Self {
        Self {
            learning_rate: 0.01,
            max_depth: 3,
            min_child_weight: 5.0,
            scale_pos_weight,
            random_state: Some(1),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |what: &str| Err(DelayError::InvalidInput(what.to_string()));
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate must be positive");
        }
        if !(self.scale_pos_weight.is_finite() && self.scale_pos_weight >= 0.0) {
            return invalid("scale_pos_weight must be finite and non-negative");
        }
        if !(self.base_score > 0.0 && self.base_score < 1.0) {
            return invalid("base_score must lie strictly between 0 and 1");
        }
        if !(self.subsample > 0.0 && self.colsample_bytree > 0.0) {
            return invalid("subsample ratios must be positive");
        }
        Ok(())
    }
}

/// A single node in the XGBoost tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum XGBNode {
    Leaf { weight: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<XGBNode>,
        right: Box<XGBNode>,
    },
}

impl XGBNode {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        match self {
            XGBNode::Leaf { weight } => *weight,
            XGBNode::Split { feature, threshold, left, right } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }
}

/// Candidate split: (feature, threshold, gain)
type SplitCandidate = (usize, f64, f64);

/// Build an XGBoost tree using exact greedy split finding
fn build_xgb_tree(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    indices: &[usize],
    feature_indices: &[usize],
    depth: usize,
    config: &XGBoostConfig,
) -> XGBNode {
    let n = indices.len();

    let g_sum: f64 = indices.iter().map(|&i| grad[i]).sum();
    let h_sum: f64 = indices.iter().map(|&i| hess[i]).sum();

    let leaf_weight = compute_leaf_weight(g_sum, h_sum, config.reg_lambda, config.reg_alpha);

    if depth >= config.max_depth || n < 2 || h_sum < config.min_child_weight {
        return XGBNode::Leaf { weight: leaf_weight };
    }

    // Candidates are evaluated in parallel and reduced in feature order so that
    // ties resolve to the lowest feature index on every run.
    let candidates: Vec<SplitCandidate> = feature_indices
        .par_iter()
        .filter_map(|&f| find_best_split_for_feature(x, grad, hess, indices, f, config))
        .collect();
    let best_split = candidates.into_iter().fold(None, |best: Option<SplitCandidate>, c| match best {
        Some(b) if c.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal) != Ordering::Greater => Some(b),
        _ => Some(c),
    });

    match best_split {
        Some((feature, threshold, gain)) if gain > config.gamma => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
                indices.iter().partition(|&&i| x[[i, feature]] <= threshold);

            if left_idx.is_empty() || right_idx.is_empty() {
                return XGBNode::Leaf { weight: leaf_weight };
            }

            let left = build_xgb_tree(x, grad, hess, &left_idx, feature_indices, depth + 1, config);
            let right = build_xgb_tree(x, grad, hess, &right_idx, feature_indices, depth + 1, config);

            XGBNode::Split {
                feature,
                threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        _ => XGBNode::Leaf { weight: leaf_weight },
    }
}

/// Optimal leaf weight with L1 (alpha) and L2 (lambda) regularization
fn compute_leaf_weight(g_sum: f64, h_sum: f64, lambda: f64, alpha: f64) -> f64 {
    if alpha > 0.0 {
        // Soft-threshold for L1
        let g_adj = if g_sum > alpha {
            g_sum - alpha
        } else if g_sum < -alpha {
            g_sum + alpha
        } else {
            return 0.0;
        };
        -g_adj / (h_sum + lambda)
    } else {
        -g_sum / (h_sum + lambda)
    }
}

/// Find best split for a single feature using exact greedy method
fn find_best_split_for_feature(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    indices: &[usize],
    feature: usize,
    config: &XGBoostConfig,
) -> Option<SplitCandidate> {
    let mut sorted_indices: Vec<usize> = indices.to_vec();
    sorted_indices.sort_by(|&a, &b| {
        x[[a, feature]].partial_cmp(&x[[b, feature]]).unwrap_or(Ordering::Equal)
    });

    let g_total: f64 = sorted_indices.iter().map(|&i| grad[i]).sum();
    let h_total: f64 = sorted_indices.iter().map(|&i| hess[i]).sum();

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<(f64, f64)> = None;

    let lambda = config.reg_lambda;

    for (pos, &idx) in sorted_indices.iter().enumerate() {
        g_left += grad[idx];
        h_left += hess[idx];

        // Only split between distinct values; the last position has no right side.
        let Some(&next_idx) = sorted_indices.get(pos + 1) else {
            break;
        };
        if (x[[idx, feature]] - x[[next_idx, feature]]).abs() < 1e-12 {
            continue;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;

        if h_left < config.min_child_weight || h_right < config.min_child_weight {
            continue;
        }

        let gain = 0.5
            * ((g_left * g_left) / (h_left + lambda)
                + (g_right * g_right) / (h_right + lambda)
                - (g_total * g_total) / (h_total + lambda));

        if best.map_or(true, |(_, best_gain)| gain > best_gain) {
            let threshold = (x[[idx, feature]] + x[[next_idx, feature]]) / 2.0;
            best = Some((threshold, gain));
        }
    }

    best.map(|(threshold, gain)| (feature, threshold, gain))
}

/// Shared helper: compute split-count importances from XGBNode trees
fn xgb_tree_importances(trees: &[XGBNode], n_features: usize) -> Array1<f64> {
    let mut counts = vec![0.0f64; n_features];
    for tree in trees {
        xgb_count_splits(tree, &mut counts);
    }
    let total: f64 = counts.iter().sum();
    if total > 0.0 {
        for c in counts.iter_mut() {
            *c /= total;
        }
    }
    Array1::from_vec(counts)
}

fn xgb_count_splits(node: &XGBNode, counts: &mut [f64]) {
    match node {
        XGBNode::Leaf { .. } => {}
        XGBNode::Split { feature, left, right, .. } => {
            if *feature < counts.len() {
                counts[*feature] += 1.0;
            }
            xgb_count_splits(left, counts);
            xgb_count_splits(right, counts);
        }
    }
}

// ─── XGBoost Classifier ────────────────────────────────────────────────────

/// XGBoost Classifier (logistic loss with second-order approximation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XGBoostClassifier {
    config: XGBoostConfig,
    trees: Vec<XGBNode>,
    /// Initial margin in log-odds space
    base_margin: f64,
    n_features: usize,
}

impl XGBoostClassifier {
    pub fn new(config: XGBoostConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_margin: 0.0,
            n_features: 0,
        }
    }

    pub fn config(&self) -> &XGBoostConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    /// Train on `x` with binary targets `y` (0.0 / 1.0). Any previously learned
    /// trees are discarded.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 {
            return Err(DelayError::InvalidInput("cannot fit on an empty matrix".to_string()));
        }
        if y.len() != n_samples {
            return Err(DelayError::ShapeMismatch {
                features: n_samples,
                targets: y.len(),
            });
        }

        let p = self.config.base_score;
        let base_margin = (p / (1.0 - p)).ln();
        let mut raw_preds = Array1::from_elem(n_samples, base_margin);

        let weights: Array1<f64> = y.mapv(|label| {
            if label > 0.5 {
                self.config.scale_pos_weight
            } else {
                1.0
            }
        });

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            // Weighted logistic loss: grad = w * (p - y), hess = w * p * (1 - p)
            let probs: Array1<f64> = raw_preds.mapv(Self::sigmoid);
            let grad: Array1<f64> = (&probs - y) * &weights;
            let hess: Array1<f64> = probs.mapv(|p| (p * (1.0 - p)).max(1e-7)) * &weights;

            let row_indices = subsample(&mut rng, n_samples, self.config.subsample);
            let col_indices = subsample(&mut rng, n_features, self.config.colsample_bytree);

            let tree = build_xgb_tree(x, &grad, &hess, &row_indices, &col_indices, 0, &self.config);

            for (i, row) in x.rows().into_iter().enumerate() {
                raw_preds[i] += self.config.learning_rate * tree.predict(row);
            }

            trees.push(tree);
        }

        self.trees = trees;
        self.base_margin = base_margin;
        self.n_features = n_features;
        Ok(())
    }

    /// Hard 0/1 predictions. A probability of exactly 0.5 is class 0.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    /// Probability of the positive class per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(DelayError::ShapeError(format!(
                "expected {} feature columns, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        let raw: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                self.trees.iter().fold(self.base_margin, |acc, tree| {
                    acc + self.config.learning_rate * tree.predict(row)
                })
            })
            .collect();
        Ok(raw.mapv(Self::sigmoid))
    }

    /// Compute feature importances by counting splits across all trees
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        if self.n_features == 0 {
            return None;
        }
        Some(xgb_tree_importances(&self.trees, self.n_features))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil() as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn classification_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((50, 2), (0..100).map(|i| i as f64 * 0.1).collect()).unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| if r[0] + r[1] > 5.0 { 1.0 } else { 0.0 })
            .collect();
        (x, y)
    }

    /// Binary indicator matrix where the first column drives the label and
    /// positives are a 20% minority.
    fn imbalanced_data() -> (Array2<f64>, Array1<f64>) {
        let n = 200;
        let x = Array2::from_shape_fn((n, 3), |(r, c)| match c {
            0 => f64::from(r % 5 == 0),
            1 => f64::from(r % 2 == 0),
            _ => f64::from(r % 3 == 0),
        });
        let y: Array1<f64> = (0..n).map(|r| f64::from(r % 5 == 0)).collect();
        (x, y)
    }

    fn accuracy(preds: &Array1<f64>, y: &Array1<f64>) -> f64 {
        let correct = preds.iter().zip(y.iter()).filter(|(p, a)| (*p - *a).abs() < 0.5).count();
        correct as f64 / y.len() as f64
    }

    #[test]
    fn test_xgboost_classifier() {
        let (x, y) = classification_data();
        let mut model = XGBoostClassifier::new(XGBoostConfig {
            n_estimators: 50,
            max_depth: 4,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        let acc = accuracy(&model.predict(&x).unwrap(), &y);
        assert!(acc >= 0.8, "XGBoost classifier accuracy = {}", acc);
    }

    #[test]
    fn test_xgboost_predict_proba() {
        let (x, y) = classification_data();
        let mut model = XGBoostClassifier::new(Default::default());
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), x.nrows());
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_delay_preset_learns_minority_class() {
        let (x, y) = imbalanced_data();
        let mut model = XGBoostClassifier::new(XGBoostConfig::delay_model(4.0));
        model.fit(&x, &y).unwrap();

        assert_eq!(model.n_trees(), 100);
        let preds = model.predict(&x).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_positive_weight_shifts_probabilities() {
        let (x, y) = imbalanced_data();
        let mut plain = XGBoostClassifier::new(XGBoostConfig::delay_model(1.0));
        let mut weighted = XGBoostClassifier::new(XGBoostConfig::delay_model(4.0));
        plain.fit(&x, &y).unwrap();
        weighted.fit(&x, &y).unwrap();

        let p_plain = plain.predict_proba(&x).unwrap();
        let p_weighted = weighted.predict_proba(&x).unwrap();
        // Row 0 is a positive example
        assert!(p_weighted[0] > p_plain[0]);
    }

    #[test]
    fn test_half_probability_is_class_zero() {
        let x = Array2::<f64>::zeros((100, 3));
        let y: Array1<f64> = (0..100).map(|r| f64::from(r % 5 == 0)).collect();
        let mut model = XGBoostClassifier::new(XGBoostConfig::delay_model(4.0));
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (p - 0.5).abs() < 1e-12));
        assert!(model.predict(&x).unwrap().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_subsampling_is_deterministic_with_seed() {
        let (x, y) = imbalanced_data();
        let config = XGBoostConfig {
            subsample: 0.5,
            colsample_bytree: 0.5,
            ..XGBoostConfig::delay_model(4.0)
        };
        let mut a = XGBoostClassifier::new(config.clone());
        let mut b = XGBoostClassifier::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);

        let mut full = XGBoostClassifier::new(XGBoostConfig::delay_model(4.0));
        full.fit(&x, &y).unwrap();
        assert_ne!(a, full);
    }

    #[test]
    fn test_subsample_picks_sorted_unique_rows() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let rows = subsample(&mut rng, 10, 0.35);
        assert_eq!(rows.len(), 4);
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
        assert!(rows.iter().all(|&r| r < 10));
        assert_eq!(subsample(&mut rng, 5, 1.0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_l1_shrinks_leaf_weights() {
        assert_eq!(compute_leaf_weight(-4.0, 3.0, 1.0, 0.0), 1.0);
        assert_eq!(compute_leaf_weight(-4.0, 3.0, 1.0, 2.0), 0.5);
        assert_eq!(compute_leaf_weight(1.5, 3.0, 1.0, 2.0), 0.0);

        let (x, y) = imbalanced_data();
        let mut plain = XGBoostClassifier::new(XGBoostConfig::delay_model(4.0));
        let mut l1 = XGBoostClassifier::new(XGBoostConfig {
            reg_alpha: 5.0,
            ..XGBoostConfig::delay_model(4.0)
        });
        plain.fit(&x, &y).unwrap();
        l1.fit(&x, &y).unwrap();
        // Row 0 is positive, row 1 negative: both are pulled toward 0.5
        let p_plain = plain.predict_proba(&x).unwrap();
        let p_l1 = l1.predict_proba(&x).unwrap();
        assert!(p_l1[0] < p_plain[0]);
        assert!(p_l1[1] > p_plain[1]);
    }

    #[test]
    fn test_large_gamma_blocks_splits() {
        let (x, y) = imbalanced_data();
        let mut model = XGBoostClassifier::new(XGBoostConfig {
            gamma: 1e9,
            ..XGBoostConfig::delay_model(4.0)
        });
        model.fit(&x, &y).unwrap();
        let importances = model.feature_importances().unwrap();
        assert!(importances.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_unseeded_fit() {
        let (x, y) = imbalanced_data();
        let mut model = XGBoostClassifier::new(XGBoostConfig {
            random_state: None,
            subsample: 0.8,
            ..XGBoostConfig::delay_model(4.0)
        });
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_trees(), 100);
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    fn test_fit_is_deterministic_with_seed() {
        let (x, y) = imbalanced_data();
        let mut a = XGBoostClassifier::new(XGBoostConfig::delay_model(4.0));
        let mut b = XGBoostClassifier::new(XGBoostConfig::delay_model(4.0));
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_min_child_weight_blocks_small_splits() {
        let (x, y) = classification_data();
        let mut model = XGBoostClassifier::new(XGBoostConfig {
            n_estimators: 5,
            min_child_weight: 1e6,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        let importances = model.feature_importances().unwrap();
        assert!(importances.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_feature_importances_favour_signal() {
        let (x, y) = imbalanced_data();
        let mut model = XGBoostClassifier::new(XGBoostConfig::delay_model(4.0));
        model.fit(&x, &y).unwrap();
        let importances = model.feature_importances().unwrap();
        assert!(importances[0] > importances[1]);
        assert!(importances[0] > importances[2]);
    }

    #[test]
    fn test_shape_checks() {
        let (x, y) = classification_data();
        let mut model = XGBoostClassifier::new(Default::default());
        let short = y.slice(ndarray::s![..10]).to_owned();
        assert!(matches!(model.fit(&x, &short), Err(DelayError::ShapeMismatch { .. })));

        model.fit(&x, &y).unwrap();
        let wide = Array2::<f64>::zeros((2, 3));
        assert!(matches!(model.predict(&wide), Err(DelayError::ShapeError(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (x, y) = classification_data();
        let mut model = XGBoostClassifier::new(XGBoostConfig {
            scale_pos_weight: f64::INFINITY,
            ..Default::default()
        });
        assert!(matches!(model.fit(&x, &y), Err(DelayError::InvalidInput(_))));
    }
}
