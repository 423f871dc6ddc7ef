//! Isolation forest outlier detection.
//!
//! Points that are isolated by few random axis-aligned cuts are outliers.
//! Scores follow Liu et al. (2008): `s = 2^(-E[h(x)] / c(n))`, where values
//! close to 1 are anomalous and values well below 0.5 are normal.
//!
//! The forest is seeded, so identical input always yields identical labels.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

/// Default number of trees.
const DEFAULT_TREES: usize = 100;

/// Default subsample size per tree.
const DEFAULT_SAMPLE: usize = 256;

#[derive(Debug, Clone)]
pub struct IsolationForestConfig {
    pub n_trees: usize,
    pub sample_size: usize,
    /// Expected outlier share in (0, 0.5].
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_TREES,
            sample_size: DEFAULT_SAMPLE,
            contamination: 0.05,
            seed: 42,
        }
    }
}

enum ITree {
    External(usize),
    Internal {
        feature: usize,
        split: f64,
        left: Box<ITree>,
        right: Box<ITree>,
    },
}

pub struct IsolationForest {
    trees: Vec<ITree>,
    sample_size: usize,
    threshold: f64,
}

/// Average path length of an unsuccessful BST search over `n` points.
fn c_factor(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + 0.577_215_664_901_532_9) - 2.0 * (n - 1.0) / n
        }
    }
}

impl IsolationForest {
    /// Fit on `rows` and derive the decision threshold from the contamination rate.
    pub fn fit(rows: &[Vec<f64>], config: &IsolationForestConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let sample_size = config.sample_size.min(rows.len()).max(1);
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        let trees = (0..config.n_trees)
            .map(|_| {
                let idx: Vec<usize> = if rows.len() <= sample_size {
                    (0..rows.len()).collect()
                } else {
                    sample(&mut rng, rows.len(), sample_size).into_vec()
                };
                grow(rows, idx, 0, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            threshold: f64::INFINITY,
        };

        let mut scores: Vec<f64> = rows.iter().map(|r| forest.score(r)).collect();
        scores.sort_by(|a, b| b.total_cmp(a));
        let contamination = config.contamination.clamp(0.0, 0.5);
        let n_outliers = (contamination * rows.len() as f64).round() as usize;
        if n_outliers > 0 && !scores.is_empty() {
            forest.threshold = scores[(n_outliers - 1).min(scores.len() - 1)];
        }
        forest
    }

    /// Anomaly score in (0, 1].
    pub fn score(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let avg: f64 = self
            .trees
            .iter()
            .map(|t| path_length(t, row, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        let c = c_factor(self.sample_size);
        if c <= 0.0 {
            return 0.0;
        }
        2f64.powf(-avg / c)
    }

    /// Whether `row` falls in the top `contamination` share of training scores.
    pub fn is_outlier(&self, row: &[f64]) -> bool {
        self.score(row) >= self.threshold
    }
}

fn grow(
    rows: &[Vec<f64>],
    idx: Vec<usize>,
    depth: usize,
    limit: usize,
    rng: &mut StdRng,
) -> ITree {
    if depth >= limit || idx.len() <= 1 {
        return ITree::External(idx.len());
    }
    let dim = rows[idx[0]].len();
    if dim == 0 {
        return ITree::External(idx.len());
    }

    // Only features with spread can be cut.
    let spans: Vec<(usize, f64, f64)> = (0..dim)
        .filter_map(|f| {
            let (lo, hi) = idx.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                (lo.min(rows[i][f]), hi.max(rows[i][f]))
            });
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();
    if spans.is_empty() {
        return ITree::External(idx.len());
    }

    let (feature, lo, hi) = spans[rng.gen_range(0..spans.len())];
    let split = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) =
        idx.into_iter().partition(|&i| rows[i][feature] < split);

    ITree::Internal {
        feature,
        split,
        left: Box::new(grow(rows, left, depth + 1, limit, rng)),
        right: Box::new(grow(rows, right, depth + 1, limit, rng)),
    }
}

fn path_length(tree: &ITree, row: &[f64], depth: usize) -> f64 {
    match tree {
        ITree::External(size) => depth as f64 + c_factor(*size),
        ITree::Internal {
            feature,
            split,
            left,
            right,
        } => {
            if row[*feature] < *split {
                path_length(left, row, depth + 1)
            } else {
                path_length(right, row, depth + 1)
            }
        }
    }
}
