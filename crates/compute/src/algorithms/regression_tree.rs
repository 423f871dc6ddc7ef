//! CART regression trees used as weak learners for gradient boosting.
//!
//! Two split-search strategies are supported:
//! - **Exact**: every distinct feature value is a split candidate.
//! - **Histogram**: candidates are restricted to per-feature quantile bin
//!   edges computed once per boosting run.

/// Split-search strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitSearch {
    Exact,
    /// Per-feature ascending bin edges.
    Histogram(Vec<Vec<f64>>),
}

impl SplitSearch {
    /// Build histogram edges from a feature matrix, `bins` quantiles per feature.
    pub fn histogram(rows: &[Vec<f64>], bins: usize) -> Self {
        let dim = rows.first().map(|r| r.len()).unwrap_or(0);
        let bins = bins.max(2);
        let edges = (0..dim)
            .map(|f| {
                let mut col: Vec<f64> = rows.iter().map(|r| r[f]).collect();
                col.sort_by(|a, b| a.total_cmp(b));
                let mut e: Vec<f64> = (1..bins)
                    .map(|b| col[(b * (col.len() - 1)) / bins])
                    .collect();
                e.dedup();
                e
            })
            .collect();
        SplitSearch::Histogram(edges)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    root: Node,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit a tree on `rows[indices]` against `targets`.
    ///
    /// `gains` accumulates the SSE reduction of every split per feature.
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        params: &TreeParams,
        search: &SplitSearch,
        gains: &mut [f64],
    ) -> Self {
        let root = build(rows, targets, indices.to_vec(), 0, params, search, gains);
        Self { root }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(v) => return *v,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Number of leaves, used by tests and diagnostics.
    pub fn leaf_count(&self) -> usize {
        fn count(n: &Node) -> usize {
            match n {
                Node::Leaf(_) => 1,
                Node::Split { left, right, .. } => count(left) + count(right),
            }
        }
        count(&self.root)
    }
}

fn leaf_value(targets: &[f64], idx: &[usize]) -> f64 {
    if idx.is_empty() {
        return 0.0;
    }
    idx.iter().map(|&i| targets[i]).sum::<f64>() / idx.len() as f64
}

fn build(
    rows: &[Vec<f64>],
    targets: &[f64],
    idx: Vec<usize>,
    depth: usize,
    params: &TreeParams,
    search: &SplitSearch,
    gains: &mut [f64],
) -> Node {
    if depth >= params.max_depth || idx.len() < params.min_samples_leaf * 2 {
        return Node::Leaf(leaf_value(targets, &idx));
    }

    let best = match best_split(rows, targets, &idx, params, search) {
        Some(c) if c.gain > 1e-12 => c,
        _ => return Node::Leaf(leaf_value(targets, &idx)),
    };

    if let Some(g) = gains.get_mut(best.feature) {
        *g += best.gain;
    }

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
        .into_iter()
        .partition(|&i| rows[i][best.feature] <= best.threshold);

    Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(build(rows, targets, left_idx, depth + 1, params, search, gains)),
        right: Box::new(build(rows, targets, right_idx, depth + 1, params, search, gains)),
    }
}

fn best_split(
    rows: &[Vec<f64>],
    targets: &[f64],
    idx: &[usize],
    params: &TreeParams,
    search: &SplitSearch,
) -> Option<Candidate> {
    let dim = rows.first()?.len();
    let n = idx.len() as f64;
    let total_sum: f64 = idx.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = idx.iter().map(|&i| targets[i] * targets[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n;
    let min_leaf = params.min_samples_leaf.max(1);

    let mut best: Option<Candidate> = None;

    for feature in 0..dim {
        let mut order: Vec<usize> = idx.to_vec();
        order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let edges = match search {
            SplitSearch::Exact => None,
            SplitSearch::Histogram(e) => e.get(feature),
        };

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for (pos, &i) in order.iter().enumerate() {
            let t = targets[i];
            left_sum += t;
            left_sq += t * t;

            let left_n = pos + 1;
            let right_n = order.len() - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let here = rows[i][feature];
            let next = rows[order[pos + 1]][feature];
            if next <= here {
                continue;
            }

            let threshold = match edges {
                None => (here + next) / 2.0,
                // Only split where a bin edge falls between the two values.
                Some(e) => match e.iter().find(|&&edge| edge >= here && edge < next) {
                    Some(&edge) => edge,
                    None => continue,
                },
            };

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);
            let gain = parent_sse - sse;

            if best.as_ref().map(|b| gain > b.gain).unwrap_or(true) {
                best = Some(Candidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = rows.iter().map(|r| if r[0] < 20.0 { 1.0 } else { 5.0 }).collect();
        (rows, y)
    }

    #[test]
    fn finds_step_split() {
        let (rows, y) = step_data();
        let idx: Vec<usize> = (0..rows.len()).collect();
        let mut gains = vec![0.0; 2];
        let params = TreeParams { max_depth: 1, min_samples_leaf: 2 };
        let tree = RegressionTree::fit(&rows, &y, &idx, &params, &SplitSearch::Exact, &mut gains);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict(&[5.0, 0.0]), 1.0);
        assert_eq!(tree.predict(&[35.0, 0.0]), 5.0);
        assert!(gains[0] > 0.0);
        assert_eq!(gains[1], 0.0);
    }

    #[test]
    fn histogram_search_also_splits() {
        let (rows, y) = step_data();
        let idx: Vec<usize> = (0..rows.len()).collect();
        let mut gains = vec![0.0; 2];
        let params = TreeParams { max_depth: 2, min_samples_leaf: 2 };
        let search = SplitSearch::histogram(&rows, 8);
        let tree = RegressionTree::fit(&rows, &y, &idx, &params, &search, &mut gains);
        assert!((tree.predict(&[0.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!((tree.predict(&[39.0, 0.0]) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn constant_target_is_single_leaf() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y = vec![3.0; 10];
        let idx: Vec<usize> = (0..10).collect();
        let mut gains = vec![0.0];
        let params = TreeParams { max_depth: 3, min_samples_leaf: 1 };
        let tree = RegressionTree::fit(&rows, &y, &idx, &params, &SplitSearch::Exact, &mut gains);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&[100.0]), 3.0);
    }
}
