//! Bounded single-product price optimization.
//!
//! Revenue at price `p` is
//! `p * base_demand * (p / current)^elasticity * competitor_penalty(p)`,
//! maximized over `[max(0.7 * current, floor), 1.5 * current]`. The
//! competitor penalty is discontinuous, so the optimizer scans a grid first
//! and then refines around the best grid point with golden-section search.

use serde::{Deserialize, Serialize};
use tracing::debug;

use spirit_core::{AnalyticsError, Result};

/// Lowest allowed price as a share of the current price.
pub const MIN_PRICE_RATIO: f64 = 0.7;
/// Highest allowed price as a share of the current price.
pub const MAX_PRICE_RATIO: f64 = 1.5;

const GRID_POINTS: usize = 400;
const GOLDEN_ITERATIONS: usize = 60;

/// Pricing inputs for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPricing {
    pub product_id: String,
    pub current_price: f64,
    /// Price elasticity of demand, typically negative.
    pub elasticity: f64,
    pub competitor_price: Option<f64>,
    /// Target margin in [0, 1).
    pub target_margin: f64,
    /// Unit cost. When absent the floor is `current * (1 - target_margin)`.
    pub unit_cost: Option<f64>,
    /// Expected demand at the current price.
    #[serde(default = "default_base_demand")]
    pub base_demand: f64,
}

fn default_base_demand() -> f64 {
    100.0
}

impl ProductPricing {
    pub fn new(product_id: impl Into<String>, current_price: f64, elasticity: f64) -> Self {
        Self {
            product_id: product_id.into(),
            current_price,
            elasticity,
            competitor_price: None,
            target_margin: 0.0,
            unit_cost: None,
            base_demand: default_base_demand(),
        }
    }

    pub fn with_competitor(mut self, price: f64) -> Self {
        self.competitor_price = Some(price);
        self
    }

    pub fn with_margin(mut self, target_margin: f64) -> Self {
        self.target_margin = target_margin;
        self
    }

    pub fn with_unit_cost(mut self, cost: f64) -> Self {
        self.unit_cost = Some(cost);
        self
    }

    fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(AnalyticsError::Validation(format!("{}: {msg}", self.product_id)));
        if !(self.current_price.is_finite() && self.current_price > 0.0) {
            return bad(format!("current price {} must be positive", self.current_price));
        }
        if !self.elasticity.is_finite() {
            return bad("elasticity must be finite".into());
        }
        if !(0.0..1.0).contains(&self.target_margin) {
            return bad(format!("target margin {} not in [0, 1)", self.target_margin));
        }
        if let Some(c) = self.competitor_price {
            if !(c.is_finite() && c > 0.0) {
                return bad(format!("competitor price {c} must be positive"));
            }
        }
        if let Some(c) = self.unit_cost {
            if !(c.is_finite() && c >= 0.0) {
                return bad(format!("unit cost {c} must be non-negative"));
            }
        }
        if !(self.base_demand.is_finite() && self.base_demand > 0.0) {
            return bad(format!("base demand {} must be positive", self.base_demand));
        }
        Ok(())
    }

    /// Lowest price that still meets the target margin.
    pub fn margin_floor(&self) -> f64 {
        match self.unit_cost {
            Some(cost) => cost / (1.0 - self.target_margin),
            None => self.current_price * (1.0 - self.target_margin),
        }
    }

    /// Demand multiplier from price elasticity.
    pub fn demand_at(&self, price: f64) -> f64 {
        self.base_demand * (price / self.current_price).powf(self.elasticity)
    }

    /// Revenue multiplier from the ratio to the competitor's price.
    pub fn competitor_penalty(&self, price: f64) -> f64 {
        match self.competitor_price {
            Some(c) => {
                let ratio = price / c;
                if ratio > 1.2 {
                    0.8
                } else if ratio < 0.8 {
                    0.9
                } else {
                    1.0
                }
            }
            None => 1.0,
        }
    }

    pub fn revenue_at(&self, price: f64) -> f64 {
        price * self.demand_at(price) * self.competitor_penalty(price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRecommendation {
    pub product_id: String,
    pub current_price: f64,
    pub optimized_price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub price_change_pct: f64,
    pub expected_demand: f64,
    pub expected_revenue: f64,
    pub demand_change_pct: f64,
    pub revenue_change_pct: f64,
}

/// Optimize one product's price within its bounds.
pub fn optimize_product(product: &ProductPricing) -> Result<PricingRecommendation> {
    product.validate()?;
    let current = product.current_price;
    let lower = (MIN_PRICE_RATIO * current).max(product.margin_floor());
    let upper = MAX_PRICE_RATIO * current;
    if lower > upper {
        return Err(AnalyticsError::Validation(format!(
            "{}: margin floor {:.2} exceeds the price ceiling {:.2}",
            product.product_id, lower, upper
        )));
    }

    let price = maximize(|p| product.revenue_at(p), lower, upper);

    let current_demand = product.demand_at(current);
    let current_revenue = product.revenue_at(current);
    let expected_demand = product.demand_at(price);
    let expected_revenue = product.revenue_at(price);

    debug!(
        product = %product.product_id,
        current,
        optimized = price,
        lower,
        upper,
        "price optimized"
    );

    Ok(PricingRecommendation {
        product_id: product.product_id.clone(),
        current_price: current,
        optimized_price: price,
        lower_bound: lower,
        upper_bound: upper,
        price_change_pct: pct_change(current, price),
        expected_demand,
        expected_revenue,
        demand_change_pct: pct_change(current_demand, expected_demand),
        revenue_change_pct: pct_change(current_revenue, expected_revenue),
    })
}

fn pct_change(from: f64, to: f64) -> f64 {
    if from.abs() <= f64::EPSILON {
        0.0
    } else {
        100.0 * (to - from) / from
    }
}

/// Maximize `f` on `[lo, hi]`: grid scan, then golden-section refinement in
/// the bracket around the best grid point. Returns whichever is better.
fn maximize(f: impl Fn(f64) -> f64, lo: f64, hi: f64) -> f64 {
    if hi - lo <= f64::EPSILON {
        return lo;
    }
    let step = (hi - lo) / GRID_POINTS as f64;
    let (best_i, best_v) = (0..=GRID_POINTS)
        .map(|i| (i, f(lo + step * i as f64)))
        .fold((0, f64::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });
    let grid_best = lo + step * best_i as f64;

    let mut a = (grid_best - step).max(lo);
    let mut b = (grid_best + step).min(hi);
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    for _ in 0..GOLDEN_ITERATIONS {
        if f(c) > f(d) {
            b = d;
        } else {
            a = c;
        }
        c = b - inv_phi * (b - a);
        d = a + inv_phi * (b - a);
    }
    let refined = ((a + b) / 2.0).clamp(lo, hi);

    if f(refined) > best_v {
        refined
    } else {
        grid_best
    }
}
