// =============================================================================
// Exit Planner — fixation point and staged limit-order schedule
// =============================================================================
//
// Given every buy of a position and a target return factor X, the planner
// derives two things:
//
//   1. **Fixation point** — the price at which selling part of the position
//      recovers X× the invested capital:
//
//        sell_price     = (total_cost × X) / total_tokens
//        amount_to_sell = total_cost / sell_price   (= total_tokens / X)
//
//   2. **Limit-order schedule** — the remaining tokens are unwound through
//      `stages` equal-size limit orders placed above the fixation price, at
//      fixed fractions of it per stage count (the last order always sits at
//      2× the fixation price).
//
// The computation is a single-shot pure transform: no shared state, no side
// effects, identical inputs always produce identical output.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ExitPlanRequest, StageOrder};

// =============================================================================
// Stage fraction tables
// =============================================================================

/// Price fractions (of the fixation price) for each supported stage count.
///
/// Stage counts outside {2, 3, 4} have no table; they are rejected at the
/// validation boundary and [`compute_exit_plan`] returns `None` for them.
fn stage_fractions(stages: u32) -> Option<&'static [f64]> {
    match stages {
        2 => Some(&[1.5, 2.0]),
        3 => Some(&[1.33, 1.66, 2.0]),
        4 => Some(&[1.25, 1.5, 1.75, 2.0]),
        _ => None,
    }
}

// =============================================================================
// ExitPlan
// =============================================================================

/// Result of one exit-plan computation. All monetary fields are in the quote
/// currency of the purchases; token fields are token counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitPlan {
    /// Total capital invested: Σ price × amount over all purchases.
    pub total_cost: f64,
    /// Total tokens held: Σ amount over all purchases.
    pub total_tokens: f64,
    /// Position value targeted at fixation: total_cost × multiplier.
    pub target_value: f64,
    /// Fixation price: target_value / total_tokens.
    pub sell_price: f64,
    /// Tokens sold at the fixation price to recover the invested capital.
    pub amount_to_sell: f64,
    /// Tokens left after fixation, to be unwound through the staged orders.
    pub remaining_tokens: f64,
    /// Limit prices for each stage, ascending.
    pub stage_prices: Vec<f64>,
    /// Token amounts for each stage; all equal.
    pub stage_amounts: Vec<f64>,
}

impl ExitPlan {
    /// Pair each stage's price and amount with its 1-based index, as the
    /// schedule is displayed to the user.
    pub fn stage_orders(&self) -> Vec<StageOrder> {
        self.stage_prices
            .iter()
            .zip(self.stage_amounts.iter())
            .enumerate()
            .map(|(i, (&price, &amount))| StageOrder {
                stage: i as u32 + 1,
                price,
                amount,
            })
            .collect()
    }
}

// =============================================================================
// Computation
// =============================================================================

/// Compute the fixation point and limit-order schedule for a position.
///
/// # Returns
/// `None` when:
/// - There are no purchases, or any price/amount is zero, negative, or
///   non-finite (the validation boundary rejects these before calling).
/// - `multiplier` is outside [2, 4] or `stages` has no fraction table.
///
/// Valid input always yields `Some`: total_tokens > 0 and multiplier ≥ 2
/// guarantee every division is well-defined.
pub fn compute_exit_plan(request: &ExitPlanRequest) -> Option<ExitPlan> {
    if request.purchases.is_empty() {
        return None;
    }
    if request
        .purchases
        .iter()
        .any(|p| !(p.price > 0.0 && p.price.is_finite()) || !(p.amount > 0.0 && p.amount.is_finite()))
    {
        return None;
    }
    if !(2..=4).contains(&request.multiplier) {
        return None;
    }
    let fractions = stage_fractions(request.stages)?;

    let total_cost = request.total_cost();
    let total_tokens = request.total_tokens();

    let target_value = total_cost * request.multiplier as f64;
    let sell_price = target_value / total_tokens;
    let amount_to_sell = total_cost / sell_price;
    let remaining_tokens = total_tokens - amount_to_sell;

    let stage_prices: Vec<f64> = fractions.iter().map(|f| sell_price * f).collect();
    let per_stage = remaining_tokens / request.stages as f64;
    let stage_amounts = vec![per_stage; request.stages as usize];

    debug!(
        purchases = request.purchases.len(),
        multiplier = request.multiplier,
        stages = request.stages,
        sell_price,
        amount_to_sell,
        "exit plan computed"
    );

    Some(ExitPlan {
        total_cost,
        total_tokens,
        target_value,
        sell_price,
        amount_to_sell,
        remaining_tokens,
        stage_prices,
        stage_amounts,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Purchase;

    const TOL: f64 = 1e-9;

    fn request(pairs: &[(f64, f64)], multiplier: u32, stages: u32) -> ExitPlanRequest {
        ExitPlanRequest {
            purchases: pairs
                .iter()
                .map(|&(price, amount)| Purchase { price, amount })
                .collect(),
            multiplier,
            stages,
        }
    }

    #[test]
    fn two_purchases_double_two_stages() {
        // 100×1 + 80×2 = 260 invested over 3 tokens, 2× target.
        let plan = compute_exit_plan(&request(&[(100.0, 1.0), (80.0, 2.0)], 2, 2)).unwrap();

        assert!((plan.total_cost - 260.0).abs() < TOL);
        assert!((plan.total_tokens - 3.0).abs() < TOL);
        assert!((plan.target_value - 520.0).abs() < TOL);
        assert!((plan.sell_price - 520.0 / 3.0).abs() < TOL);
        assert!((plan.amount_to_sell - 1.5).abs() < TOL);
        assert!((plan.remaining_tokens - 1.5).abs() < TOL);

        assert_eq!(plan.stage_prices.len(), 2);
        assert!((plan.stage_prices[0] - 260.0).abs() < 1e-6);
        assert!((plan.stage_prices[1] - 1040.0 / 3.0).abs() < 1e-6);
        assert_eq!(plan.stage_amounts, vec![0.75, 0.75]);
    }

    #[test]
    fn single_purchase_quadruple_four_stages() {
        let plan = compute_exit_plan(&request(&[(1.0, 1.0)], 4, 4)).unwrap();

        assert!((plan.total_cost - 1.0).abs() < TOL);
        assert!((plan.total_tokens - 1.0).abs() < TOL);
        assert!((plan.target_value - 4.0).abs() < TOL);
        assert!((plan.sell_price - 4.0).abs() < TOL);
        assert!((plan.amount_to_sell - 0.25).abs() < TOL);
        assert!((plan.remaining_tokens - 0.75).abs() < TOL);

        let expected_prices = [5.0, 6.0, 7.0, 8.0];
        for (got, want) in plan.stage_prices.iter().zip(expected_prices.iter()) {
            assert!((got - want).abs() < TOL, "price {got} != {want}");
        }
        for amount in &plan.stage_amounts {
            assert!((amount - 0.1875).abs() < TOL);
        }
    }

    #[test]
    fn amount_to_sell_recovers_capital() {
        // amount_to_sell × multiplier must equal total_tokens: selling that
        // amount at the fixation price returns exactly the invested capital.
        for multiplier in 2..=4 {
            let plan =
                compute_exit_plan(&request(&[(0.004, 250_000.0), (0.002, 100_000.0)], multiplier, 3))
                    .unwrap();
            assert!(
                (plan.amount_to_sell * multiplier as f64 - plan.total_tokens).abs() < 1e-6,
                "multiplier {multiplier}"
            );
            assert!((plan.amount_to_sell * plan.sell_price - plan.total_cost).abs() < 1e-6);
        }
    }

    #[test]
    fn remaining_tokens_formula() {
        for multiplier in 2..=4 {
            let plan = compute_exit_plan(&request(&[(3.5, 12.0)], multiplier, 2)).unwrap();
            let expected = plan.total_tokens * (1.0 - 1.0 / multiplier as f64);
            assert!((plan.remaining_tokens - expected).abs() < TOL);
            assert!(plan.remaining_tokens >= 0.0);
        }
    }

    #[test]
    fn stage_amounts_sum_to_remaining() {
        for stages in 2..=4 {
            let plan = compute_exit_plan(&request(&[(10.0, 7.0), (12.0, 3.0)], 3, stages)).unwrap();
            assert_eq!(plan.stage_amounts.len(), stages as usize);
            assert_eq!(plan.stage_prices.len(), stages as usize);

            let sum: f64 = plan.stage_amounts.iter().sum();
            assert!((sum - plan.remaining_tokens).abs() < TOL);

            let first = plan.stage_amounts[0];
            assert!(plan.stage_amounts.iter().all(|a| (a - first).abs() < TOL));
        }
    }

    #[test]
    fn stage_prices_non_decreasing_and_above_fixation() {
        for stages in 2..=4 {
            let plan = compute_exit_plan(&request(&[(0.5, 100.0)], 2, stages)).unwrap();
            for window in plan.stage_prices.windows(2) {
                assert!(window[1] >= window[0]);
            }
            for price in &plan.stage_prices {
                assert!(*price >= plan.sell_price);
            }
            // The last order always sits at 2× the fixation price.
            assert!((plan.stage_prices.last().unwrap() - plan.sell_price * 2.0).abs() < TOL);
        }
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let req = request(&[(0.0071, 1_000_000.0), (0.0065, 500_000.0)], 3, 3);
        let a = compute_exit_plan(&req).unwrap();
        let b = compute_exit_plan(&req).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_amounts_are_handled() {
        // Amount step down to 1e-9 must survive the arithmetic.
        let plan = compute_exit_plan(&request(&[(250_000.0, 1e-9)], 2, 2)).unwrap();
        assert!(plan.sell_price.is_finite());
        assert!(plan.sell_price > 0.0);
        assert!((plan.amount_to_sell - 5e-10).abs() < 1e-18);
    }

    #[test]
    fn rejects_empty_and_non_positive_purchases() {
        assert!(compute_exit_plan(&request(&[], 2, 2)).is_none());
        assert!(compute_exit_plan(&request(&[(0.0, 5.0)], 2, 2)).is_none());
        assert!(compute_exit_plan(&request(&[(5.0, 0.0)], 2, 2)).is_none());
        assert!(compute_exit_plan(&request(&[(-1.0, 5.0)], 2, 2)).is_none());
        // One bad entry poisons the whole request even if others are fine.
        assert!(compute_exit_plan(&request(&[(100.0, 1.0), (0.0, 5.0)], 2, 2)).is_none());
        assert!(compute_exit_plan(&request(&[(f64::NAN, 1.0)], 2, 2)).is_none());
    }

    #[test]
    fn rejects_out_of_range_multiplier_and_stages() {
        assert!(compute_exit_plan(&request(&[(1.0, 1.0)], 1, 2)).is_none());
        assert!(compute_exit_plan(&request(&[(1.0, 1.0)], 5, 2)).is_none());
        // No single-element fallback schedule for unsupported stage counts.
        assert!(compute_exit_plan(&request(&[(1.0, 1.0)], 2, 1)).is_none());
        assert!(compute_exit_plan(&request(&[(1.0, 1.0)], 2, 5)).is_none());
    }

    #[test]
    fn stage_orders_are_one_based() {
        let plan = compute_exit_plan(&request(&[(2.0, 10.0)], 2, 3)).unwrap();
        let orders = plan.stage_orders();
        assert_eq!(orders.len(), 3);
        for (i, order) in orders.iter().enumerate() {
            assert_eq!(order.stage, i as u32 + 1);
            assert!((order.price - plan.stage_prices[i]).abs() < TOL);
            assert!((order.amount - plan.stage_amounts[i]).abs() < TOL);
        }
    }

    #[test]
    fn fraction_tables_match_stage_counts() {
        assert_eq!(stage_fractions(2), Some(&[1.5, 2.0][..]));
        assert_eq!(stage_fractions(3), Some(&[1.33, 1.66, 2.0][..]));
        assert_eq!(stage_fractions(4), Some(&[1.25, 1.5, 1.75, 2.0][..]));
        assert_eq!(stage_fractions(0), None);
        assert_eq!(stage_fractions(5), None);
    }
}
