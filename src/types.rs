// =============================================================================
// Shared types used across the Borealis exit planner
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single buy of the token: price paid per token and number of tokens.
///
/// Purchases are immutable once constructed; the planner only ever reads them.
/// Order within a portfolio does not affect the computed plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Price paid per token, in quote currency.
    pub price: f64,
    /// Number of tokens bought. Amounts as small as 1e-9 are supported.
    pub amount: f64,
}

impl Purchase {
    /// Capital spent on this purchase (price × amount).
    pub fn cost(&self) -> f64 {
        self.price * self.amount
    }
}

/// One row of the staged limit-order table: the order to place at `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageOrder {
    /// 1-based stage index, matching how the schedule is presented.
    pub stage: u32,
    /// Limit price for this stage's order.
    pub price: f64,
    /// Number of tokens to sell at this stage.
    pub amount: f64,
}

/// A complete plan submission, built once per request and passed by value
/// into the planner. Replaces any per-field mutable form state: the request
/// is the only channel between the input boundary and the calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitPlanRequest {
    /// All buys in the position, 1 to `max_purchases` entries.
    pub purchases: Vec<Purchase>,
    /// Target return factor X: exit when position value reaches X× capital.
    pub multiplier: u32,
    /// Number of staged limit orders for the remaining balance.
    pub stages: u32,
}

impl ExitPlanRequest {
    /// Total capital invested across all purchases.
    pub fn total_cost(&self) -> f64 {
        self.purchases.iter().map(Purchase::cost).sum()
    }

    /// Total number of tokens held across all purchases.
    pub fn total_tokens(&self) -> f64 {
        self.purchases.iter().map(|p| p.amount).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================
