// =============================================================================
// Request Validation — the caller-facing boundary in front of the planner
// =============================================================================
//
// Every submission is checked here before the planner runs. A single failed
// check rejects the whole request with one user-facing message; no partial
// plan is ever computed or returned. The planner itself assumes valid input.
// =============================================================================

use thiserror::Error;

use crate::runtime_config::RuntimeConfig;
use crate::types::ExitPlanRequest;

/// Multiplier and stage-count bounds are fixed by the stage fraction tables,
/// not configurable: only these values have a defined schedule.
pub const MULTIPLIER_MIN: u32 = 2;
pub const MULTIPLIER_MAX: u32 = 4;
pub const STAGES_MIN: u32 = 2;
pub const STAGES_MAX: u32 = 4;

/// Why a submission was rejected. Each variant renders as the single blocking
/// message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one purchase is required")]
    NoPurchases,

    #[error("too many purchases: {count} (maximum {max})")]
    TooManyPurchases { count: usize, max: usize },

    #[error("purchase #{index}: price must be a positive number")]
    InvalidPrice { index: usize },

    #[error("purchase #{index}: amount must be a positive number")]
    InvalidAmount { index: usize },

    #[error("multiplier must be between 2 and 4, got {value}")]
    MultiplierOutOfRange { value: u32 },

    #[error("stage count must be between 2 and 4, got {value}")]
    StagesOutOfRange { value: u32 },
}

/// Validate a plan submission against the configured form limits.
///
/// Purchase indices in error messages are 1-based, matching how the form
/// numbers its entries.
pub fn validate_request(
    request: &ExitPlanRequest,
    config: &RuntimeConfig,
) -> Result<(), ValidationError> {
    if request.purchases.is_empty() {
        return Err(ValidationError::NoPurchases);
    }

    let max = config.max_purchases;
    if request.purchases.len() > max {
        return Err(ValidationError::TooManyPurchases {
            count: request.purchases.len(),
            max,
        });
    }

    for (i, purchase) in request.purchases.iter().enumerate() {
        if !(purchase.price > 0.0 && purchase.price.is_finite()) {
            return Err(ValidationError::InvalidPrice { index: i + 1 });
        }
        if !(purchase.amount > 0.0 && purchase.amount.is_finite()) {
            return Err(ValidationError::InvalidAmount { index: i + 1 });
        }
    }

    if !(MULTIPLIER_MIN..=MULTIPLIER_MAX).contains(&request.multiplier) {
        return Err(ValidationError::MultiplierOutOfRange {
            value: request.multiplier,
        });
    }

    if !(STAGES_MIN..=STAGES_MAX).contains(&request.stages) {
        return Err(ValidationError::StagesOutOfRange {
            value: request.stages,
        });
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
