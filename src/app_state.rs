// =============================================================================
// Central Application State — Borealis Exit Planner
// =============================================================================
//
// Shared state for the API handlers: the runtime configuration and an
// in-memory audit trail of recently computed plans. The planner itself never
// touches this state — computation stays pure and reads only its arguments.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the mutable shared collections.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::planner::ExitPlan;
use crate::runtime_config::RuntimeConfig;
use crate::types::ExitPlanRequest;

// =============================================================================
// Plan Record
// =============================================================================

/// One computed plan in the audit trail: the submission and its result.
///
/// Records live only in memory and are lost on restart; inputs are never
/// persisted across sessions.
#[derive(Debug, Clone, Serialize)]
pub struct PlanRecord {
    /// Unique id for referencing this record from the dashboard.
    pub id: String,
    /// ISO 8601 timestamp of when the plan was computed.
    pub at: String,
    /// The validated submission.
    pub request: ExitPlanRequest,
    /// The computed plan.
    pub plan: ExitPlan,
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across handlers via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation. Lets dashboard clients detect changes.
    pub state_version: AtomicU64,

    /// Runtime configuration (form limits, defaults, history cap).
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// Ring buffer of recently computed plans, newest last. Capped at the
    /// configured `max_recent_plans`.
    pub recent_plans: RwLock<Vec<PlanRecord>>,

    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration.
    /// The returned value is typically wrapped in `Arc` immediately.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            recent_plans: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version. Call this after every
    /// meaningful mutation.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Plan Audit Trail ────────────────────────────────────────────────

    /// Record a computed plan and return the record's id. The ring buffer is
    /// capped at the configured `max_recent_plans`; oldest entries are
    /// evicted when the limit is reached.
    pub fn push_plan(&self, request: ExitPlanRequest, plan: ExitPlan) -> String {
        let record = PlanRecord {
            id: Uuid::new_v4().to_string(),
            at: Utc::now().to_rfc3339(),
            request,
            plan,
        };
        let id = record.id.clone();

        let cap = self.runtime_config.read().max_recent_plans;
        let mut plans = self.recent_plans.write();
        plans.push(record);
        while plans.len() > cap {
            plans.remove(0);
        }
        drop(plans);

        self.increment_version();
        id
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build a complete, serialisable snapshot of the service state for the
    /// REST `GET /api/v1/state` endpoint.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let config = self.runtime_config.read().clone();
        let recent_plans = self.recent_plans.read().clone();

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            plans_computed: recent_plans.len(),
            runtime_config: config,
            recent_plans,
        }
    }
}

// =============================================================================
// Serialisable snapshot types
// =============================================================================

/// Full service state snapshot sent to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_secs: u64,
    /// Number of plans currently retained (not a lifetime total).
    pub plans_computed: usize,
    pub runtime_config: RuntimeConfig,
    pub recent_plans: Vec<PlanRecord>,
}

// =============================================================================
// Tests
// =============================================================================
