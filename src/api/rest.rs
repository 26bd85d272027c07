// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The plan-computation path (health,
// limits, exit-plan) is public: it is the contract the input form renders
// against. History, state, and config mutation require a valid Bearer token
// checked via the `AuthBearer` extractor.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::planner::{compute_exit_plan, ExitPlan};
use crate::types::{ExitPlanRequest, StageOrder};
use crate::validation::{
    validate_request, MULTIPLIER_MAX, MULTIPLIER_MIN, STAGES_MAX, STAGES_MIN,
};

/// On-disk location of the runtime config, shared with `main`.
pub const CONFIG_PATH: &str = "planner_config.json";

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/limits", get(limits))
        .route("/api/v1/exit-plan", post(exit_plan))
        // ── Authenticated ───────────────────────────────────────────
        .route("/api/v1/plans", get(plans))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/config", post(set_config))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Form limits (public)
// =============================================================================

/// Bounds and defaults the input form renders against.
#[derive(Serialize)]
struct LimitsResponse {
    min_purchases: usize,
    max_purchases: usize,
    multiplier_min: u32,
    multiplier_max: u32,
    stages_min: u32,
    stages_max: u32,
    default_multiplier: u32,
    default_stages: u32,
    price_step: f64,
    amount_step: f64,
}

async fn limits(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.runtime_config.read();
    Json(LimitsResponse {
        min_purchases: 1,
        max_purchases: config.max_purchases,
        multiplier_min: MULTIPLIER_MIN,
        multiplier_max: MULTIPLIER_MAX,
        stages_min: STAGES_MIN,
        stages_max: STAGES_MAX,
        default_multiplier: config.default_multiplier,
        default_stages: config.default_stages,
        price_step: config.price_step,
        amount_step: config.amount_step,
    })
}

// =============================================================================
// Exit plan computation (public)
// =============================================================================

#[derive(Serialize)]
struct ExitPlanResponse {
    /// Id of the recorded plan in the audit trail.
    plan_id: String,
    /// All computed result fields.
    plan: ExitPlan,
    /// The limit-order schedule paired with 1-based stage indices.
    stage_orders: Vec<StageOrder>,
}

async fn exit_plan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExitPlanRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    // Validation happens entirely before the planner runs; a failed check
    // skips computation and returns the single blocking message.
    {
        let config = state.runtime_config.read();
        if let Err(e) = validate_request(&request, &config) {
            warn!(error = %e, "exit plan request rejected");
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": e.to_string() })),
            ));
        }
    }

    // The planner is total on validated input; `None` here means the
    // validation boundary and the planner disagree.
    let plan = match compute_exit_plan(&request) {
        Some(plan) => plan,
        None => {
            error!(?request, "planner rejected a validated request");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "internal planner error" })),
            ));
        }
    };

    let stage_orders = plan.stage_orders();
    let plan_id = state.push_plan(request, plan.clone());

    info!(
        %plan_id,
        sell_price = plan.sell_price,
        stages = stage_orders.len(),
        "exit plan computed"
    );

    Ok(Json(ExitPlanResponse {
        plan_id,
        plan,
        stage_orders,
    }))
}

// =============================================================================
// Plan history (authenticated)
// =============================================================================

async fn plans(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let records = state.recent_plans.read().clone();
    Json(records)
}

// =============================================================================
// Full state snapshot (authenticated)
// =============================================================================

async fn full_state(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.build_snapshot();
    Json(snapshot)
}

// =============================================================================
// Config (authenticated)
// =============================================================================

async fn get_config(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.runtime_config.read().clone();
    Json(config)
}

#[derive(Deserialize)]
struct ConfigUpdate {
    #[serde(default)]
    max_purchases: Option<usize>,
    #[serde(default)]
    default_multiplier: Option<u32>,
    #[serde(default)]
    default_stages: Option<u32>,
    #[serde(default)]
    max_recent_plans: Option<usize>,
}

async fn set_config(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    // Reject values the form could not honour before touching the config.
    if let Some(n) = update.max_purchases {
        if n == 0 {
            return Err(bad_request("max_purchases must be at least 1"));
        }
    }
    if let Some(m) = update.default_multiplier {
        if !(MULTIPLIER_MIN..=MULTIPLIER_MAX).contains(&m) {
            return Err(bad_request("default_multiplier must be between 2 and 4"));
        }
    }
    if let Some(s) = update.default_stages {
        if !(STAGES_MIN..=STAGES_MAX).contains(&s) {
            return Err(bad_request("default_stages must be between 2 and 4"));
        }
    }
    if let Some(n) = update.max_recent_plans {
        if n == 0 {
            return Err(bad_request("max_recent_plans must be at least 1"));
        }
    }

    let mut config = state.runtime_config.write();
    let mut changes = Vec::new();

    macro_rules! apply_field {
        ($field:ident) => {
            if let Some(val) = update.$field {
                if config.$field != val {
                    changes.push(format!(
                        "{}: {} -> {}",
                        stringify!($field),
                        config.$field,
                        val
                    ));
                    config.$field = val;
                }
            }
        };
    }

    apply_field!(max_purchases);
    apply_field!(default_multiplier);
    apply_field!(default_stages);
    apply_field!(max_recent_plans);

    let config_clone = config.clone();
    drop(config);

    if !changes.is_empty() {
        info!(changes = ?changes, "runtime config updated");

        // Save to disk (best-effort).
        if let Err(e) = config_clone.save(CONFIG_PATH) {
            warn!(error = %e, "Failed to save runtime config to disk");
        }

        state.increment_version();
    }

    let mut response = serde_json::to_value(&config_clone).unwrap_or_default();
    if let Some(obj) = response.as_object_mut() {
        obj.insert(
            "changes".to_string(),
            serde_json::to_value(&changes).unwrap_or_default(),
        );
    }
    Ok(Json(response))
}

fn bad_request(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}
