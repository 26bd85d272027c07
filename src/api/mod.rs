// =============================================================================
// HTTP API — REST surface of the exit planner
// =============================================================================

pub mod auth;
pub mod rest;
