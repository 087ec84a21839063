use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::agent::{PatternCategory, PatternSnapshot};
use crate::observability::metrics;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("unknown pattern category: {0}")]
    UnknownCategory(String),

    #[error("pattern must not be empty")]
    EmptyPattern,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match self {
            AdminError::UnknownCategory(_) => StatusCode::NOT_FOUND,
            AdminError::EmptyPattern => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

fn parse_category(raw: &str) -> Result<PatternCategory, AdminError> {
    raw.parse()
        .map_err(|_| AdminError::UnknownCategory(raw.to_string()))
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub automation_patterns: usize,
    pub crawler_patterns: usize,
    pub browser_patterns: usize,
}

#[derive(Debug, Deserialize)]
pub struct PatternRequest {
    pub pattern: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PatternAdded {
    pub category: PatternCategory,
    pub pattern: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PatternRemoved {
    pub removed: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        automation_patterns: state.registry.len(PatternCategory::Automation),
        crawler_patterns: state.registry.len(PatternCategory::Crawler),
        browser_patterns: state.registry.len(PatternCategory::Browser),
    })
}

pub async fn list_all(State(state): State<AdminState>) -> Json<PatternSnapshot> {
    Json(state.registry.snapshot_all())
}

pub async fn list_category(
    State(state): State<AdminState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<String>>, AdminError> {
    let category = parse_category(&category)?;
    Ok(Json(state.registry.snapshot(category)))
}

pub async fn add_pattern(
    State(state): State<AdminState>,
    Path(category): Path<String>,
    Json(body): Json<PatternRequest>,
) -> Result<(StatusCode, Json<PatternAdded>), AdminError> {
    let category = parse_category(&category)?;
    if body.pattern.trim().is_empty() {
        return Err(AdminError::EmptyPattern);
    }

    // Admin additions are permanent until removed by value.
    let handle = state.registry.add(category, &body.pattern);
    metrics::record_pattern_change(category.as_str(), "add");
    tracing::info!(
        category = %category,
        pattern = %handle.pattern(),
        "Pattern added via admin API"
    );

    Ok((
        StatusCode::CREATED,
        Json(PatternAdded {
            category,
            pattern: handle.pattern().to_string(),
        }),
    ))
}

pub async fn remove_pattern(
    State(state): State<AdminState>,
    Path(category): Path<String>,
    Json(body): Json<PatternRequest>,
) -> Result<Json<PatternRemoved>, AdminError> {
    let category = parse_category(&category)?;
    if body.pattern.is_empty() {
        return Err(AdminError::EmptyPattern);
    }

    let removed = state.registry.remove(category, &body.pattern);
    if removed {
        metrics::record_pattern_change(category.as_str(), "remove");
        tracing::info!(
            category = %category,
            pattern = %body.pattern,
            "Pattern removed via admin API"
        );
    }

    Ok(Json(PatternRemoved { removed }))
}
