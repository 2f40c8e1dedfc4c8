//! Axum route handlers for the Onboarding API.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::onboarding::{OnboardingPlan, OnboardingRequest};
use crate::state::AppState;

const MAX_FIELD_CHARS: usize = 100;
const MAX_BACKGROUND_CHARS: usize = 1000;

#[derive(Debug, Serialize)]
pub struct OnboardingResponse {
    pub plan_id: Uuid,
    pub plan: OnboardingPlan,
}

/// POST /onboarding/generate
///
/// Generates a plan (falling back to the standard plan when the model is unusable)
/// and stores it.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<OnboardingRequest>,
) -> Result<Json<OnboardingResponse>, AppError> {
    let start = validate(&request)?;

    let plan = state.onboarding.generate(&request, start).await;
    let plan_id = state.store.save_onboarding_plan(&plan).await?;

    info!(
        "Onboarding plan {} for {} ({:?}, {} days)",
        plan_id,
        plan.employee_name,
        plan.generation_method,
        plan.days.len()
    );
    Ok(Json(OnboardingResponse { plan_id, plan }))
}

/// Checks field lengths and returns the parsed start date.
fn validate(request: &OnboardingRequest) -> Result<NaiveDate, AppError> {
    for (field, value) in [
        ("employee_name", &request.employee_name),
        ("role", &request.role),
        ("department", &request.department),
    ] {
        let len = value.trim().chars().count();
        if len == 0 || len > MAX_FIELD_CHARS {
            return Err(AppError::Validation(format!(
                "{field} must be between 1 and {MAX_FIELD_CHARS} characters"
            )));
        }
    }
    if request.employee_background.chars().count() > MAX_BACKGROUND_CHARS {
        return Err(AppError::Validation(format!(
            "employee_background must be at most {MAX_BACKGROUND_CHARS} characters"
        )));
    }

    NaiveDate::parse_from_str(request.start_date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format. Use YYYY-MM-DD".to_string()))
}
