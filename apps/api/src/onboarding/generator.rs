//! Onboarding Plan Generator: a day-by-day schedule for a new hire's first two weeks.
//!
//! The model drafts the plan through the tolerant JSON seam. Any unusable reply degrades
//! to a one-day standard plan, so generation itself never fails.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm_client::prompts::{fill_template, JSON_ONLY_SYSTEM};
use crate::llm_client::{complete_json, GenerationParams, TextGenerator};
use crate::models::onboarding::{
    Activity, DayPlan, GenerationMethod, Milestone, OnboardingPlan, OnboardingRequest, PlanDraft,
};
use crate::onboarding::prompts::{DEFAULT_BACKGROUND, ONBOARDING_PLAN_PROMPT};

pub const WORKING_DAYS: u32 = 10;

/// Day numbers past this are clamped when computing calendar dates.
const MAX_DAY_OFFSET: u32 = 366;

const PLAN_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.4,
    max_tokens: 4096,
};

#[derive(Clone)]
pub struct OnboardingPlanner {
    llm: Arc<dyn TextGenerator>,
}

impl OnboardingPlanner {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, request: &OnboardingRequest, start: NaiveDate) -> OnboardingPlan {
        let background = match request.employee_background.trim() {
            "" => DEFAULT_BACKGROUND,
            text => text,
        };
        let start_date = start.format("%Y-%m-%d").to_string();
        let working_days = WORKING_DAYS.to_string();
        let prompt = fill_template(
            ONBOARDING_PLAN_PROMPT,
            &[
                ("employee_name", request.employee_name.as_str()),
                ("role", request.role.as_str()),
                ("department", request.department.as_str()),
                ("start_date", start_date.as_str()),
                ("background", background),
                ("working_days", working_days.as_str()),
            ],
        );

        match complete_json::<PlanDraft>(self.llm.as_ref(), &prompt, JSON_ONLY_SYSTEM, PLAN_PARAMS).await {
            Ok(draft) if !draft.days.is_empty() => {
                info!(
                    "Generated onboarding plan for {} ({} days)",
                    request.employee_name,
                    draft.days.len()
                );
                build_plan(request, start, draft, GenerationMethod::Llm)
            }
            Ok(_) => {
                warn!("Onboarding plan had no days, using fallback");
                fallback_plan(request, start)
            }
            Err(e) => {
                warn!("Onboarding plan generation failed, using fallback: {e}");
                fallback_plan(request, start)
            }
        }
    }
}

/// Standard one-day plan used when the model output is unusable.
pub fn fallback_plan(request: &OnboardingRequest, start: NaiveDate) -> OnboardingPlan {
    let draft = PlanDraft {
        overview: format!("Standard onboarding plan for {}", request.role),
        days: vec![DayPlan {
            day: 1,
            date: None,
            day_of_week: None,
            theme: "Welcome & Setup".to_string(),
            activities: vec![Activity {
                time: "9:00 AM".to_string(),
                activity: "Welcome & Orientation".to_string(),
                duration: "2 hours".to_string(),
                description: "Company introduction".to_string(),
                owner: "HR".to_string(),
            }],
            goals: vec!["Complete orientation".to_string()],
            deliverables: vec!["Signed documents".to_string()],
        }],
        milestones: vec![Milestone {
            week: 1,
            milestone: "Complete setup".to_string(),
            success_criteria: vec!["Access granted".to_string()],
        }],
        resources: vec!["Employee handbook".to_string()],
    };
    build_plan(request, start, draft, GenerationMethod::Fallback)
}

fn build_plan(
    request: &OnboardingRequest,
    start: NaiveDate,
    draft: PlanDraft,
    method: GenerationMethod,
) -> OnboardingPlan {
    let mut days = draft.days;
    for day in &mut days {
        let date = working_day(start, day.day.saturating_sub(1));
        day.date = Some(date);
        day.day_of_week = Some(date.format("%A").to_string());
    }

    OnboardingPlan {
        id: Uuid::new_v4(),
        employee_name: request.employee_name.trim().to_string(),
        role: request.role.trim().to_string(),
        department: request.department.trim().to_string(),
        start_date: start,
        overview: draft.overview,
        days,
        milestones: draft.milestones,
        resources: draft.resources,
        generation_method: method,
        created_at: Utc::now(),
    }
}

/// The date `offset` working days after `start`, skipping Saturdays and Sundays.
/// Offset 0 is `start` itself, whatever weekday it falls on.
pub fn working_day(start: NaiveDate, offset: u32) -> NaiveDate {
    let mut date = start;
    let mut counted = 0;
    while counted < offset.min(MAX_DAY_OFFSET) {
        let Some(next) = date.succ_opt() else {
            break;
        };
        date = next;
        if date.weekday().number_from_monday() <= 5 {
            counted += 1;
        }
    }
    date
}
