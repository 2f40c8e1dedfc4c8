use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingRequest {
    pub employee_name: String,
    pub role: String,
    pub department: String,
    /// `YYYY-MM-DD`.
    pub start_date: String,
    #[serde(default)]
    pub employee_background: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub time: String,
    pub activity: String,
    pub duration: String,
    pub description: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    /// Filled in from the start date, skipping weekends.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub day_of_week: Option<String>,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Milestone {
    pub week: u32,
    pub milestone: String,
    pub success_criteria: Vec<String>,
}

/// What the model is asked to produce. `days` is required; a reply without it is unusable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanDraft {
    #[serde(default)]
    pub overview: String,
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Llm,
    Fallback,
}

impl GenerationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMethod::Llm => "llm",
            GenerationMethod::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingPlan {
    pub id: Uuid,
    pub employee_name: String,
    pub role: String,
    pub department: String,
    pub start_date: NaiveDate,
    pub overview: String,
    pub days: Vec<DayPlan>,
    pub milestones: Vec<Milestone>,
    pub resources: Vec<String>,
    pub generation_method: GenerationMethod,
    pub created_at: DateTime<Utc>,
}
