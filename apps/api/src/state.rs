use std::sync::Arc;

use crate::config::Config;
use crate::onboarding::generator::OnboardingPlanner;
use crate::policy::assistant::PolicyAssistant;
use crate::screening::extractor::ResumeExtractor;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Resume text + structured extraction, backed by the shared `TextGenerator`.
    pub extractor: ResumeExtractor,
    pub onboarding: OnboardingPlanner,
    pub policy: Arc<PolicyAssistant>,
    /// Postgres + S3 in production, in-memory in tests.
    pub store: Arc<dyn RecordStore>,
}
