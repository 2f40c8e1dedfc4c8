// Onboarding: day-by-day plans for new hires, generated through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
