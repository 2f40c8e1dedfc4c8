pub mod candidate;
pub mod onboarding;
pub mod policy;
