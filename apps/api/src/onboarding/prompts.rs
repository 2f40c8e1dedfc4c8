// Onboarding LLM prompt templates.

pub const ONBOARDING_PLAN_PROMPT: &str = r#"Create a comprehensive 2-week onboarding plan for a new employee.

Employee Details:
- Name: {employee_name}
- Role: {role}
- Department: {department}
- Start Date: {start_date}
- Background: {background}

Generate a day-by-day schedule for {working_days} working days.

Return as JSON:
{
  "overview": "Brief overview (2-3 sentences)",
  "days": [
    {
      "day": 1,
      "theme": "Welcome & Orientation",
      "activities": [
        {
          "time": "9:00 AM",
          "activity": "Welcome meeting",
          "duration": "1 hour",
          "description": "Introduction to company",
          "owner": "HR Manager"
        }
      ],
      "goals": ["Goal 1", "Goal 2"],
      "deliverables": ["Deliverable 1"]
    }
  ],
  "milestones": [
    {
      "week": 1,
      "milestone": "Complete orientation",
      "success_criteria": ["Criteria 1"]
    }
  ],
  "resources": ["Resource 1", "Resource 2"]
}

Return ONLY valid JSON."#;

/// Used when the request carries no background.
pub const DEFAULT_BACKGROUND: &str = "General background";
