// Resume screening LLM prompt templates.

pub const RESUME_EXTRACT_PROMPT: &str = r#"Extract information from this resume as JSON:

{
  "name": "Full name",
  "email": "email@example.com",
  "phone": "phone number",
  "location": "City, Country",
  "summary": "Professional summary",
  "skills": ["skill1", "skill2"],
  "experience": [
    {"company": "Company", "title": "Title", "duration": "2020-2023", "responsibilities": ["resp1"]}
  ],
  "education": [
    {"degree": "Degree", "institution": "University", "year": "2020"}
  ],
  "certifications": ["cert1"],
  "years_of_experience": 0,
  "languages": ["English"]
}

Resume:
{resume_text}

Return ONLY valid JSON."#;

pub const RESUME_QUALITY_PROMPT: &str = r#"Rate this resume as JSON:

{
  "overall_quality_score": 75,
  "strengths": ["strength1", "strength2"],
  "areas_for_improvement": ["area1"],
  "keyword_optimization": ["tip1"],
  "presentation_score": 80
}

Name: {name}
Skills: {skills}
Experience: {years} years

Return ONLY JSON."#;
