//! Candidate Scoring Engine: weighted multi-factor scoring with fixed qualification thresholds.
//!
//! Pure and synchronous: the only non-deterministic input is the audit timestamp, which
//! callers can pin via `score_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::candidate::{EducationEntry, ResumeData};
use crate::screening::skills::normalize_skills;

pub const SKILL_WEIGHT: f64 = 0.4;
pub const EXPERIENCE_WEIGHT: f64 = 0.3;
pub const EDUCATION_WEIGHT: f64 = 0.2;
pub const QUALITY_WEIGHT: f64 = 0.1;

const QUALIFY_MIN_SKILL: f64 = 60.0;
const QUALIFY_MIN_EXPERIENCE: f64 = 50.0;
const QUALIFY_MIN_OVERALL: f64 = 60.0;

/// Degree keywords in priority order. First hit per entry wins.
const DEGREE_SCORES: &[(&str, f64)] = &[
    ("phd", 100.0),
    ("doctorate", 100.0),
    ("master", 90.0),
    ("mba", 90.0),
    ("bachelor", 75.0),
    ("associate", 60.0),
    ("diploma", 50.0),
    ("certificate", 40.0),
];
const DEFAULT_EDUCATION_SCORE: f64 = 50.0;
const BASE_QUALITY_SCORE: f64 = 50.0;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// What a requisition asks for. Skills are normalized on construction of the scorer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringRequirements {
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub min_experience: u32,
}

/// Scorer view of a candidate, derived from the extraction result.
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub skills: Vec<String>,
    pub years_of_experience: f64,
    pub education: Vec<EducationEntry>,
    pub quality_signal: Option<f64>,
    pub has_summary: bool,
    pub has_certifications: bool,
    pub language_count: usize,
    pub experience_entries: usize,
}

impl From<&ResumeData> for CandidateProfile {
    fn from(data: &ResumeData) -> Self {
        Self {
            skills: normalize_skills(&data.skills),
            years_of_experience: data.years_of_experience.max(0.0),
            education: data.education.clone(),
            quality_signal: data
                .quality_analysis
                .as_ref()
                .and_then(|q| q.overall_quality_score),
            has_summary: data
                .summary
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty()),
            has_certifications: !data.certifications.is_empty(),
            language_count: data.languages.len(),
            experience_entries: data.experience.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringBreakdown {
    pub skill_weight: String,
    pub experience_weight: String,
    pub education_weight: String,
    pub quality_weight: String,
}

impl Default for ScoringBreakdown {
    fn default() -> Self {
        Self {
            skill_weight: "40%".to_string(),
            experience_weight: "30%".to_string(),
            education_weight: "20%".to_string(),
            quality_weight: "10%".to_string(),
        }
    }
}

/// Immutable outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub overall_score: f64,
    pub skill_match_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub quality_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub is_qualified: bool,
    pub scoring_breakdown: ScoringBreakdown,
    pub evaluation_date: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

/// Holds the requirements for the lifetime of an evaluation. Never mutated after `new`.
#[derive(Debug, Clone)]
pub struct ResumeScorer {
    required_skills: Vec<String>,
    min_experience: f64,
}

impl ResumeScorer {
    pub fn new(requirements: &ScoringRequirements) -> Self {
        Self {
            required_skills: normalize_skills(&requirements.required_skills),
            min_experience: f64::from(requirements.min_experience),
        }
    }

    pub fn score(&self, resume: &ResumeData) -> ScoringResult {
        self.score_at(resume, Utc::now())
    }

    /// Scores with an explicit audit timestamp.
    pub fn score_at(&self, resume: &ResumeData, evaluated_at: DateTime<Utc>) -> ScoringResult {
        if resume.error.is_some() {
            return self.no_data_result(evaluated_at);
        }

        let profile = CandidateProfile::from(resume);

        let (skill, matched, missing) = self.skill_score(&profile.skills);
        let experience = experience_score(profile.years_of_experience, self.min_experience);
        let education = education_score(&profile.education);
        let quality = quality_score(&profile);

        let overall = SKILL_WEIGHT * skill
            + EXPERIENCE_WEIGHT * experience
            + EDUCATION_WEIGHT * education
            + QUALITY_WEIGHT * quality;

        let is_qualified = skill >= QUALIFY_MIN_SKILL
            && experience >= QUALIFY_MIN_EXPERIENCE
            && overall >= QUALIFY_MIN_OVERALL;

        ScoringResult {
            overall_score: round2(overall),
            skill_match_score: round2(skill),
            experience_score: round2(experience),
            education_score: round2(education),
            quality_score: round2(quality),
            matched_skills: matched,
            missing_skills: missing,
            is_qualified,
            scoring_breakdown: ScoringBreakdown::default(),
            evaluation_date: evaluated_at,
        }
    }

    fn no_data_result(&self, evaluated_at: DateTime<Utc>) -> ScoringResult {
        ScoringResult {
            overall_score: 0.0,
            skill_match_score: 0.0,
            experience_score: 0.0,
            education_score: 0.0,
            quality_score: 0.0,
            matched_skills: vec![],
            missing_skills: self.required_skills.clone(),
            is_qualified: false,
            scoring_breakdown: ScoringBreakdown::default(),
            evaluation_date: evaluated_at,
        }
    }

    /// Returns (score, matched, missing). Matched and missing partition the required set
    /// and keep its order.
    fn skill_score(&self, candidate_skills: &[String]) -> (f64, Vec<String>, Vec<String>) {
        if self.required_skills.is_empty() {
            return (100.0, vec![], vec![]);
        }

        let (matched, missing): (Vec<String>, Vec<String>) = self
            .required_skills
            .iter()
            .cloned()
            .partition(|required| {
                candidate_skills
                    .iter()
                    .any(|c| c.contains(required.as_str()) || required.contains(c.as_str()))
            });

        let score = matched.len() as f64 / self.required_skills.len() as f64 * 100.0;
        (score, matched, missing)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-scores
// ────────────────────────────────────────────────────────────────────────────

/// Piecewise experience score against a minimum of `min` years.
pub fn experience_score(years: f64, min: f64) -> f64 {
    if min <= 0.0 {
        return 100.0;
    }
    let years = years.max(0.0);
    let score = if years >= min * 1.5 {
        100.0
    } else if years >= min {
        80.0 + (years - min) / min * 20.0
    } else if years >= min * 0.75 {
        60.0
    } else if years >= min * 0.5 {
        40.0
    } else {
        years / min * 50.0
    };
    score.clamp(0.0, 100.0)
}

/// Highest degree keyword hit across all entries; 50 when nothing matches.
pub fn education_score(education: &[EducationEntry]) -> f64 {
    let best = education
        .iter()
        .filter_map(|entry| {
            let degree = entry.degree.to_lowercase();
            DEGREE_SCORES
                .iter()
                .find(|(keyword, _)| degree.contains(keyword))
                .map(|(_, score)| *score)
        })
        .fold(0.0_f64, f64::max);

    if best > 0.0 {
        best
    } else {
        DEFAULT_EDUCATION_SCORE
    }
}

/// Supplied quality value when present, otherwise the completeness heuristic.
pub fn quality_score(profile: &CandidateProfile) -> f64 {
    if let Some(supplied) = profile.quality_signal {
        return supplied.clamp(0.0, 100.0);
    }

    let bonuses = [
        profile.has_summary,
        profile.has_certifications,
        profile.language_count > 1,
        profile.experience_entries >= 2,
        !profile.education.is_empty(),
    ];
    let score = BASE_QUALITY_SCORE + 10.0 * bonuses.iter().filter(|b| **b).count() as f64;
    score.min(100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{ExperienceEntry, QualityAnalysis};

    fn requirements(skills: &[&str], min_experience: u32) -> ScoringRequirements {
        ScoringRequirements {
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            min_experience,
        }
    }

    fn resume(skills: &[&str], years: f64) -> ResumeData {
        ResumeData {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            years_of_experience: years,
            ..ResumeData::default()
        }
    }

    fn degree(text: &str) -> EducationEntry {
        EducationEntry {
            degree: text.to_string(),
            ..EducationEntry::default()
        }
    }

    fn with_quality(mut data: ResumeData, score: f64) -> ResumeData {
        data.quality_analysis = Some(QualityAnalysis {
            overall_quality_score: Some(score),
            ..QualityAnalysis::fallback()
        });
        data
    }

    #[test]
    fn test_qualification_example() {
        let scorer = ResumeScorer::new(&requirements(&["python", "sql"], 3));
        let mut data = resume(&["Python", "SQL", "AWS"], 4.0);
        data.education = vec![degree("Bachelor of Science")];
        let data = with_quality(data, 80.0);

        let result = scorer.score(&data);
        assert_eq!(result.skill_match_score, 100.0);
        assert_eq!(result.experience_score, 86.67);
        assert_eq!(result.education_score, 75.0);
        assert_eq!(result.quality_score, 80.0);
        assert_eq!(result.overall_score, 89.0);
        assert!(result.is_qualified);
        assert_eq!(result.matched_skills, vec!["python", "sql"]);
        assert!(result.missing_skills.is_empty());
    }

    #[test]
    fn test_upstream_error_yields_zero_result() {
        let scorer = ResumeScorer::new(&requirements(&["Rust", "Go"], 2));
        let result = scorer.score(&ResumeData::failed("Unable to extract text from PDF"));
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.skill_match_score, 0.0);
        assert_eq!(result.experience_score, 0.0);
        assert_eq!(result.education_score, 0.0);
        assert_eq!(result.quality_score, 0.0);
        assert!(result.matched_skills.is_empty());
        assert_eq!(result.missing_skills, vec!["rust", "go"]);
        assert!(!result.is_qualified);
    }

    #[test]
    fn test_empty_requirements_score_full_with_empty_lists() {
        let scorer = ResumeScorer::new(&requirements(&[], 0));
        let result = scorer.score(&resume(&["cobol"], 0.0));
        assert_eq!(result.skill_match_score, 100.0);
        assert!(result.matched_skills.is_empty());
        assert!(result.missing_skills.is_empty());
    }

    #[test]
    fn test_matched_and_missing_partition_required_set() {
        let required = ["python", "machine learning", "sql", "docker", "kubernetes"];
        let candidate_sets: [&[&str]; 5] = [
            &[],
            &["Python 3"],
            &["ml", "learning", "SQL Server"],
            &["docker", "kubernetes", "python", "sql", "machine learning"],
            &["k8s", "terraform"],
        ];
        let scorer = ResumeScorer::new(&requirements(&required, 0));

        for candidate in candidate_sets {
            let result = scorer.score(&resume(candidate, 0.0));
            let mut union: Vec<String> = result
                .matched_skills
                .iter()
                .chain(result.missing_skills.iter())
                .cloned()
                .collect();
            union.sort();
            let mut expected: Vec<String> = required.iter().map(|s| s.to_string()).collect();
            expected.sort();
            assert_eq!(union, expected, "candidate {candidate:?}");
            assert!(result
                .matched_skills
                .iter()
                .all(|m| !result.missing_skills.contains(m)));
        }
    }

    #[test]
    fn test_substring_match_works_both_directions() {
        let scorer = ResumeScorer::new(&requirements(&["sql", "machine learning"], 0));
        // "postgresql" contains "sql"; "learning" is contained in "machine learning"
        let result = scorer.score(&resume(&["PostgreSQL", "learning"], 0.0));
        assert_eq!(result.matched_skills, vec!["sql", "machine learning"]);
    }

    #[test]
    fn test_matched_lists_preserve_required_order() {
        let scorer = ResumeScorer::new(&requirements(&["go", "rust", "java", "c"], 0));
        let result = scorer.score(&resume(&["rust", "go"], 0.0));
        assert_eq!(result.matched_skills, vec!["go", "rust"]);
        assert_eq!(result.missing_skills, vec!["java", "c"]);
    }

    #[test]
    fn test_adding_matching_skill_never_lowers_skill_score() {
        let scorer = ResumeScorer::new(&requirements(&["rust", "python", "sql"], 0));
        let mut skills: Vec<&str> = vec![];
        let mut previous = scorer.score(&resume(&skills, 0.0)).skill_match_score;
        for added in ["rust", "python", "sql"] {
            skills.push(added);
            let current = scorer.score(&resume(&skills, 0.0)).skill_match_score;
            assert!(current > previous, "{current} should exceed {previous}");
            previous = current;
        }
        skills.push("rust");
        assert_eq!(scorer.score(&resume(&skills, 0.0)).skill_match_score, 100.0);
    }

    #[test]
    fn test_experience_boundaries_at_ten_years() {
        assert_eq!(experience_score(15.0, 10.0), 100.0);
        assert_eq!(experience_score(10.0, 10.0), 80.0);
        assert_eq!(experience_score(7.5, 10.0), 60.0);
        assert_eq!(experience_score(5.0, 10.0), 40.0);
        assert_eq!(experience_score(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_experience_interpolates_between_min_and_one_and_half() {
        assert!((experience_score(12.0, 10.0) - 84.0).abs() < 1e-9);
        assert!((experience_score(2.0, 10.0) - 10.0).abs() < 1e-9);
        assert_eq!(experience_score(0.0, 0.0), 100.0);
    }

    #[test]
    fn test_education_takes_highest_degree() {
        let entries = vec![
            degree("Certificate in Project Management"),
            degree("Master of Business Administration"),
            degree("BACHELOR of Arts"),
        ];
        assert_eq!(education_score(&entries), 90.0);
        assert_eq!(education_score(&[degree("PhD, Physics")]), 100.0);
        assert_eq!(education_score(&[degree("Associate Degree")]), 60.0);
    }

    #[test]
    fn test_education_defaults_to_fifty() {
        assert_eq!(education_score(&[]), 50.0);
        assert_eq!(education_score(&[degree("Bootcamp")]), 50.0);
    }

    #[test]
    fn test_quality_heuristic_without_supplied_score() {
        let mut data = resume(&[], 0.0);
        data.summary = Some("Backend engineer".to_string());
        data.certifications = vec!["CKA".to_string()];
        data.languages = vec!["English".to_string(), "Korean".to_string()];
        data.experience = vec![ExperienceEntry::default(), ExperienceEntry::default()];
        data.education = vec![degree("BSc")];
        assert_eq!(quality_score(&CandidateProfile::from(&data)), 100.0);

        let sparse = resume(&[], 0.0);
        assert_eq!(quality_score(&CandidateProfile::from(&sparse)), 50.0);
    }

    #[test]
    fn test_supplied_quality_is_clamped() {
        let data = with_quality(resume(&[], 0.0), 140.0);
        assert_eq!(quality_score(&CandidateProfile::from(&data)), 100.0);
    }

    #[test]
    fn test_low_experience_blocks_qualification() {
        let scorer = ResumeScorer::new(&requirements(&["rust"], 10));
        let result = scorer.score(&with_quality(resume(&["rust"], 4.0), 100.0));
        // 4 < 0.5 * 10 → 20
        assert_eq!(result.experience_score, 20.0);
        assert!(!result.is_qualified);
    }

    #[test]
    fn test_scores_stay_within_bounds() {
        let scorer = ResumeScorer::new(&requirements(&["a", "b"], 5));
        for years in [0.0, 1.0, 2.5, 3.75, 5.0, 7.4, 7.5, 50.0] {
            let result = scorer.score(&resume(&["a"], years));
            for score in [
                result.overall_score,
                result.skill_match_score,
                result.experience_score,
                result.education_score,
                result.quality_score,
            ] {
                assert!((0.0..=100.0).contains(&score), "{score} out of range");
            }
        }
    }

    #[test]
    fn test_result_serializes_with_public_field_names() {
        let scorer = ResumeScorer::new(&requirements(&["rust"], 0));
        let json = serde_json::to_value(scorer.score(&resume(&["rust"], 1.0))).unwrap();
        for field in [
            "overall_score",
            "skill_match_score",
            "experience_score",
            "education_score",
            "quality_score",
            "matched_skills",
            "missing_skills",
            "is_qualified",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["scoring_breakdown"]["skill_weight"], "40%");
    }
}
