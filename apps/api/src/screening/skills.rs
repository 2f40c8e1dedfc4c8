//! Skill Normalizer: case and whitespace normalization for skill strings.

use std::collections::HashSet;

/// Lowercases, trims and collapses internal whitespace runs to a single space.
pub fn normalize_skill(skill: &str) -> String {
    skill
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes every skill, drops empties and dedupes keeping first-seen order.
pub fn normalize_skills<S: AsRef<str>>(skills: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .map(|s| normalize_skill(s.as_ref()))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Splits a comma-separated form field ("python, SQL ,aws") into normalized skills.
pub fn parse_skill_list(raw: &str) -> Vec<String> {
    let parts: Vec<&str> = raw.split(',').collect();
    normalize_skills(&parts)
}
