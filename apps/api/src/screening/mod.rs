// Resume screening: text extraction, structured extraction, deterministic scoring.

pub mod extractor;
pub mod handlers;
pub mod prompts;
pub mod scorer;
pub mod skills;
