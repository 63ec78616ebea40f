mod walk;

pub use walk::{candidates, compile_ignore_patterns, has_candidate_extension};
