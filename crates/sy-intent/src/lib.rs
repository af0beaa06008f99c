//! Intent detection for switchyard.
//!
//! - `classify` picks a domain from ordered signal groups
//! - `PatternExtractor` runs deterministic per-domain templates
//! - `ModelExtractor` asks a language model for the same structure
//! - `resolve` reconciles the two
//! - `KeywordDetector` ties them together for handlers

pub mod classifier;
pub mod consensus;
pub mod detector;
pub mod model;
pub mod patterns;
pub mod prompts;

pub use classifier::classify;
pub use consensus::{ConsensusPolicy, DISAGREEMENT_PENALTY, TRUST_THRESHOLD, resolve};
pub use detector::KeywordDetector;
pub use model::ModelExtractor;
pub use patterns::{DEFAULT_ORGANIZATION, PatternExtractor, PatternSettings};
