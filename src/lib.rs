//! namematch library
//!
//! Approximate name matching: candidate indexes, string and name scorers,
//! and the engine that ranks scored candidate pairs. The CLI, daemon and
//! client binaries are thin layers over these modules.
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial library structure

// Core modules
pub mod engine;
pub mod index;
pub mod record;
pub mod scoring;

// Ingestion and configuration
pub mod config;
pub mod loader;
pub mod preprocess;

// Front ends
pub mod commands;
pub mod daemon;
pub mod output;

pub use config::{Config, SelectionMode};
pub use engine::{MatchEngine, MatchResult};
pub use index::{CandidateIndex, IndexKind, IndexReuse};
pub use record::{CandidatePair, Collection, Record};
pub use scoring::{NameScorer, NameScorerKind, StringScorer};
