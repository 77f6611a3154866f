//! 1-800-Bizarre Engine library.
//!
//! Orchestrates the character rules in `bizarre-domain` against storage.
//!
//! ## Structure
//!
//! - `use_cases/` - Character progression orchestration
//! - `infrastructure/` - Ports, in-memory adapters, clock and settings
//! - `telemetry` - Tracing subscriber setup

pub mod infrastructure;
pub mod telemetry;
pub mod use_cases;

pub use infrastructure::settings::{EngineSettings, SettingsError};
pub use use_cases::{CharacterProgressionError, CharacterProgressionUseCases};
