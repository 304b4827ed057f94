//! Ordered fallback attempts and their execution.

mod attempts;
mod quality;
mod sequencer;

pub use attempts::{build_attempts, Attempt, AttemptKind};
pub use quality::{InvalidQuality, Quality};
pub use sequencer::{SequenceOutcome, StrategySequencer};
