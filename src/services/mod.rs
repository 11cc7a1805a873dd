pub mod analysis;
pub mod correlation;
pub mod extract;
pub mod selector;
pub mod synthesis;
pub mod trigger;

pub use analysis::{AnalysisOutcome, GameAnalyzer};
pub use correlation::{CorrelationOutcome, CorrelationStage};
pub use selector::select_games;
pub use synthesis::{ProfileSynthesizer, SynthesisOutcome};
pub use trigger::{Dispatch, TriggerCoordinator};
