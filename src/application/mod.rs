pub mod pipeline;
pub mod status;

pub use pipeline::{DispatchSummary, ReviewPipeline};
pub use status::{GameStatus, PlayerStatus, StatusReader};
