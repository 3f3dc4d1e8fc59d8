pub mod analysis;
pub mod codec;
pub mod commands;
pub mod error;
pub mod models;

pub use commands::run::{run, run_with_history};
pub use commands::settings::{HistoryBackend, Mode, RunSettings};
pub use error::FileTimesError;
pub use models::report::RunOutcome;
