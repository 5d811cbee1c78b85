pub mod reporter;
pub mod sender;

pub use reporter::{ProgressError, ProgressReporter, SPINNER_FRAMES, TICK_INTERVAL};
pub use sender::ProgressSender;
