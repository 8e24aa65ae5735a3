pub mod duration;
pub mod progress;

// Trait-based abstractions for testability
pub mod destination;

// Re-export commonly used types and traits (used by test crate)
pub use destination::{DestinationClient, DestinationProvider, RetentionRunner};
pub use duration::format_duration_ms;
pub use progress::{ProgressSink, ProgressTracker, RateMeter};
