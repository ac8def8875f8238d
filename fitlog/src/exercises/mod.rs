//! Exercise-name view served to fitlog clients.

pub mod cache;
pub mod source;

pub use cache::{CacheLookup, CacheStats, ExerciseNameCache};
pub use source::ExerciseSource;
