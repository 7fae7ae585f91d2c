pub mod artifacts;
pub mod backends;
pub mod jobs;
