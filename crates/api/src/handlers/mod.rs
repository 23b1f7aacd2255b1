pub mod delivery;
pub mod jobs;
