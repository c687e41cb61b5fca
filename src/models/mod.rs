pub mod artifact;
pub mod generation;
pub mod job;
