pub mod known_frauds;
pub mod samples;
