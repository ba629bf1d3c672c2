pub mod aggregator;
pub mod classifier;
pub mod corpus;
pub mod executable_utils;
pub mod matcher;
pub mod model;
pub mod patterns;
pub mod reports;
pub mod scorers;
