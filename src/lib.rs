pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod optimizer;
pub mod parallel;
