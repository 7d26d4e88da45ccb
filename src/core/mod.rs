pub mod assistant;
pub mod config;
pub mod diff;
pub mod parser;
pub mod prompt;
pub mod schemas;
pub mod style;
