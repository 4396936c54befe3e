pub mod args;
pub mod config;
pub mod errors;
pub mod loader;
pub mod reconciler;
pub mod report;
