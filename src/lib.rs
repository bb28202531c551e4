pub mod cache;
pub mod cli;
pub mod config;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use generator::workflow::launch;
