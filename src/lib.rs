pub mod app;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod hamsa;
pub mod handler;
pub mod llm;
pub mod utils;
pub mod version;
