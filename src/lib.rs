pub mod api;
pub mod artifacts;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod global;
pub mod interview;
pub mod llm;
pub mod meet;
pub mod session;
pub mod speech;
pub mod transcribe;
