//! Domain layer of Shellmate: selection tracking, context views, command
//! extraction and safety classification, plus the contracts the host
//! application implements.

pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod selection;
pub mod terminal;

// Re-export common error type
pub use error::{Result, ShellmateError};
