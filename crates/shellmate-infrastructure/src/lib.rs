//! Infrastructure layer for Shellmate: filesystem paths, configuration
//! persistence and logging setup.

pub mod config_service;
pub mod logging;
pub mod paths;

pub use config_service::ConfigService;
pub use logging::init_logging;
pub use paths::ShellmatePaths;
