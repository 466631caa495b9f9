pub mod cargo_execution;
pub mod project_scanner;

pub use project_scanner::ProjectScannerAgent;
