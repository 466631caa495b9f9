use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChoresError {
    #[error("`{command}` exited with status {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("Failed to run command: {0}")]
    CommandSpawn(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChoresError {
    /// Process exit code for this error. A failing child propagates its own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChoresError::CommandFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChoresError>;
