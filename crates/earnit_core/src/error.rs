use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("task_not_found - {0}")]
    TaskNotFound(String),
    #[error("task_already_complete - {0}")]
    TaskAlreadyComplete(String),
    #[error("storage_corrupt - {0}")]
    StorageCorrupt(String),
    #[error("io_error - {0}")]
    Io(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn task_not_found<M: Into<String>>(id: M) -> Self {
        Self::TaskNotFound(id.into())
    }

    pub fn task_already_complete<M: Into<String>>(id: M) -> Self {
        Self::TaskAlreadyComplete(id.into())
    }

    pub fn storage_corrupt<M: Into<String>>(message: M) -> Self {
        Self::StorageCorrupt(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::TaskNotFound(_) => "task_not_found",
            Self::TaskAlreadyComplete(_) => "task_already_complete",
            Self::StorageCorrupt(_) => "storage_corrupt",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::TaskNotFound(message)
            | Self::TaskAlreadyComplete(message)
            | Self::StorageCorrupt(message)
            | Self::Io(message) => message,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}
