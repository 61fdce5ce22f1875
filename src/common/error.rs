use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("Obstacle {id} at ({x}, {y}) is outside the arena grid")]
    ObstacleOutOfArena { id: u32, x: i64, y: i64 },

    #[error("Obstacle {id} appears more than once in the layout")]
    DuplicateObstacle { id: u32 },

    #[error("Unknown obstacle: {id}")]
    UnknownObstacle { id: u32 },

    #[error("Too many obstacles for exhaustive tour search: {count} (max {max})")]
    TooManyObstacles { count: usize, max: usize },

    #[error("Replanning after marker at obstacle {obstacle_id} failed: {reason}")]
    ReplanFailed { obstacle_id: u32, reason: String },

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Event log error: {0}")]
    EventLog(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
