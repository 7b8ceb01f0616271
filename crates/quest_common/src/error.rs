//! Error types for Questline.

use crate::gates::Feature;
use crate::types::{BlueprintStatus, Difficulty};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("habit {0} is missing its interval")]
    HabitMissingInterval(i64),

    #[error("feature '{feature}' unlocks at level {required_level}")]
    Gate { feature: Feature, required_level: u32 },

    #[error("difficulty {difficulty} requires level {required_level} (currently {current_level})")]
    DifficultyGate {
        difficulty: Difficulty,
        required_level: u32,
        current_level: u32,
    },

    #[error("subtask depth {requested} exceeds max depth {max} at level {level}")]
    SubtaskDepth { requested: u32, max: u32, level: u32 },

    #[error("too many active tasks (limit {limit})")]
    Capacity { limit: usize },

    #[error("task {0} not found")]
    TaskNotFound(i64),

    #[error("unknown blueprint: {0}")]
    BlueprintNotFound(String),

    #[error("task {0} is already done")]
    AlreadyDone(i64),

    #[error("task {0} is not a leaf task")]
    NotLeaf(i64),

    #[error("project {0} is still planning; add a child task first")]
    ProjectPlanning(i64),

    #[error("project {0} has unfinished tasks")]
    ProjectUnfinished(i64),

    #[error("task {0} has no completion to restore")]
    NoCompletions(i64),

    #[error("cannot set difficulty on project {0}")]
    ProjectDifficulty(i64),

    #[error("blueprint {code} is not available (status={status})")]
    BlueprintNotAvailable { code: String, status: BlueprintStatus },

    #[error("task {0} parent chain too deep (cycle?)")]
    ParentChainTooDeep(i64),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error classification for callers rendering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Gate,
    Capacity,
    NotFound,
    State,
    Config,
    Storage,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) | EngineError::HabitMissingInterval(_) => {
                ErrorKind::Validation
            }
            EngineError::Gate { .. }
            | EngineError::DifficultyGate { .. }
            | EngineError::SubtaskDepth { .. } => ErrorKind::Gate,
            EngineError::Capacity { .. } => ErrorKind::Capacity,
            EngineError::TaskNotFound(_) | EngineError::BlueprintNotFound(_) => {
                ErrorKind::NotFound
            }
            EngineError::AlreadyDone(_)
            | EngineError::NotLeaf(_)
            | EngineError::ProjectPlanning(_)
            | EngineError::ProjectUnfinished(_)
            | EngineError::NoCompletions(_)
            | EngineError::ProjectDifficulty(_)
            | EngineError::BlueprintNotAvailable { .. }
            | EngineError::ParentChainTooDeep(_) => ErrorKind::State,
            EngineError::Config(_) => ErrorKind::Config,
            EngineError::Storage(_) | EngineError::Json(_) | EngineError::Io(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// True for errors the user can fix by leveling up
    pub fn is_gate(&self) -> bool {
        matches!(self.kind(), ErrorKind::Gate)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_numbers() {
        let err = EngineError::DifficultyGate {
            difficulty: Difficulty::Hard,
            required_level: 8,
            current_level: 3,
        };
        assert_eq!(err.to_string(), "difficulty 4 requires level 8 (currently 3)");
        assert!(err.is_gate());

        let err = EngineError::Gate { feature: Feature::Projects, required_level: 7 };
        assert_eq!(err.to_string(), "feature 'projects' unlocks at level 7");

        let err = EngineError::Capacity { limit: 3 };
        assert_eq!(err.to_string(), "too many active tasks (limit 3)");
        assert_eq!(err.kind(), ErrorKind::Capacity);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(EngineError::TaskNotFound(4).kind(), ErrorKind::NotFound);
        assert_eq!(EngineError::NoCompletions(4).kind(), ErrorKind::State);
        assert_eq!(EngineError::HabitMissingInterval(4).kind(), ErrorKind::Validation);
        let err = EngineError::BlueprintNotAvailable {
            code: "str_gym".to_string(),
            status: BlueprintStatus::Locked,
        };
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.to_string(), "blueprint str_gym is not available (status=locked)");
    }
}
