//! Quest Common - Progression & task-lifecycle engine for Questline v0.1.0
//!
//! Turns completed real-world tasks into XP, player levels, attribute levels
//! and unlocked content. Tasks live in a tree (plain tasks, projects, habits)
//! persisted in a local SQLite database.
//!
//! Every lifecycle operation runs as one transaction against the [`store::Store`]
//! and takes the current time from the caller.

pub mod config;
pub mod engine;
pub mod error;
pub mod gates;
pub mod progression;
pub mod store;
pub mod types;

pub use engine::{
    CompleteResult, CreateResult, HabitSpec, NewProject, NewTask, QuestEngine, RestoreResult,
    StatusSnapshot,
};
pub use error::{EngineError, ErrorKind, Result};
pub use progression::{Attribute, AttributeWeights, AttributeXp};
pub use store::{Repo, Store};
pub use types::*;
