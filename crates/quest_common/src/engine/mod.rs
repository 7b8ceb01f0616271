//! Quest Engine v0.1.0
//!
//! Lifecycle operations over the task tree: create, complete, restore,
//! difficulty edits and blueprint acceptance. Each public operation runs in
//! exactly one store transaction and takes the current time from the caller.
//!
//! Completions share one post-condition: XP credited, attribute shares
//! applied, level recomputed and persisted, ledger row appended, and on a
//! level-up the blueprint unlocks re-evaluated (best effort).

mod achievements;
mod blueprints;
mod complete;
mod create;
mod habits;
mod restore;
mod tree;
mod update;

pub use achievements::{
    all_achievements, check_achievements, earned_count, format_achievement_unlock,
    format_achievements, Achievement, AchievementInput,
};
pub use blueprints::{
    blueprint_def, catalog, normalize_code, BlueprintChild, BlueprintDef, BlueprintKind,
    BlueprintView, UnlockRule,
};
pub use complete::CompleteResult;
pub use create::{CreateResult, HabitSpec, NewProject, NewTask};
pub use habits::HabitProgress;
pub use restore::RestoreResult;
pub use tree::{SubtreeStats, TaskIndex, MAX_PARENT_HOPS};

use crate::error::{EngineError, Result};
use crate::gates::GateSummary;
use crate::progression::{distribute_xp, level_for_total_xp, LevelProgress};
use crate::store::{Repo, Store};
use crate::types::{Difficulty, Player, Task, TaskCompletion};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Facade over a [`Store`]
pub struct QuestEngine {
    store: Store,
}

impl QuestEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Store::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Store::open_in_memory()?))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ========================================================================
    // Lifecycle operations
    // ========================================================================

    pub fn create_task(&self, input: NewTask, now: DateTime<Utc>) -> Result<CreateResult> {
        self.store.with_tx(|repo| create::create_task(repo, &input, now))
    }

    pub fn create_project(&self, input: NewProject, now: DateTime<Utc>) -> Result<CreateResult> {
        self.store.with_tx(|repo| create::create_project(repo, &input, now))
    }

    pub fn complete_task(&self, id: i64, now: DateTime<Utc>) -> Result<CompleteResult> {
        self.store.with_tx(|repo| complete::complete_task(repo, id, now))
    }

    /// Undo the most recent completion of a task
    pub fn restore_task(&self, id: i64) -> Result<RestoreResult> {
        self.store.with_tx(|repo| restore::restore_task(repo, id))
    }

    /// Change a task's difficulty, recomputing its reward. Returns the updated task.
    pub fn update_task_difficulty(&self, id: i64, difficulty: Difficulty) -> Result<Task> {
        self.store
            .with_tx(|repo| update::update_task_difficulty(repo, id, difficulty))
    }

    /// Codes that moved from locked to available
    pub fn evaluate_blueprint_unlocks(&self) -> Result<Vec<String>> {
        self.store.with_tx(blueprints::evaluate_unlocks)
    }

    pub fn accept_blueprint(&self, code: &str, now: DateTime<Utc>) -> Result<CreateResult> {
        self.store
            .with_tx(|repo| blueprints::accept_blueprint(repo, code, now))
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    /// The player, with a stale cached level repaired and persisted
    pub fn player(&self) -> Result<Player> {
        self.store.with_tx(load_player)
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        self.store.with_tx(|repo| repo.get_task(id))
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.store.with_tx(|repo| repo.list_tasks())
    }

    pub fn list_children(&self, parent_id: i64) -> Result<Vec<Task>> {
        self.store.with_tx(|repo| repo.list_children(parent_id))
    }

    pub fn task_index(&self) -> Result<TaskIndex> {
        Ok(TaskIndex::build(self.list_tasks()?))
    }

    pub fn list_completions(&self, task_id: i64) -> Result<Vec<TaskCompletion>> {
        self.store.with_tx(|repo| repo.list_completions(task_id))
    }

    /// Every catalog entry with its persisted status (locked if never evaluated)
    pub fn list_blueprints(&self) -> Result<Vec<BlueprintView>> {
        self.store.with_tx(blueprints::list_blueprints)
    }

    /// Sum of `xp_value` over unfinished plain tasks below a project
    pub fn project_hp(&self, project_id: i64) -> Result<u64> {
        self.store.with_tx(|repo| {
            let project = repo.require_task(project_id)?;
            let index = TaskIndex::build(repo.list_tasks()?);
            Ok(index.subtree(project.id).remaining_hp)
        })
    }

    pub fn habit_progress(&self, task_id: i64, now: DateTime<Utc>) -> Result<HabitProgress> {
        self.store.with_tx(|repo| {
            let task = repo.require_task(task_id)?;
            if !task.is_habit {
                return Err(EngineError::Validation(format!("task {} is not a habit", task_id)));
            }
            let completions = repo.list_completions(task_id)?;
            Ok(HabitProgress::compute(&task, &completions, now))
        })
    }

    pub fn achievements(&self) -> Result<Vec<Achievement>> {
        self.store.with_tx(|repo| {
            let player = load_player(repo)?;
            let tasks = repo.list_tasks()?;
            let blueprints = repo.list_blueprint_rows()?;
            Ok(check_achievements(&AchievementInput {
                player: &player,
                tasks: &tasks,
                blueprints: &blueprints,
            }))
        })
    }

    /// Ledger XP per UTC day in `[since, until)`
    pub fn xp_by_day(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<(NaiveDate, u64)>> {
        self.store.with_tx(|repo| repo.xp_by_day(since, until))
    }

    pub fn status(&self) -> Result<StatusSnapshot> {
        self.store.with_tx(|repo| {
            let player = load_player(repo)?;
            let index = TaskIndex::build(repo.list_tasks()?);
            Ok(StatusSnapshot {
                progress: LevelProgress::from_xp(player.xp_total),
                gates: GateSummary::for_level(player.level),
                open_tasks: index.open_leaf_count(),
                player,
            })
        })
    }
}

/// Everything a status view needs in one read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub player: Player,
    pub progress: LevelProgress,
    pub gates: GateSummary,
    /// Tasks counting against the active-task limit
    pub open_tasks: usize,
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Read the main player, repairing the cached level if it drifted
pub(crate) fn load_player(repo: &Repo<'_>) -> Result<Player> {
    let mut player = repo.get_or_create_main_player()?;
    let level = level_for_total_xp(player.xp_total);
    if player.level != level {
        debug!("repairing stale player level {} -> {}", player.level, level);
        player.level = level;
        repo.update_player(&player)?;
    }
    Ok(player)
}

/// Credit `xp` to the total and split it over the task's attributes
pub(crate) fn credit_xp(player: &mut Player, task: &Task, xp: u64) {
    player.xp_total = player.xp_total.saturating_add(xp);
    for (attr, share) in distribute_xp(xp, task.attribute, task.weights.as_ref()) {
        player.attributes.add(attr, share);
    }
    player.level = level_for_total_xp(player.xp_total);
}

/// Inverse of [`credit_xp`], clamping every counter at zero
pub(crate) fn debit_xp(player: &mut Player, task: &Task, xp: u64) {
    player.xp_total = player.xp_total.saturating_sub(xp);
    for (attr, share) in distribute_xp(xp, task.attribute, task.weights.as_ref()) {
        player.attributes.subtract(attr, share);
    }
    player.level = level_for_total_xp(player.xp_total);
}

/// Re-evaluate unlocks after a level-up inside a savepoint. A failure is
/// logged and rolled back without failing the completion.
pub(crate) fn refresh_unlocks_after_level_up(repo: &Repo<'_>) -> Vec<String> {
    match repo.savepoint("refresh_unlocks", blueprints::evaluate_unlocks) {
        Ok(codes) => codes,
        Err(e) => {
            warn!("blueprint unlock evaluation failed after level-up: {}", e);
            Vec::new()
        }
    }
}
