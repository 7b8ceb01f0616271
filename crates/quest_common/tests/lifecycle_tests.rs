//! Task lifecycle tests: creation gates, completion, project aggregation,
//! habit decay and restore, against a real SQLite file.

use chrono::{DateTime, Duration, TimeZone, Utc};
use quest_common::gates::Feature;
use quest_common::progression::{calculate_xp, level_for_total_xp, xp_required_for_level};
use quest_common::{
    parse_habit_duration, Attribute, AttributeWeights, Difficulty, EngineError, HabitInterval,
    HabitSpec, NewProject, NewTask, QuestEngine, TaskStatus,
};
use tempfile::TempDir;

fn engine() -> (TempDir, QuestEngine) {
    let dir = TempDir::new().unwrap();
    let engine = QuestEngine::open(&dir.path().join("quest.db")).unwrap();
    (dir, engine)
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

/// Put the player at an exact XP total
fn set_player_xp(engine: &QuestEngine, total: u64, attrs: &[(Attribute, u64)]) {
    engine
        .store()
        .with_tx(|repo| {
            let mut player = repo.get_or_create_main_player()?;
            player.xp_total = total;
            player.level = level_for_total_xp(total);
            for (attr, xp) in attrs {
                player.attributes.set(*attr, *xp);
            }
            repo.update_player(&player)
        })
        .unwrap();
}

fn at_level(engine: &QuestEngine, level: u32) {
    set_player_xp(engine, xp_required_for_level(level), &[]);
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_create_plain_task() {
    let (_dir, engine) = engine();
    let created = engine
        .create_task(NewTask::new("  Water plants  ", Difficulty::Trivial), t0())
        .unwrap();
    assert!(!created.project_activated);

    let task = engine.get_task(created.task_id).unwrap().unwrap();
    assert_eq!(task.title, "Water plants");
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.attribute, Attribute::Wis);
    assert_eq!(task.xp_value, 50);
    assert_eq!(task.created_at, t0());
    assert!(task.weights.is_none());
}

#[test]
fn test_empty_title_rejected() {
    let (_dir, engine) = engine();
    let err = engine
        .create_task(NewTask::new("   ", Difficulty::Trivial), t0())
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.list_tasks().unwrap().is_empty());
}

#[test]
fn test_reward_uses_attribute_level_at_creation() {
    let (_dir, engine) = engine();
    set_player_xp(&engine, xp_required_for_level(2), &[(Attribute::Art, xp_required_for_level(4))]);

    let id = engine
        .create_task(NewTask::new("Paint", Difficulty::Easy).attribute(Attribute::Art), t0())
        .unwrap()
        .task_id;
    let task = engine.get_task(id).unwrap().unwrap();
    assert_eq!(task.xp_value, calculate_xp(Difficulty::Easy, 4));
    assert_eq!(task.xp_value, 120);
}

#[test]
fn test_difficulty_gate() {
    let (_dir, engine) = engine();
    let err = engine
        .create_task(NewTask::new("Hard thing", Difficulty::Easy), t0())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::DifficultyGate { difficulty: Difficulty::Easy, required_level: 2, current_level: 0 }
    ));
}

#[test]
fn test_habit_and_project_gates() {
    let (_dir, engine) = engine();
    at_level(&engine, 4);

    let err = engine
        .create_task(
            NewTask::new("Stretch", Difficulty::Trivial).habit(HabitSpec::new(HabitInterval::Daily)),
            t0(),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Gate { feature: Feature::Habits, required_level: 5 }));

    at_level(&engine, 6);
    let err = engine.create_project(NewProject::new("Garden"), t0()).unwrap_err();
    assert!(matches!(err, EngineError::Gate { feature: Feature::Projects, required_level: 7 }));
}

#[test]
fn test_capacity_limit() {
    let (_dir, engine) = engine();
    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(
            engine
                .create_task(NewTask::new(format!("Task {}", i), Difficulty::Trivial), t0())
                .unwrap()
                .task_id,
        );
    }

    let err = engine
        .create_task(NewTask::new("One too many", Difficulty::Trivial), t0())
        .unwrap_err();
    assert!(matches!(err, EngineError::Capacity { limit: 3 }));

    engine.complete_task(ids[0], t0()).unwrap();
    engine
        .create_task(NewTask::new("Fits now", Difficulty::Trivial), t0())
        .unwrap();
}

#[test]
fn test_subtask_depth_gates() {
    let (_dir, engine) = engine();
    let root = engine
        .create_task(NewTask::new("Root", Difficulty::Trivial), t0())
        .unwrap()
        .task_id;

    let err = engine
        .create_task(NewTask::new("Child", Difficulty::Trivial).parent(root), t0())
        .unwrap_err();
    assert!(matches!(err, EngineError::Gate { feature: Feature::Subtasks, required_level: 3 }));

    at_level(&engine, 3);
    let child = engine
        .create_task(NewTask::new("Child", Difficulty::Trivial).parent(root), t0())
        .unwrap()
        .task_id;
    let err = engine
        .create_task(NewTask::new("Grandchild", Difficulty::Trivial).parent(child), t0())
        .unwrap_err();
    assert!(matches!(err, EngineError::SubtaskDepth { requested: 2, max: 1, level: 3 }));

    at_level(&engine, 10);
    engine
        .create_task(NewTask::new("Grandchild", Difficulty::Trivial).parent(child), t0())
        .unwrap();

    let err = engine
        .create_task(NewTask::new("Orphan", Difficulty::Trivial).parent(999), t0())
        .unwrap_err();
    assert!(matches!(err, EngineError::TaskNotFound(999)));
}

// ============================================================================
// Completion
// ============================================================================

#[test]
fn test_complete_leaf_task() {
    let (_dir, engine) = engine();
    let id = engine
        .create_task(NewTask::new("Dishes", Difficulty::Trivial).attribute(Attribute::Home), t0())
        .unwrap()
        .task_id;

    let result = engine.complete_task(id, t0()).unwrap();
    assert_eq!(result.xp_awarded, 50);
    assert!(!result.level_up);
    assert!(!result.project_bonus);

    let task = engine.get_task(id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.completed_at, Some(t0()));

    let player = engine.player().unwrap();
    assert_eq!(player.xp_total, 50);
    assert_eq!(player.attribute_xp(Attribute::Home), 50);

    let ledger = engine.list_completions(id).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].xp_awarded, 50);
    assert_eq!(ledger[0].difficulty, Difficulty::Trivial);

    let err = engine.complete_task(id, t0()).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyDone(_)));
}

#[test]
fn test_weighted_award_split() {
    let (_dir, engine) = engine();
    at_level(&engine, 2);
    let weights = AttributeWeights::from_pairs([(Attribute::Str, 1), (Attribute::Int, 2)]);
    let id = engine
        .create_task(
            NewTask::new("Climb", Difficulty::Easy)
                .attribute(Attribute::Str)
                .weights(Some(weights)),
            t0(),
        )
        .unwrap()
        .task_id;

    engine.complete_task(id, t0()).unwrap();
    let player = engine.player().unwrap();
    assert_eq!(player.attribute_xp(Attribute::Str), 33);
    assert_eq!(player.attribute_xp(Attribute::Int), 67);
    assert_eq!(player.xp_total, xp_required_for_level(2) + 100);
}

#[test]
fn test_task_with_children_is_not_completable() {
    let (_dir, engine) = engine();
    at_level(&engine, 3);
    let parent = engine
        .create_task(NewTask::new("Move house", Difficulty::Trivial), t0())
        .unwrap()
        .task_id;
    engine
        .create_task(NewTask::new("Pack", Difficulty::Trivial).parent(parent), t0())
        .unwrap();

    let err = engine.complete_task(parent, t0()).unwrap_err();
    assert!(matches!(err, EngineError::NotLeaf(_)));
}

#[test]
fn test_unknown_task() {
    let (_dir, engine) = engine();
    assert!(matches!(engine.complete_task(42, t0()), Err(EngineError::TaskNotFound(42))));
    assert!(matches!(engine.restore_task(42), Err(EngineError::TaskNotFound(42))));
}

#[test]
fn test_level_up_is_reported() {
    let (_dir, engine) = engine();
    set_player_xp(&engine, 480, &[]);
    let id = engine
        .create_task(NewTask::new("Walk", Difficulty::Trivial), t0())
        .unwrap()
        .task_id;

    let result = engine.complete_task(id, t0()).unwrap();
    assert!(result.level_up);
    assert_eq!(result.level_before, 0);
    assert_eq!(result.level_after, 1);
    assert_eq!(engine.player().unwrap().level, 1);
}

// ============================================================================
// Projects
// ============================================================================

#[test]
fn test_project_activation_and_completion_bonus() {
    let (_dir, engine) = engine();
    at_level(&engine, 7);
    let base_xp = xp_required_for_level(7);

    let project = engine
        .create_project(NewProject::new("Launch site"), t0())
        .unwrap()
        .task_id;
    let created = engine.get_task(project).unwrap().unwrap();
    assert_eq!(created.status, TaskStatus::Planning);
    assert_eq!(created.xp_value, 0);

    let err = engine.complete_task(project, t0()).unwrap_err();
    assert!(matches!(err, EngineError::ProjectPlanning(_)));

    let first = engine
        .create_task(NewTask::new("Design", Difficulty::Easy).parent(project), t0())
        .unwrap();
    assert!(first.project_activated);
    assert_eq!(engine.get_task(project).unwrap().unwrap().status, TaskStatus::Active);

    let second = engine
        .create_task(
            NewTask::new("Build", Difficulty::Medium)
                .attribute(Attribute::Art)
                .parent(project),
            t0(),
        )
        .unwrap();
    assert!(!second.project_activated);

    assert_eq!(engine.project_hp(project).unwrap(), 350);

    engine.complete_task(first.task_id, t0()).unwrap();
    let err = engine.complete_task(project, t0()).unwrap_err();
    assert!(matches!(err, EngineError::ProjectUnfinished(_)));
    assert_eq!(engine.project_hp(project).unwrap(), 250);

    engine.complete_task(second.task_id, t0()).unwrap();
    let result = engine.complete_task(project, t0()).unwrap();
    assert!(result.project_bonus);
    assert_eq!(result.project_volume, 350);
    assert_eq!(result.xp_awarded, 35);

    assert_eq!(engine.get_task(project).unwrap().unwrap().status, TaskStatus::Done);
    assert_eq!(engine.player().unwrap().xp_total, base_xp + 100 + 250 + 35);
    assert_eq!(engine.project_hp(project).unwrap(), 0);
}

#[test]
fn test_habits_do_not_block_projects() {
    let (_dir, engine) = engine();
    at_level(&engine, 7);
    let project = engine
        .create_project(NewProject::new("Fitness"), t0())
        .unwrap()
        .task_id;
    let leaf = engine
        .create_task(NewTask::new("Buy shoes", Difficulty::Trivial).parent(project), t0())
        .unwrap()
        .task_id;
    engine
        .create_task(
            NewTask::new("Jog", Difficulty::Easy)
                .parent(project)
                .habit(HabitSpec::new(HabitInterval::Daily)),
            t0(),
        )
        .unwrap();

    engine.complete_task(leaf, t0()).unwrap();
    let result = engine.complete_task(project, t0()).unwrap();
    assert_eq!(result.project_volume, 50);
    assert_eq!(result.xp_awarded, 5);
}

#[test]
fn test_nested_project_counts_toward_parent_volume() {
    let (_dir, engine) = engine();
    at_level(&engine, 10);
    let outer = engine.create_project(NewProject::new("Outer"), t0()).unwrap().task_id;
    let inner = engine
        .create_project(NewProject::new("Inner").parent(outer), t0())
        .unwrap();
    assert!(inner.project_activated);

    let leaf = engine
        .create_task(NewTask::new("Deep leaf", Difficulty::Medium).parent(inner.task_id), t0())
        .unwrap();
    assert!(leaf.project_activated);

    let err = engine.complete_task(outer, t0()).unwrap_err();
    assert!(matches!(err, EngineError::ProjectUnfinished(_)));

    engine.complete_task(leaf.task_id, t0()).unwrap();
    let result = engine.complete_task(outer, t0()).unwrap();
    assert_eq!(result.project_volume, calculate_xp(Difficulty::Medium, 0));
}

// ============================================================================
// Habits
// ============================================================================

#[test]
fn test_habit_decay_and_difficulty_reset() {
    let (_dir, engine) = engine();
    at_level(&engine, 5);

    let id = engine
        .create_task(
            NewTask::new("Push-ups", Difficulty::Easy)
                .attribute(Attribute::Str)
                .habit(HabitSpec::new(HabitInterval::Daily)),
            t0(),
        )
        .unwrap()
        .task_id;
    let habit = engine.get_task(id).unwrap().unwrap();
    assert_eq!(habit.status, TaskStatus::Active);
    assert!(habit.due_date.is_none());
    assert_eq!(habit.xp_value, 100);

    for i in 0..5 {
        let at = t0() + Duration::hours(i);
        let result = engine.complete_task(id, at).unwrap();
        assert_eq!(result.xp_awarded, 100, "completion {} should be full", i + 1);

        let after = engine.get_task(id).unwrap().unwrap();
        assert_eq!(after.status, TaskStatus::Pending);
        assert_eq!(after.due_date, Some(at + Duration::hours(24)));
    }

    let sixth = engine.complete_task(id, t0() + Duration::hours(5)).unwrap();
    assert_eq!(sixth.xp_awarded, 50);
    assert!(!sixth.habit_completed);

    let updated = engine.update_task_difficulty(id, Difficulty::Medium).unwrap();
    let str_level = engine.player().unwrap().attribute_level(Attribute::Str);
    assert_eq!(updated.xp_value, calculate_xp(Difficulty::Medium, str_level));

    let seventh = engine.complete_task(id, t0() + Duration::hours(6)).unwrap();
    assert_eq!(seventh.xp_awarded, updated.xp_value);

    let ledger = engine.list_completions(id).unwrap();
    assert_eq!(ledger.len(), 7);
    assert_eq!(ledger[6].difficulty, Difficulty::Medium);
}

#[test]
fn test_habit_decay_window_expires() {
    let (_dir, engine) = engine();
    at_level(&engine, 5);
    let id = engine
        .create_task(
            NewTask::new("Read", Difficulty::Trivial).habit(HabitSpec::new(HabitInterval::Daily)),
            t0(),
        )
        .unwrap()
        .task_id;

    for i in 0..5 {
        engine.complete_task(id, t0() + Duration::hours(i)).unwrap();
    }
    // All five earlier completions have left the 7-day window
    let later = engine.complete_task(id, t0() + Duration::days(8)).unwrap();
    assert_eq!(later.xp_awarded, 50);
}

#[test]
fn test_habit_goal_finishes_habit() {
    let (_dir, engine) = engine();
    at_level(&engine, 5);
    let id = engine
        .create_task(
            NewTask::new("Meditate", Difficulty::Trivial).habit(
                HabitSpec::new(HabitInterval::Daily)
                    .with_duration(Duration::days(7))
                    .with_goal(2),
            ),
            t0(),
        )
        .unwrap()
        .task_id;

    let habit = engine.get_task(id).unwrap().unwrap();
    assert_eq!(habit.habit_start_date, Some(t0()));
    assert_eq!(habit.habit_end_date, Some(t0() + Duration::days(7)));

    let first = engine.complete_task(id, t0() + Duration::days(1)).unwrap();
    assert!(!first.habit_completed);
    let progress = engine.habit_progress(id, t0() + Duration::days(1)).unwrap();
    assert_eq!(progress.completions, 1);

    let second = engine.complete_task(id, t0() + Duration::days(2)).unwrap();
    assert!(second.habit_completed);
    assert_eq!(engine.get_task(id).unwrap().unwrap().status, TaskStatus::Done);

    let err = engine.complete_task(id, t0() + Duration::days(3)).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyDone(_)));
}

#[test]
fn test_habit_goal_zero_rejected() {
    let (_dir, engine) = engine();
    at_level(&engine, 5);
    let err = engine
        .create_task(
            NewTask::new("Nothing", Difficulty::Trivial)
                .habit(HabitSpec::new(HabitInterval::Weekly).with_goal(0)),
            t0(),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn test_habit_window_past_max_date_rejected() {
    let (_dir, engine) = engine();
    at_level(&engine, 5);
    let window = parse_habit_duration("100000000d").unwrap();
    let err = engine
        .create_task(
            NewTask::new("Forever", Difficulty::Trivial)
                .habit(HabitSpec::new(HabitInterval::Daily).with_duration(window)),
            t0(),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "got {:?}", err);
    assert!(engine.list_tasks().unwrap().is_empty());
}

#[test]
fn test_monthly_habit_due_date() {
    let (_dir, engine) = engine();
    at_level(&engine, 5);
    let id = engine
        .create_task(
            NewTask::new("Budget", Difficulty::Trivial).habit(HabitSpec::new(HabitInterval::Monthly)),
            t0(),
        )
        .unwrap()
        .task_id;
    engine.complete_task(id, t0()).unwrap();
    let habit = engine.get_task(id).unwrap().unwrap();
    assert_eq!(habit.due_date, Some(Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap()));
}

// ============================================================================
// Restore
// ============================================================================

#[test]
fn test_restore_is_inverse_of_completion() {
    let (_dir, engine) = engine();
    at_level(&engine, 2);
    let weights = AttributeWeights::from_pairs([(Attribute::Str, 1), (Attribute::Int, 2)]);
    let id = engine
        .create_task(
            NewTask::new("Climb", Difficulty::Easy)
                .attribute(Attribute::Str)
                .weights(Some(weights)),
            t0(),
        )
        .unwrap()
        .task_id;

    let before = engine.player().unwrap();
    engine.complete_task(id, t0()).unwrap();
    let restored = engine.restore_task(id).unwrap();
    assert_eq!(restored.xp_deducted, 100);
    assert!(!restored.level_down);

    let after = engine.player().unwrap();
    assert_eq!(after, before);

    let task = engine.get_task(id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.completed_at.is_none());
    assert!(engine.list_completions(id).unwrap().is_empty());

    let err = engine.restore_task(id).unwrap_err();
    assert!(matches!(err, EngineError::NoCompletions(_)));
}

#[test]
fn test_restore_undoes_level_up_and_clamps() {
    let (_dir, engine) = engine();
    set_player_xp(&engine, 480, &[]);
    let id = engine
        .create_task(NewTask::new("Walk", Difficulty::Trivial), t0())
        .unwrap()
        .task_id;
    engine.complete_task(id, t0()).unwrap();

    // Drain the attribute pool so the undo has to clamp
    set_player_xp(&engine, 530, &[(Attribute::Wis, 10)]);
    let restored = engine.restore_task(id).unwrap();
    assert!(restored.level_down);
    assert_eq!(restored.level_after, 0);

    let player = engine.player().unwrap();
    assert_eq!(player.xp_total, 480);
    assert_eq!(player.attribute_xp(Attribute::Wis), 0);
}

#[test]
fn test_restore_only_removes_latest_habit_completion() {
    let (_dir, engine) = engine();
    at_level(&engine, 5);
    let id = engine
        .create_task(
            NewTask::new("Floss", Difficulty::Trivial).habit(HabitSpec::new(HabitInterval::Daily)),
            t0(),
        )
        .unwrap()
        .task_id;
    engine.complete_task(id, t0()).unwrap();
    engine.complete_task(id, t0() + Duration::days(1)).unwrap();

    engine.restore_task(id).unwrap();
    let ledger = engine.list_completions(id).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].completed_at, t0());
    assert_eq!(engine.get_task(id).unwrap().unwrap().status, TaskStatus::Pending);
}

#[test]
fn test_restore_project_resets_to_pending() {
    let (_dir, engine) = engine();
    at_level(&engine, 7);
    let project = engine.create_project(NewProject::new("Trip"), t0()).unwrap().task_id;
    let leaf = engine
        .create_task(NewTask::new("Book", Difficulty::Easy).parent(project), t0())
        .unwrap()
        .task_id;
    engine.complete_task(leaf, t0()).unwrap();
    engine.complete_task(project, t0()).unwrap();

    let restored = engine.restore_task(project).unwrap();
    assert_eq!(restored.xp_deducted, 10);
    assert_eq!(engine.get_task(project).unwrap().unwrap().status, TaskStatus::Pending);
}

// ============================================================================
// Difficulty edits
// ============================================================================

#[test]
fn test_update_difficulty_rules() {
    let (_dir, engine) = engine();
    at_level(&engine, 7);
    let project = engine.create_project(NewProject::new("Plan"), t0()).unwrap().task_id;
    let err = engine
        .update_task_difficulty(project, Difficulty::Easy)
        .unwrap_err();
    assert!(matches!(err, EngineError::ProjectDifficulty(_)));

    let id = engine
        .create_task(NewTask::new("Task", Difficulty::Trivial), t0())
        .unwrap()
        .task_id;
    let err = engine.update_task_difficulty(id, Difficulty::Hard).unwrap_err();
    assert!(matches!(err, EngineError::DifficultyGate { required_level: 8, .. }));

    let task = engine.update_task_difficulty(id, Difficulty::Medium).unwrap();
    assert_eq!(task.difficulty, Difficulty::Medium);
    assert_eq!(task.xp_value, 250);
}
