//! Command handlers for questctl.
//!
//! Presentation only: each handler calls one engine operation and prints
//! the result.

use anyhow::{Context, Result};
use chrono::Utc;
use quest_common::engine::{earned_count, format_achievement_unlock, format_achievements};
use quest_common::gates::SubtaskDepth;
use quest_common::progression::parse_attributes;
use quest_common::{
    parse_habit_duration, Attribute, BlueprintStatus, Difficulty, EngineError, HabitInterval,
    HabitSpec, NewProject, NewTask, QuestEngine, Task,
};

const KEY_WIDTH: usize = 14;

pub struct HabitOptions {
    pub interval: String,
    pub duration: Option<String>,
    pub goal: Option<u32>,
}

pub struct AddOptions {
    pub title: String,
    pub difficulty: i64,
    pub attr: Option<String>,
    pub parent: Option<i64>,
    pub project: bool,
    pub habit: Option<HabitOptions>,
}

fn print_kv(key: &str, value: &str) {
    println!("  {:width$} {}", key, value, width = KEY_WIDTH);
}

fn parse_difficulty(value: i64) -> Result<Difficulty> {
    Difficulty::from_value(value).context("difficulty must be 1-5")
}

/// Follow-up line for errors that leveling up would lift
pub fn gate_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<EngineError>()
        .filter(|e| e.is_gate())
        .map(|_| "hint: complete more tasks to level up, then try again (see `questctl status`)")
}

/// Handle add command
pub fn add(engine: &QuestEngine, opts: AddOptions) -> Result<()> {
    let (attribute, weights) = parse_attributes(opts.attr.as_deref().unwrap_or(""))?;
    let now = Utc::now();

    let (created, noun) = if opts.project {
        let mut input = NewProject::new(opts.title).attribute(attribute).weights(weights);
        if let Some(parent) = opts.parent {
            input = input.parent(parent);
        }
        (engine.create_project(input, now)?, "project")
    } else {
        let mut input = NewTask::new(opts.title, parse_difficulty(opts.difficulty)?)
            .attribute(attribute)
            .weights(weights);
        if let Some(parent) = opts.parent {
            input = input.parent(parent);
        }
        let noun = match opts.habit {
            Some(habit) => {
                let mut spec = HabitSpec::new(HabitInterval::parse(&habit.interval)?);
                if let Some(duration) = habit.duration.as_deref() {
                    spec = spec.with_duration(parse_habit_duration(duration)?);
                }
                if let Some(goal) = habit.goal {
                    spec = spec.with_goal(goal);
                }
                input = input.habit(spec);
                "habit"
            }
            None => "task",
        };
        (engine.create_task(input, now)?, noun)
    };

    println!("Created {} #{}", noun, created.task_id);
    if created.project_activated {
        if let Some(parent) = opts.parent {
            println!("Project #{} is now active", parent);
        }
    }
    Ok(())
}

/// Handle do command
pub fn complete(engine: &QuestEngine, id: i64) -> Result<()> {
    let result = engine.complete_task(id, Utc::now())?;

    if result.project_bonus {
        println!(
            "Project #{} complete: +{} XP bonus ({} XP of work)",
            id, result.xp_awarded, result.project_volume
        );
    } else {
        println!("Task #{} complete: +{} XP", id, result.xp_awarded);
    }
    if result.habit_completed {
        println!("Habit goal reached");
    }
    if result.level_up {
        println!("LEVEL UP! {} -> {}", result.level_before, result.level_after);
    }
    for code in &result.unlocked {
        println!("Blueprint unlocked: {}", code);
    }
    Ok(())
}

/// Handle restore command
pub fn restore(engine: &QuestEngine, id: i64) -> Result<()> {
    let result = engine.restore_task(id)?;
    println!("Task #{} restored: -{} XP", id, result.xp_deducted);
    if result.level_down {
        println!("Level {} -> {}", result.level_before, result.level_after);
    }
    Ok(())
}

/// Handle diff command
pub fn set_difficulty(engine: &QuestEngine, id: i64, difficulty: i64) -> Result<()> {
    let task = engine.update_task_difficulty(id, parse_difficulty(difficulty)?)?;
    println!(
        "Task #{} is now {} ({} XP)",
        task.id, task.difficulty.name(), task.xp_value
    );
    Ok(())
}

/// Handle list command
pub fn list(engine: &QuestEngine, all: bool) -> Result<()> {
    let index = engine.task_index()?;
    if index.is_empty() {
        println!("No tasks yet. Try: questctl add \"Water the plants\"");
        return Ok(());
    }

    for (depth, task) in index.walk() {
        if task.is_done() && !all {
            continue;
        }
        let indent = "  ".repeat(depth as usize);
        let detail = if task.is_project {
            format!("HP {}", index.subtree(task.id).remaining_hp)
        } else {
            format!("{}, {} XP", task.difficulty.name(), task.xp_value)
        };
        println!(
            "{}#{} [{}] {} ({}, {}) {}{}",
            indent,
            task.id,
            task.kind().as_str(),
            task.title,
            task.attribute,
            detail,
            task.status,
            due_suffix(task),
        );
    }
    Ok(())
}

fn due_suffix(task: &Task) -> String {
    match task.due_date {
        Some(due) if task.is_habit => format!(" due {}", due.format("%Y-%m-%d %H:%M")),
        _ => String::new(),
    }
}

/// Handle status command
pub fn status(engine: &QuestEngine) -> Result<()> {
    let snapshot = engine.status()?;
    let player = &snapshot.player;
    let gates = &snapshot.gates;

    println!();
    println!("Questline v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print_kv("level", &player.level.to_string());
    print_kv(
        "xp",
        &format!(
            "{} ({}% to next, {} needed)",
            player.xp_total,
            snapshot.progress.percent(),
            snapshot.progress.xp_to_next
        ),
    );
    print_kv(
        "tasks",
        &format!("{}/{} open", snapshot.open_tasks, gates.max_active_tasks),
    );
    let difficulty = match gates.next_difficulty_level {
        Some(level) => format!("up to {} (next tier at level {})", gates.max_difficulty.name(), level),
        None => format!("up to {}", gates.max_difficulty.name()),
    };
    print_kv("difficulty", &difficulty);
    let depth = match gates.max_subtask_depth {
        SubtaskDepth::Limited(0) => "locked".to_string(),
        SubtaskDepth::Limited(n) => format!("{} level(s)", n),
        SubtaskDepth::Unlimited => "unlimited".to_string(),
    };
    print_kv("subtasks", &depth);
    print_kv("habits", if gates.habits { "unlocked" } else { "locked" });
    print_kv("projects", if gates.projects { "unlocked" } else { "locked" });
    let available = engine
        .list_blueprints()?
        .iter()
        .filter(|view| view.status == BlueprintStatus::Available)
        .count();
    print_kv("blueprints", &format!("{} available", available));

    println!();
    println!("  attributes");
    for attr in Attribute::ALL {
        print_kv(
            attr.code(),
            &format!(
                "lvl {:>2}  {} XP",
                player.attribute_level(attr),
                player.attribute_xp(attr)
            ),
        );
    }

    let achievements = engine.achievements()?;
    let badges = format_achievements(&achievements, 6);
    if !badges.is_empty() {
        println!();
        print_kv("badges", &badges);
    }
    println!();
    Ok(())
}

/// Handle blueprints command
pub fn blueprints(engine: &QuestEngine, all: bool) -> Result<()> {
    let newly = engine.evaluate_blueprint_unlocks()?;
    for code in &newly {
        println!("Blueprint unlocked: {}", code);
    }

    for view in engine.list_blueprints()? {
        if view.status == BlueprintStatus::Locked && !all {
            continue;
        }
        println!(
            "{:<20} {:<9} {:<7} {:<6} {}",
            view.def.code,
            view.status.as_str(),
            view.def.kind.as_str(),
            view.def.attribute.code(),
            view.def.title
        );
    }
    Ok(())
}

/// Handle accept command
pub fn accept(engine: &QuestEngine, code: &str) -> Result<()> {
    let created = engine.accept_blueprint(code, Utc::now())?;
    let task = engine
        .get_task(created.task_id)?
        .with_context(|| format!("task #{} vanished after accept", created.task_id))?;
    println!("Accepted {}: {} #{} {}", code.trim(), task.kind().as_str(), task.id, task.title);

    let children = engine.list_children(task.id)?;
    for child in &children {
        println!("  #{} {} ({})", child.id, child.title, child.difficulty.name());
    }
    Ok(())
}

/// Handle achievements command
pub fn achievements(engine: &QuestEngine) -> Result<()> {
    let list = engine.achievements()?;
    println!("{}/{} earned", earned_count(&list), list.len());
    for ach in &list {
        let mark = if ach.unlocked { "x" } else { " " };
        println!("[{}] {}", mark, format_achievement_unlock(ach));
    }
    Ok(())
}
