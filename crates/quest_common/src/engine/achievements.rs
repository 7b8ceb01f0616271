//! Achievement badges for Questline.
//!
//! Derived from current state on every read; nothing is persisted. Badges are
//! plain ASCII so they render in any terminal.

use crate::progression::Attribute;
use crate::types::{BlueprintRow, BlueprintStatus, Player, Task};
use serde::Serialize;

/// Achievement badge with ASCII symbol and description
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Achievement {
    /// Unique identifier
    pub id: &'static str,
    /// ASCII badge symbol (e.g., "[L5]", "<STR>")
    pub badge: &'static str,
    /// Short name
    pub name: &'static str,
    /// Description of how to earn it
    pub description: &'static str,
    /// Whether it's been unlocked
    pub unlocked: bool,
}

impl Achievement {
    const fn new(id: &'static str, badge: &'static str, name: &'static str, desc: &'static str) -> Self {
        Self { id, badge, name, description: desc, unlocked: false }
    }
}

/// State the checks read from
pub struct AchievementInput<'a> {
    pub player: &'a Player,
    pub tasks: &'a [Task],
    pub blueprints: &'a [BlueprintRow],
}

/// All available achievements with ASCII badges
pub fn all_achievements() -> Vec<Achievement> {
    vec![
        // Level milestones
        Achievement::new("first_steps", "[L1]", "First Steps", "Reach level 1"),
        Achievement::new("getting_started", "[L3]", "Getting Started", "Reach level 3"),
        Achievement::new("on_the_path", "[L5]", "On the Path", "Reach level 5"),
        Achievement::new("seasoned", "[L10]", "Seasoned Adventurer", "Reach level 10"),
        Achievement::new("veteran", "[L15]", "Veteran", "Reach level 15"),
        Achievement::new("master", "[L20]", "Master", "Reach level 20"),

        // Task completion milestones
        Achievement::new("first_task", "(1)", "First Quest", "Complete 1 task"),
        Achievement::new("productive", "(10)", "Productive", "Complete 10 tasks"),
        Achievement::new("achiever", "(50)", "Achiever", "Complete 50 tasks"),
        Achievement::new("powerhouse", "(100)", "Powerhouse", "Complete 100 tasks"),

        // Attribute levels
        Achievement::new("strong", "<STR>", "Strong", "STR level 3"),
        Achievement::new("smart", "<INT>", "Smart", "INT level 3"),
        Achievement::new("wise", "<WIS>", "Wise", "WIS level 3"),
        Achievement::new("creative", "<ART>", "Creative", "ART level 3"),
        Achievement::new("homemaker", "<HOME>", "Homemaker", "HOME level 3"),
        Achievement::new("outdoorsy", "<OUT>", "Outdoorsy", "OUT level 3"),
        Achievement::new("bookworm", "<READ>", "Bookworm", "READ level 3"),
        Achievement::new("cinephile", "<CINEMA>", "Cinephile", "CINEMA level 3"),
        Achievement::new("professional", "<CAREER>", "Professional", "CAREER level 3"),

        // Content. Nothing marks a blueprint `completed` yet, so "first_blueprint"
        // stays locked until that transition exists.
        Achievement::new("first_blueprint", "{bp}", "Quest Accepted", "Complete any blueprint"),
        Achievement::new("first_project", "{pj}", "Project Manager", "Complete a project"),
        Achievement::new("habit_former", "{~}", "Habit Former", "Create a habit"),
    ]
}

/// Check which achievements are unlocked
pub fn check_achievements(input: &AchievementInput<'_>) -> Vec<Achievement> {
    let mut achievements = all_achievements();
    for ach in &mut achievements {
        ach.unlocked = is_unlocked(ach.id, input);
    }
    achievements
}

pub fn earned_count(achievements: &[Achievement]) -> usize {
    achievements.iter().filter(|a| a.unlocked).count()
}

const ATTRIBUTE_BADGE_LEVEL: u32 = 3;

fn is_unlocked(id: &str, input: &AchievementInput<'_>) -> bool {
    let level = input.player.level;
    match id {
        "first_steps" => level >= 1,
        "getting_started" => level >= 3,
        "on_the_path" => level >= 5,
        "seasoned" => level >= 10,
        "veteran" => level >= 15,
        "master" => level >= 20,

        "first_task" => tasks_done(input) >= 1,
        "productive" => tasks_done(input) >= 10,
        "achiever" => tasks_done(input) >= 50,
        "powerhouse" => tasks_done(input) >= 100,

        "strong" => attribute_badge(input, Attribute::Str),
        "smart" => attribute_badge(input, Attribute::Int),
        "wise" => attribute_badge(input, Attribute::Wis),
        "creative" => attribute_badge(input, Attribute::Art),
        "homemaker" => attribute_badge(input, Attribute::Home),
        "outdoorsy" => attribute_badge(input, Attribute::Out),
        "bookworm" => attribute_badge(input, Attribute::Read),
        "cinephile" => attribute_badge(input, Attribute::Cinema),
        "professional" => attribute_badge(input, Attribute::Career),

        "first_blueprint" => input
            .blueprints
            .iter()
            .any(|b| b.status == BlueprintStatus::Completed),
        "first_project" => input.tasks.iter().any(|t| t.is_project && t.is_done()),
        "habit_former" => input.tasks.iter().any(|t| t.is_habit),

        _ => false,
    }
}

/// Done tasks, projects excluded
fn tasks_done(input: &AchievementInput<'_>) -> usize {
    input
        .tasks
        .iter()
        .filter(|t| t.is_done() && !t.is_project)
        .count()
}

fn attribute_badge(input: &AchievementInput<'_>, attr: Attribute) -> bool {
    input.player.attribute_level(attr) >= ATTRIBUTE_BADGE_LEVEL
}

/// Format achievements for display (ASCII style)
pub fn format_achievements(achievements: &[Achievement], max_display: usize) -> String {
    let unlocked: Vec<_> = achievements.iter().filter(|a| a.unlocked).collect();
    if unlocked.is_empty() {
        return String::new();
    }

    let badges: String = unlocked
        .iter()
        .take(max_display)
        .map(|a| a.badge)
        .collect::<Vec<_>>()
        .join(" ");

    if unlocked.len() > max_display {
        format!("{} +{} more", badges, unlocked.len() - max_display)
    } else {
        badges
    }
}

/// Format a single achievement line
pub fn format_achievement_unlock(ach: &Achievement) -> String {
    format!("{} {} - {}", ach.badge, ach.name, ach.description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::xp_required_for_level;
    use crate::types::{Difficulty, TaskStatus, MAIN_PLAYER_KEY};
    use chrono::Utc;

    fn done_task(id: i64, is_project: bool) -> Task {
        Task {
            id,
            parent_id: None,
            title: format!("t{}", id),
            description: None,
            status: TaskStatus::Done,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
            due_date: None,
            difficulty: Difficulty::Trivial,
            attribute: Attribute::Wis,
            weights: None,
            xp_value: 50,
            is_project,
            is_habit: false,
            habit_interval: None,
            habit_start_date: None,
            habit_end_date: None,
            habit_goal: None,
        }
    }

    fn find<'a>(achievements: &'a [Achievement], id: &str) -> &'a Achievement {
        achievements.iter().find(|a| a.id == id).unwrap()
    }

    #[test]
    fn test_fresh_player_has_nothing() {
        let player = Player::new(MAIN_PLAYER_KEY);
        let achievements = check_achievements(&AchievementInput {
            player: &player,
            tasks: &[],
            blueprints: &[],
        });
        assert_eq!(earned_count(&achievements), 0);
        assert_eq!(achievements.len(), 22);
        assert_eq!(format_achievements(&achievements, 5), "");
    }

    #[test]
    fn test_level_task_and_attribute_badges() {
        let mut player = Player::new(MAIN_PLAYER_KEY);
        player.level = 5;
        player.attributes.set(Attribute::Read, xp_required_for_level(3));

        let tasks = vec![done_task(1, false), done_task(2, true)];
        let achievements = check_achievements(&AchievementInput {
            player: &player,
            tasks: &tasks,
            blueprints: &[],
        });

        assert!(find(&achievements, "on_the_path").unlocked);
        assert!(!find(&achievements, "seasoned").unlocked);
        assert!(find(&achievements, "first_task").unlocked);
        assert!(!find(&achievements, "productive").unlocked);
        assert!(find(&achievements, "bookworm").unlocked);
        assert!(!find(&achievements, "strong").unlocked);
        assert!(find(&achievements, "first_project").unlocked);
        assert!(!find(&achievements, "habit_former").unlocked);
    }

    #[test]
    fn test_blueprint_badge_needs_completed_status() {
        let player = Player::new(MAIN_PLAYER_KEY);
        let rows = vec![BlueprintRow {
            code: "str_starter".to_string(),
            status: BlueprintStatus::Active,
        }];
        let achievements = check_achievements(&AchievementInput {
            player: &player,
            tasks: &[],
            blueprints: &rows,
        });
        assert!(!find(&achievements, "first_blueprint").unlocked);
    }

    #[test]
    fn test_format_achievements_ascii() {
        let mut achievements = all_achievements();
        for ach in achievements.iter_mut().take(3) {
            ach.unlocked = true;
        }
        assert_eq!(format_achievements(&achievements, 2), "[L1] [L3] +1 more");
        assert!(format_achievements(&achievements, 5).is_ascii());
        assert_eq!(
            format_achievement_unlock(&achievements[0]),
            "[L1] First Steps - Reach level 1"
        );
    }
}
