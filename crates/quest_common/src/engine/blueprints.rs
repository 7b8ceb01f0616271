//! Blueprint Catalog & Unlock Engine v0.1.0
//!
//! Built-in content templates, one track per attribute. Only the status of
//! each entry is persisted; it moves one way:
//! locked -> available -> active (-> completed, never set here).
//!
//! Unlock rules are declarative: a minimum player level, optionally a minimum
//! level on one attribute, optionally a completed project with a given title.

use super::create::{self, CreateResult, HabitSpec, NewProject, NewTask};
use super::load_player;
use crate::error::{EngineError, Result};
use crate::gates::{LEVEL_HABITS, LEVEL_PROJECTS};
use crate::progression::Attribute;
use crate::store::Repo;
use crate::types::{BlueprintStatus, Difficulty, HabitInterval, Player};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlueprintKind {
    Task,
    Project,
    Habit,
}

impl BlueprintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlueprintKind::Task => "task",
            BlueprintKind::Project => "project",
            BlueprintKind::Habit => "habit",
        }
    }
}

/// Child task created under a project blueprint; inherits the attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlueprintChild {
    pub title: &'static str,
    pub difficulty: Difficulty,
}

/// Predicate over player state deciding when an entry becomes available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockRule {
    pub min_level: u32,
    pub attribute: Option<(Attribute, u32)>,
    /// Title of a project that must have been completed
    pub completed_project: Option<&'static str>,
}

impl UnlockRule {
    pub const fn level(min_level: u32) -> Self {
        Self {
            min_level,
            attribute: None,
            completed_project: None,
        }
    }

    pub const fn with_attribute(self, attribute: Attribute, min_level: u32) -> Self {
        Self {
            attribute: Some((attribute, min_level)),
            ..self
        }
    }

    pub const fn after_project(self, title: &'static str) -> Self {
        Self {
            completed_project: Some(title),
            ..self
        }
    }

    pub fn is_met(&self, repo: &Repo<'_>, player: &Player) -> Result<bool> {
        if player.level < self.min_level {
            return Ok(false);
        }
        if let Some((attr, min)) = self.attribute {
            if player.attribute_level(attr) < min {
                return Ok(false);
            }
        }
        match self.completed_project {
            Some(title) => repo.has_completed_project_title(title),
            None => Ok(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlueprintDef {
    pub code: &'static str,
    pub kind: BlueprintKind,
    pub title: &'static str,
    pub description: &'static str,
    /// Ignored for projects
    pub difficulty: Difficulty,
    pub attribute: Attribute,
    /// Habits only
    pub interval: Option<HabitInterval>,
    /// Projects only
    pub children: &'static [BlueprintChild],
    pub unlock: UnlockRule,
}

/// Catalog entry joined with its persisted status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlueprintView {
    pub def: &'static BlueprintDef,
    pub status: BlueprintStatus,
}

const fn habit(
    code: &'static str,
    title: &'static str,
    description: &'static str,
    difficulty: Difficulty,
    attribute: Attribute,
    interval: HabitInterval,
    unlock: UnlockRule,
) -> BlueprintDef {
    BlueprintDef {
        code,
        kind: BlueprintKind::Habit,
        title,
        description,
        difficulty,
        attribute,
        interval: Some(interval),
        children: &[],
        unlock,
    }
}

const fn task(
    code: &'static str,
    title: &'static str,
    description: &'static str,
    difficulty: Difficulty,
    attribute: Attribute,
    unlock: UnlockRule,
) -> BlueprintDef {
    BlueprintDef {
        code,
        kind: BlueprintKind::Task,
        title,
        description,
        difficulty,
        attribute,
        interval: None,
        children: &[],
        unlock,
    }
}

const fn project(
    code: &'static str,
    title: &'static str,
    description: &'static str,
    attribute: Attribute,
    children: &'static [BlueprintChild],
    unlock: UnlockRule,
) -> BlueprintDef {
    BlueprintDef {
        code,
        kind: BlueprintKind::Project,
        title,
        description,
        difficulty: Difficulty::Trivial,
        attribute,
        interval: None,
        children,
        unlock,
    }
}

const fn child(title: &'static str, difficulty: Difficulty) -> BlueprintChild {
    BlueprintChild { title, difficulty }
}

use Attribute::*;
use Difficulty::{Easy, Hard, Medium, Trivial};
use HabitInterval::{Daily, Monthly, Weekly};

static CATALOG: &[BlueprintDef] = &[
    // STR
    habit(
        "str_starter",
        "Push-ups",
        "Build a daily push-up habit to strengthen your body and willpower.",
        Easy,
        Str,
        Daily,
        UnlockRule::level(LEVEL_HABITS),
    ),
    habit(
        "str_walk",
        "Daily Walk",
        "Take a daily walk to clear your mind and stay active.",
        Trivial,
        Str,
        Daily,
        UnlockRule::level(LEVEL_HABITS),
    ),
    habit(
        "str_run",
        "Weekly Run",
        "Weekly running builds endurance and cardiovascular health.",
        Medium,
        Str,
        Weekly,
        UnlockRule::level(5).with_attribute(Str, 2),
    ),
    project(
        "str_gym",
        "Gym Program",
        "Complete a structured 4-week gym program with progressive overload.",
        Str,
        &[
            child("Week 1: Foundation", Easy),
            child("Week 2: Building", Medium),
            child("Week 3: Intensity", Medium),
            child("Week 4: Peak", Hard),
        ],
        UnlockRule::level(8).with_attribute(Str, 3),
    ),
    // INT
    habit(
        "int_puzzle",
        "Daily Puzzle",
        "Solve a puzzle or brain teaser daily to keep your mind sharp.",
        Easy,
        Int,
        Daily,
        UnlockRule::level(LEVEL_HABITS),
    ),
    project(
        "int_course",
        "Online Course",
        "Complete an online course on a topic that interests you.",
        Int,
        &[
            child("Module 1", Easy),
            child("Module 2", Medium),
            child("Module 3", Medium),
            child("Final Project", Hard),
        ],
        UnlockRule::level(LEVEL_PROJECTS).with_attribute(Int, 2),
    ),
    habit(
        "int_lang",
        "Language Practice",
        "Practice a new language daily with apps or study sessions.",
        Medium,
        Int,
        Daily,
        UnlockRule::level(6).with_attribute(Int, 2),
    ),
    // WIS
    habit(
        "wis_meditate",
        "Meditation",
        "Daily meditation to cultivate presence and inner calm.",
        Easy,
        Wis,
        Daily,
        UnlockRule::level(LEVEL_HABITS),
    ),
    habit(
        "wis_journal",
        "Daily Journal",
        "Write in a journal daily to process thoughts and gain clarity.",
        Easy,
        Wis,
        Daily,
        UnlockRule::level(LEVEL_HABITS).with_attribute(Wis, 1),
    ),
    task(
        "wis_digital_detox",
        "Digital Detox Day",
        "Spend a full day without screens to reset your attention.",
        Hard,
        Wis,
        UnlockRule::level(8).with_attribute(Wis, 3),
    ),
    // ART
    project(
        "art_reader",
        "Read a Book",
        "Choose a book and read it cover to cover. Track chapters as subtasks.",
        Art,
        &[],
        UnlockRule::level(LEVEL_PROJECTS).with_attribute(Art, 1),
    ),
    task(
        "art_critic",
        "Write a short review",
        "Reflect on your reading and write a short review to solidify your thoughts.",
        Medium,
        Art,
        UnlockRule::level(LEVEL_PROJECTS)
            .with_attribute(Art, 2)
            .after_project("Read a Book"),
    ),
    habit(
        "art_sketch",
        "Daily Sketch",
        "Sketch something daily to develop your visual creativity.",
        Easy,
        Art,
        Daily,
        UnlockRule::level(LEVEL_HABITS).with_attribute(Art, 1),
    ),
    habit(
        "art_music",
        "Music Practice",
        "Practice an instrument weekly to develop musical skills.",
        Medium,
        Art,
        Weekly,
        UnlockRule::level(5).with_attribute(Art, 2),
    ),
    // HOME
    habit(
        "home_tidy",
        "Daily Tidy",
        "Spend 10 minutes tidying your space daily for a calmer environment.",
        Trivial,
        Home,
        Daily,
        UnlockRule::level(LEVEL_HABITS),
    ),
    project(
        "home_declutter",
        "Home Declutter",
        "Go through each room and declutter systematically.",
        Home,
        &[
            child("Kitchen", Medium),
            child("Bedroom", Medium),
            child("Living Room", Medium),
            child("Storage Areas", Hard),
        ],
        UnlockRule::level(LEVEL_PROJECTS).with_attribute(Home, 2),
    ),
    habit(
        "home_cook",
        "Weekly Cooking",
        "Cook a homemade meal weekly to improve health and save money.",
        Medium,
        Home,
        Weekly,
        UnlockRule::level(LEVEL_HABITS).with_attribute(Home, 1),
    ),
    // OUT
    habit(
        "out_nature",
        "Nature Time",
        "Spend time in nature weekly to recharge and connect with the world.",
        Easy,
        Out,
        Weekly,
        UnlockRule::level(LEVEL_HABITS),
    ),
    habit(
        "out_social",
        "Friend Meetup",
        "Meet with friends weekly to maintain meaningful relationships.",
        Easy,
        Out,
        Weekly,
        UnlockRule::level(LEVEL_HABITS).with_attribute(Out, 1),
    ),
    task(
        "out_explore",
        "Explore New Place",
        "Visit a new place in your city you've never been to before.",
        Medium,
        Out,
        UnlockRule::level(4).with_attribute(Out, 1),
    ),
    // READ
    habit(
        "read_chapter",
        "Daily Reading",
        "Read at least one chapter of a book daily.",
        Easy,
        Read,
        Daily,
        UnlockRule::level(LEVEL_HABITS),
    ),
    project(
        "read_classic",
        "Read a Classic",
        "Read a literary classic that has stood the test of time.",
        Read,
        &[],
        UnlockRule::level(LEVEL_PROJECTS).with_attribute(Read, 2),
    ),
    project(
        "read_nonfiction",
        "Non-Fiction Deep Dive",
        "Read a non-fiction book to expand your knowledge.",
        Read,
        &[],
        UnlockRule::level(LEVEL_PROJECTS).with_attribute(Read, 1),
    ),
    // CINEMA
    habit(
        "cinema_weekly",
        "Weekly Film",
        "Watch a film weekly and reflect on its themes and craft.",
        Easy,
        Cinema,
        Weekly,
        UnlockRule::level(LEVEL_HABITS),
    ),
    project(
        "cinema_director",
        "Director Study",
        "Watch the filmography of a famous director to understand their vision.",
        Cinema,
        &[
            child("Early Work", Easy),
            child("Breakthrough Films", Medium),
            child("Masterpieces", Medium),
            child("Recent Work", Easy),
        ],
        UnlockRule::level(LEVEL_PROJECTS).with_attribute(Cinema, 2),
    ),
    task(
        "cinema_theater",
        "Theater Visit",
        "Experience a film on the big screen at a theater.",
        Medium,
        Cinema,
        UnlockRule::level(3).with_attribute(Cinema, 1),
    ),
    // CAREER
    habit(
        "career_network",
        "Monthly Networking",
        "Reach out to one professional contact monthly to maintain your network.",
        Medium,
        Career,
        Monthly,
        UnlockRule::level(LEVEL_HABITS).with_attribute(Career, 1),
    ),
    project(
        "career_skill",
        "New Skill",
        "Learn a new professional skill through deliberate practice.",
        Career,
        &[
            child("Research & Plan", Easy),
            child("Basic Practice", Medium),
            child("Intermediate Practice", Medium),
            child("Apply in Real Project", Hard),
        ],
        UnlockRule::level(LEVEL_PROJECTS).with_attribute(Career, 2),
    ),
    task(
        "career_resume",
        "Update Resume",
        "Update your resume with recent accomplishments and skills.",
        Medium,
        Career,
        UnlockRule::level(4),
    ),
];

/// The built-in catalog, in display order
pub fn catalog() -> &'static [BlueprintDef] {
    CATALOG
}

pub fn blueprint_def(code: &str) -> Option<&'static BlueprintDef> {
    CATALOG.iter().find(|def| def.code == code)
}

/// Trim and lowercase a user-supplied code
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_lowercase();
    if code.is_empty() {
        return Err(EngineError::Validation("blueprint code is required".to_string()));
    }
    Ok(code)
}

/// Ensure a row per catalog entry and move satisfied `locked` rows to
/// `available`. Never moves anything backwards.
pub(super) fn evaluate_unlocks(repo: &Repo<'_>) -> Result<Vec<String>> {
    let player = load_player(repo)?;
    let mut unlocked = Vec::new();

    for def in CATALOG {
        let status = match repo.get_blueprint(def.code)? {
            Some(row) => row.status,
            None => {
                repo.upsert_blueprint(def.code, BlueprintStatus::Locked)?;
                BlueprintStatus::Locked
            }
        };
        if status != BlueprintStatus::Locked {
            continue;
        }
        if def.unlock.is_met(repo, &player)? {
            repo.upsert_blueprint(def.code, BlueprintStatus::Available)?;
            info!("blueprint {} unlocked", def.code);
            unlocked.push(def.code.to_string());
        }
    }

    Ok(unlocked)
}

pub(super) fn list_blueprints(repo: &Repo<'_>) -> Result<Vec<BlueprintView>> {
    CATALOG
        .iter()
        .map(|def| {
            let status = repo
                .get_blueprint(def.code)?
                .map_or(BlueprintStatus::Locked, |row| row.status);
            Ok(BlueprintView { def, status })
        })
        .collect()
}

/// Instantiate an available blueprint and mark it active. Any failure,
/// including a gated child, leaves everything as it was.
pub(super) fn accept_blueprint(repo: &Repo<'_>, code: &str, now: DateTime<Utc>) -> Result<CreateResult> {
    let code = normalize_code(code)?;
    evaluate_unlocks(repo)?;

    let row = repo
        .get_blueprint(&code)?
        .ok_or_else(|| EngineError::BlueprintNotFound(code.clone()))?;
    let def = blueprint_def(&code).ok_or_else(|| EngineError::BlueprintNotFound(code.clone()))?;
    if row.status != BlueprintStatus::Available {
        return Err(EngineError::BlueprintNotAvailable {
            code,
            status: row.status,
        });
    }

    let result = match def.kind {
        BlueprintKind::Project => create::create_project(
            repo,
            &NewProject::new(def.title).attribute(def.attribute),
            now,
        )?,
        BlueprintKind::Habit => {
            let interval = def.interval.ok_or_else(|| {
                EngineError::Validation(format!("blueprint {} has no habit interval", def.code))
            })?;
            create::create_task(
                repo,
                &NewTask::new(def.title, def.difficulty)
                    .attribute(def.attribute)
                    .habit(HabitSpec::new(interval)),
                now,
            )?
        }
        BlueprintKind::Task => create::create_task(
            repo,
            &NewTask::new(def.title, def.difficulty).attribute(def.attribute),
            now,
        )?,
    };

    for child in def.children {
        debug!("blueprint {}: creating child {:?}", def.code, child.title);
        create::create_task(
            repo,
            &NewTask::new(child.title, child.difficulty)
                .attribute(def.attribute)
                .parent(result.task_id),
            now,
        )?;
    }

    repo.upsert_blueprint(def.code, BlueprintStatus::Active)?;
    info!("blueprint {} accepted as task {}", def.code, result.task_id);
    Ok(result)
}
