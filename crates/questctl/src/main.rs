//! Questline Control - CLI front end for the Questline progression engine
//!
//! Every command opens the local database, runs one engine operation and
//! prints the outcome.

mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quest_common::config::QuestConfig;
use quest_common::QuestEngine;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "questctl")]
#[command(about = "Questline - level up by getting things done", long_about = None)]
#[command(version)]
struct Cli {
    /// Database file (overrides QL_DB_PATH and the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task, habit or project
    Add {
        /// Task title
        title: String,

        /// Difficulty 1-5 (trivial..epic)
        #[arg(short, long, default_value_t = 1)]
        diff: i64,

        /// Attribute code or weights, e.g. "str" or "str:50,int:50"
        #[arg(short, long)]
        attr: Option<String>,

        /// Parent task id
        #[arg(short, long)]
        parent: Option<i64>,

        /// Create a project instead of a task
        #[arg(long, conflicts_with = "habit")]
        project: bool,

        /// Create a recurring habit
        #[arg(long)]
        habit: bool,

        /// Habit interval: daily, weekly or monthly
        #[arg(long, default_value = "daily", requires = "habit")]
        interval: String,

        /// Habit tracking window, e.g. "30d", "4w", "2m"
        #[arg(long, requires = "habit")]
        duration: Option<String>,

        /// Completions needed within the window
        #[arg(long, requires = "habit")]
        goal: Option<u32>,
    },

    /// Complete a task, habit or project
    Do {
        /// Task id
        id: i64,
    },

    /// Undo the most recent completion of a task
    Restore {
        /// Task id
        id: i64,
    },

    /// Change a task's difficulty
    Diff {
        /// Task id
        id: i64,

        /// New difficulty 1-5
        difficulty: i64,
    },

    /// Show the task tree
    List {
        /// Include done tasks
        #[arg(short, long)]
        all: bool,
    },

    /// Show level, attributes, gates and open task count
    Status,

    /// List blueprints and their status
    Blueprints {
        /// Include locked entries
        #[arg(short, long)]
        all: bool,
    },

    /// Accept an available blueprint
    Accept {
        /// Blueprint code, e.g. "str_starter"
        code: String,
    },

    /// Show earned and remaining achievements
    Achievements,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = QuestConfig::load().context("failed to load configuration")?;
    logging::init(&config.logging.level);

    let db_path = match cli.db {
        Some(path) => path,
        None => config
            .resolve_db_path()
            .context("failed to resolve database path")?,
    };
    debug!("using database {:?}", db_path);
    let engine = QuestEngine::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    let outcome = match cli.command {
        Commands::Add {
            title,
            diff,
            attr,
            parent,
            project,
            habit,
            interval,
            duration,
            goal,
        } => {
            let opts = commands::AddOptions {
                title,
                difficulty: diff,
                attr,
                parent,
                project,
                habit: habit.then_some(commands::HabitOptions {
                    interval,
                    duration,
                    goal,
                }),
            };
            commands::add(&engine, opts)
        }
        Commands::Do { id } => commands::complete(&engine, id),
        Commands::Restore { id } => commands::restore(&engine, id),
        Commands::Diff { id, difficulty } => commands::set_difficulty(&engine, id, difficulty),
        Commands::List { all } => commands::list(&engine, all),
        Commands::Status => commands::status(&engine),
        Commands::Blueprints { all } => commands::blueprints(&engine, all),
        Commands::Accept { code } => commands::accept(&engine, &code),
        Commands::Achievements => commands::achievements(&engine),
    };

    if let Err(err) = &outcome {
        if let Some(hint) = commands::gate_hint(err) {
            eprintln!("{}", hint);
        }
    }
    outcome
}
