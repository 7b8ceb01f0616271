//! Arena index over the flat task table.
//!
//! Every walk uses an explicit stack with a visited set, so deep or corrupted
//! (cyclic) parent links cannot overflow the stack or loop forever.

use crate::error::{EngineError, Result};
use crate::types::Task;
use std::collections::{HashMap, HashSet};

/// Upper bound on parent hops when computing a depth
pub const MAX_PARENT_HOPS: usize = 10_000;

/// Aggregates over a project's subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubtreeStats {
    /// Sum of `xp_value` over plain-task descendants
    pub volume: u64,
    /// Sum of `xp_value` over plain-task descendants not yet done
    pub remaining_hp: u64,
    /// Plain-task descendants not yet done
    pub undone: usize,
}

pub struct TaskIndex {
    tasks: HashMap<i64, Task>,
    children: HashMap<i64, Vec<i64>>,
    order: Vec<i64>,
}

impl TaskIndex {
    /// Build from rows ordered by id; child lists keep that order
    pub fn build(tasks: Vec<Task>) -> Self {
        let mut index = Self {
            tasks: HashMap::with_capacity(tasks.len()),
            children: HashMap::new(),
            order: Vec::with_capacity(tasks.len()),
        };
        for task in tasks {
            if let Some(parent) = task.parent_id {
                index.children.entry(parent).or_default().push(task.id);
            }
            index.order.push(task.id);
            index.tasks.insert(task.id, task);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn has_children(&self, id: i64) -> bool {
        self.children.get(&id).is_some_and(|c| !c.is_empty())
    }

    pub fn children(&self, id: i64) -> impl Iterator<Item = &Task> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|cid| self.tasks.get(cid))
    }

    /// Tasks with no parent, or whose parent row is missing
    pub fn roots(&self) -> impl Iterator<Item = &Task> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .filter(|t| t.parent_id.map_or(true, |p| !self.tasks.contains_key(&p)))
    }

    /// Distance from `id` to its root (a root is depth 0)
    pub fn depth(&self, id: i64) -> Result<u32> {
        let mut depth = 0u32;
        let mut cur = id;
        for _ in 0..MAX_PARENT_HOPS {
            let task = self.tasks.get(&cur).ok_or(EngineError::TaskNotFound(cur))?;
            match task.parent_id {
                None => return Ok(depth),
                Some(parent) => {
                    depth += 1;
                    cur = parent;
                }
            }
        }
        Err(EngineError::ParentChainTooDeep(id))
    }

    /// Volume and remaining HP below `root`.
    ///
    /// Nested projects are descended into and never counted themselves;
    /// habits are skipped entirely since they recur forever.
    pub fn subtree(&self, root: i64) -> SubtreeStats {
        let mut stats = SubtreeStats::default();
        let mut stack = vec![root];
        let mut seen = HashSet::new();

        while let Some(cur) = stack.pop() {
            if !seen.insert(cur) {
                continue;
            }
            for child in self.children(cur) {
                if child.is_project {
                    stack.push(child.id);
                    continue;
                }
                if child.is_habit {
                    continue;
                }
                stats.volume = stats.volume.saturating_add(child.xp_value);
                if !child.is_done() {
                    stats.undone += 1;
                    stats.remaining_hp = stats.remaining_hp.saturating_add(child.xp_value);
                }
            }
        }
        stats
    }

    /// Open (pending/active) non-project tasks without children
    pub fn open_leaf_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|t| !t.is_project && t.status.is_open() && !self.has_children(t.id))
            .count()
    }

    /// Pre-order walk of the whole forest as `(depth, task)`
    pub fn walk(&self) -> Vec<(u32, &Task)> {
        let mut out = Vec::with_capacity(self.len());
        let mut seen = HashSet::new();
        let mut stack: Vec<(u32, i64)> = self.roots().map(|t| (0, t.id)).collect();
        stack.reverse();

        while let Some((depth, id)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(task) = self.tasks.get(&id) else {
                continue;
            };
            out.push((depth, task));
            let kids: Vec<i64> = self.children(id).map(|c| c.id).collect();
            stack.extend(kids.into_iter().rev().map(|cid| (depth + 1, cid)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Attribute;
    use crate::types::{Difficulty, TaskStatus};
    use chrono::Utc;

    fn task(id: i64, parent_id: Option<i64>, xp_value: u64) -> Task {
        Task {
            id,
            parent_id,
            title: format!("task {}", id),
            description: None,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            due_date: None,
            difficulty: Difficulty::Trivial,
            attribute: Attribute::Wis,
            weights: None,
            xp_value,
            is_project: false,
            is_habit: false,
            habit_interval: None,
            habit_start_date: None,
            habit_end_date: None,
            habit_goal: None,
        }
    }

    fn project(id: i64, parent_id: Option<i64>) -> Task {
        Task {
            is_project: true,
            status: TaskStatus::Active,
            ..task(id, parent_id, 0)
        }
    }

    #[test]
    fn test_depth() {
        let index = TaskIndex::build(vec![task(1, None, 0), task(2, Some(1), 0), task(3, Some(2), 0)]);
        assert_eq!(index.depth(1).unwrap(), 0);
        assert_eq!(index.depth(3).unwrap(), 2);
        assert!(matches!(index.depth(9), Err(EngineError::TaskNotFound(9))));
    }

    #[test]
    fn test_depth_cycle_is_bounded() {
        let index = TaskIndex::build(vec![task(1, Some(2), 0), task(2, Some(1), 0)]);
        assert!(matches!(index.depth(1), Err(EngineError::ParentChainTooDeep(1))));
    }

    #[test]
    fn test_subtree_skips_habits_and_descends_projects() {
        let mut done = task(3, Some(1), 100);
        done.status = TaskStatus::Done;
        let mut habit = task(4, Some(1), 999);
        habit.is_habit = true;

        let index = TaskIndex::build(vec![
            project(1, None),
            task(2, Some(1), 250),
            done,
            habit,
            project(5, Some(1)),
            task(6, Some(5), 50),
        ]);

        let stats = index.subtree(1);
        assert_eq!(stats.volume, 400);
        assert_eq!(stats.remaining_hp, 300);
        assert_eq!(stats.undone, 2);
    }

    #[test]
    fn test_subtree_survives_cycles() {
        let index = TaskIndex::build(vec![project(1, Some(2)), project(2, Some(1)), task(3, Some(2), 10)]);
        let stats = index.subtree(1);
        assert_eq!(stats.volume, 10);
    }

    #[test]
    fn test_open_leaf_count() {
        let mut done = task(4, None, 0);
        done.status = TaskStatus::Done;
        let index = TaskIndex::build(vec![
            task(1, None, 0),
            task(2, Some(1), 0),
            project(3, None),
            done,
        ]);
        // task 1 has a child, the project and the done task don't count
        assert_eq!(index.open_leaf_count(), 1);
    }

    #[test]
    fn test_walk_is_preorder() {
        let index = TaskIndex::build(vec![
            task(1, None, 0),
            task(2, Some(1), 0),
            task(3, None, 0),
            task(4, Some(2), 0),
        ]);
        let ids: Vec<(u32, i64)> = index.walk().into_iter().map(|(d, t)| (d, t.id)).collect();
        assert_eq!(ids, vec![(0, 1), (1, 2), (2, 4), (0, 3)]);
    }
}
