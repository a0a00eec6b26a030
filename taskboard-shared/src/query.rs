/// Search, filter and sort over a user's task list
///
/// The API caches a user's full list and answers every listing from it, so
/// these run in memory rather than in SQL.

use serde::Deserialize;

use crate::models::task::{Task, TaskPriority, TaskStatus};

/// Sort order for task listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskSort {
    /// Most recently created first
    #[default]
    Newest,
    /// High priority first, ties newest first
    PriorityHigh,
    /// Low priority first, ties newest first
    PriorityLow,
    /// Earliest due date first, undated last
    DueDate,
    /// Board order (To Do … Done)
    Status,
}

/// A listing request: optional search text, filters and a sort
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub search: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub sort: TaskSort,
}

impl TaskQuery {
    /// Whether `task` passes the search and filters
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    /// Filters and sorts `tasks`
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        let mut tasks: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        sort_tasks(&mut tasks, self.sort);
        tasks
    }
}

/// Sorts in place; every order is stable and breaks ties newest first
pub fn sort_tasks(tasks: &mut [Task], sort: TaskSort) {
    tasks.sort_by(|a, b| {
        let primary = match sort {
            TaskSort::Newest => std::cmp::Ordering::Equal,
            TaskSort::PriorityHigh => b.priority.weight().cmp(&a.priority.weight()),
            TaskSort::PriorityLow => a.priority.weight().cmp(&b.priority.weight()),
            TaskSort::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            },
            TaskSort::Status => a.status.board_position().cmp(&b.status.board_position()),
        };
        primary.then_with(|| b.created_at.cmp(&a.created_at))
    });
}
