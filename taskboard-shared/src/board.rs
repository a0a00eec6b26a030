/// Kanban board grouping

use serde::Serialize;

use crate::models::task::TaskStatus;

/// One board column
#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn<T> {
    pub id: TaskStatus,
    pub label: &'static str,
    pub tasks: Vec<T>,
}

/// Groups items into the five status columns in board order
///
/// Every column is present even when empty; items keep their input order
/// within a column.
pub fn build_board<T, F>(items: Vec<T>, status_of: F) -> Vec<BoardColumn<T>>
where
    F: Fn(&T) -> TaskStatus,
{
    let mut columns: Vec<BoardColumn<T>> = TaskStatus::ALL
        .iter()
        .map(|status| BoardColumn {
            id: *status,
            label: status.label(),
            tasks: Vec::new(),
        })
        .collect();

    for item in items {
        let position = status_of(&item).board_position();
        columns[position].tasks.push(item);
    }

    columns
}
