/// Due-date classification and reminders
///
/// - [`due_status`]: the badge shown next to each task
/// - [`upcoming_alerts`]: in-app reminders for tasks due soon or just overdue
/// - [`group_for_notification`]: per-owner buckets for the reminder email
/// - [`job::ReminderJob`]: the daily email run

pub mod format;
pub mod job;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::task::{Task, TaskStatus};

pub use job::{ReminderError, ReminderJob, ReminderRunSummary};

/// Overdue tasks keep producing in-app alerts for this many days
pub const OVERDUE_ALERT_DAYS: i64 = 2;

/// Due-date badge for an open task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    Today,
    Tomorrow,
    Future { days: i64 },
}

/// Classifies a due date relative to `today`
///
/// Returns None for tasks without a due date and for done tasks.
pub fn due_status(
    due_date: Option<NaiveDate>,
    status: TaskStatus,
    today: NaiveDate,
) -> Option<DueStatus> {
    if status.is_done() {
        return None;
    }
    let days = (due_date? - today).num_days();
    Some(match days {
        d if d < 0 => DueStatus::Overdue,
        0 => DueStatus::Today,
        1 => DueStatus::Tomorrow,
        d => DueStatus::Future { days: d },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertKind {
    DueToday,
    DueTomorrow,
    Overdue { days: i64 },
}

/// In-app reminder for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderAlert {
    pub task_id: Uuid,
    pub title: String,
    pub due_date: NaiveDate,
    #[serde(flatten)]
    pub kind: AlertKind,
    /// Short heading ("Task Due Today!")
    pub headline: String,
    /// One-sentence body
    pub message: String,
}

/// Selects open tasks that warrant an in-app reminder today
///
/// Due today, due tomorrow, or overdue by at most
/// [`OVERDUE_ALERT_DAYS`]. Output keeps input order.
pub fn upcoming_alerts(tasks: &[Task], today: NaiveDate) -> Vec<ReminderAlert> {
    tasks
        .iter()
        .filter(|task| !task.status.is_done())
        .filter_map(|task| {
            let due = task.due_date?;
            let days = (due - today).num_days();

            let (kind, headline, message) = match days {
                0 => (
                    AlertKind::DueToday,
                    "Task Due Today!".to_string(),
                    format!("Your task \"{}\" is due today. Don't forget!", task.title),
                ),
                1 => (
                    AlertKind::DueTomorrow,
                    "Task Due Tomorrow!".to_string(),
                    format!("Your task \"{}\" is due tomorrow.", task.title),
                ),
                d if d < 0 && -d <= OVERDUE_ALERT_DAYS => {
                    let overdue = -d;
                    (
                        AlertKind::Overdue { days: overdue },
                        format!(
                            "Task Overdue ({} day{})!",
                            overdue,
                            if overdue == 1 { "" } else { "s" }
                        ),
                        format!(
                            "Your task \"{}\" was due on {}.",
                            task.title,
                            format::display_date(due)
                        ),
                    )
                }
                _ => return None,
            };

            Some(ReminderAlert {
                task_id: task.id,
                title: task.title.clone(),
                due_date: due,
                kind,
                headline,
                message,
            })
        })
        .collect()
}

/// One owner's share of a reminder run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserReminders {
    pub overdue: Vec<Task>,
    pub due_today: Vec<Task>,
}

impl UserReminders {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_today.is_empty()
    }
}

/// Groups open tasks due on or before `today` by owner
///
/// Tasks due after today and done tasks are dropped.
pub fn group_for_notification(
    tasks: Vec<Task>,
    today: NaiveDate,
) -> BTreeMap<Uuid, UserReminders> {
    let mut groups: BTreeMap<Uuid, UserReminders> = BTreeMap::new();

    for task in tasks {
        if task.status.is_done() || task.completed_at.is_some() {
            continue;
        }
        let Some(due) = task.due_date else {
            continue;
        };

        if due < today {
            groups.entry(task.user_id).or_default().overdue.push(task);
        } else if due == today {
            groups.entry(task.user_id).or_default().due_today.push(task);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskPriority;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(owner: Uuid, title: &str, status: TaskStatus, due: Option<NaiveDate>) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: owner,
            title: title.to_string(),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            due_date: due,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_due_status() {
        let today = date(2025, 5, 10);
        let open = TaskStatus::InProgress;

        assert_eq!(due_status(Some(date(2025, 5, 9)), open, today), Some(DueStatus::Overdue));
        assert_eq!(due_status(Some(today), open, today), Some(DueStatus::Today));
        assert_eq!(due_status(Some(date(2025, 5, 11)), open, today), Some(DueStatus::Tomorrow));
        assert_eq!(
            due_status(Some(date(2025, 5, 15)), open, today),
            Some(DueStatus::Future { days: 5 })
        );
        assert_eq!(due_status(None, open, today), None);
        assert_eq!(due_status(Some(date(2025, 5, 1)), TaskStatus::Done, today), None);
    }

    #[test]
    fn test_due_status_serialization() {
        let json = serde_json::to_value(DueStatus::Future { days: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "future", "days": 3}));

        let json = serde_json::to_value(DueStatus::Overdue).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "overdue"}));
    }

    #[test]
    fn test_upcoming_alerts_window() {
        let today = date(2025, 5, 10);
        let owner = Uuid::new_v4();
        let tasks = vec![
            task(owner, "today", TaskStatus::Todo, Some(today)),
            task(owner, "tomorrow", TaskStatus::Todo, Some(date(2025, 5, 11))),
            task(owner, "later", TaskStatus::Todo, Some(date(2025, 5, 12))),
            task(owner, "yesterday", TaskStatus::Review, Some(date(2025, 5, 9))),
            task(owner, "two-days", TaskStatus::Blocked, Some(date(2025, 5, 8))),
            task(owner, "stale", TaskStatus::Todo, Some(date(2025, 5, 7))),
            task(owner, "finished", TaskStatus::Done, Some(today)),
            task(owner, "undated", TaskStatus::Todo, None),
        ];

        let alerts = upcoming_alerts(&tasks, today);
        let titles: Vec<_> = alerts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["today", "tomorrow", "yesterday", "two-days"]);

        assert_eq!(alerts[0].kind, AlertKind::DueToday);
        assert_eq!(alerts[1].kind, AlertKind::DueTomorrow);
        assert_eq!(alerts[2].kind, AlertKind::Overdue { days: 1 });
        assert_eq!(alerts[2].headline, "Task Overdue (1 day)!");
        assert_eq!(alerts[3].headline, "Task Overdue (2 days)!");
        assert_eq!(alerts[3].message, "Your task \"two-days\" was due on May 8, 2025.");
    }

    #[test]
    fn test_group_for_notification() {
        let today = date(2025, 5, 10);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let mut completed = task(alice, "completed-flag", TaskStatus::Review, Some(today));
        completed.completed_at = Some(Utc::now());

        let tasks = vec![
            task(alice, "a-overdue", TaskStatus::Todo, Some(date(2025, 5, 1))),
            task(alice, "a-today", TaskStatus::InProgress, Some(today)),
            task(bob, "b-today", TaskStatus::Todo, Some(today)),
            task(bob, "b-future", TaskStatus::Todo, Some(date(2025, 5, 11))),
            task(bob, "b-done", TaskStatus::Done, Some(date(2025, 5, 1))),
            completed,
        ];

        let groups = group_for_notification(tasks, today);
        assert_eq!(groups.len(), 2);

        let a = &groups[&alice];
        assert_eq!(a.overdue.len(), 1);
        assert_eq!(a.due_today.len(), 1);
        assert_eq!(a.due_today[0].title, "a-today");

        let b = &groups[&bob];
        assert!(b.overdue.is_empty());
        assert_eq!(b.due_today.len(), 1);
        assert!(!b.is_empty());
    }
}
