/// Completion statistics for a user's tasks
///
/// Everything here is a single pass over the task list. A task counts as
/// completed on the local calendar day of [`Task::completion_instant`].

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::calendar::local_date;
use crate::models::task::{Task, TaskStatus};

/// How a completed task's finish relates to its due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTiming {
    Early,
    OnTime,
    Late,
}

/// Classifies a completion against an optional due date
///
/// A task without a due date is always on time.
pub fn completion_timing(due_date: Option<NaiveDate>, completed_on: NaiveDate) -> CompletionTiming {
    match due_date {
        None => CompletionTiming::OnTime,
        Some(due) if completed_on < due => CompletionTiming::Early,
        Some(due) if completed_on == due => CompletionTiming::OnTime,
        Some(_) => CompletionTiming::Late,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub blocked: usize,
    pub review: usize,
    pub done: usize,
}

impl StatusCounts {
    fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Blocked => self.blocked += 1,
            TaskStatus::Review => self.review += 1,
            TaskStatus::Done => self.done += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimingCounts {
    pub early: usize,
    pub on_time: usize,
    pub late: usize,
}

impl TimingCounts {
    fn record(&mut self, timing: CompletionTiming) {
        match timing {
            CompletionTiming::Early => self.early += 1,
            CompletionTiming::OnTime => self.on_time += 1,
            CompletionTiming::Late => self.late += 1,
        }
    }
}

/// Whole-number percentages, rounded half away from zero
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Percentages {
    /// Done tasks out of all tasks
    pub completion: u32,
    /// Early completions out of done tasks
    pub early: u32,
    pub on_time: u32,
    pub late: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    /// Consecutive completion days ending today (0 if none today)
    pub current: u32,
    /// Longest run of consecutive completion days
    pub longest: u32,
}

/// Completions on one day of the trailing week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCompletions {
    pub date: NaiveDate,
    /// Short weekday name ("Mon")
    pub label: String,
    pub count: usize,
}

/// Completions in one week of the current month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyCompletions {
    /// 1-based week of month, `ceil(day / 7)`
    pub week: u32,
    /// "Week N"
    pub label: String,
    pub count: usize,
}

/// Full statistics report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub by_status: StatusCounts,
    pub timing: TimingCounts,
    pub percentages: Percentages,
    pub streaks: Streaks,
    pub last_seven_days: Vec<DailyCompletions>,
    pub this_month: Vec<WeeklyCompletions>,
}

/// Computes the statistics report for `tasks`
///
/// `today` and `offset` must describe the same local calendar.
pub fn compute(tasks: &[Task], today: NaiveDate, offset: FixedOffset) -> TaskStats {
    let mut by_status = StatusCounts::default();
    let mut timing = TimingCounts::default();
    let mut completion_days: Vec<NaiveDate> = Vec::new();

    for task in tasks {
        by_status.record(task.status);

        if let Some(instant) = task.completion_instant() {
            let completed_on = local_date(instant, offset);
            timing.record(completion_timing(task.due_date, completed_on));
            completion_days.push(completed_on);
        }
    }

    let done = by_status.done;
    let percentages = Percentages {
        completion: percent(done, tasks.len()),
        early: percent(timing.early, done),
        on_time: percent(timing.on_time, done),
        late: percent(timing.late, done),
    };

    let distinct: BTreeSet<NaiveDate> = completion_days.iter().copied().collect();
    let streaks = Streaks {
        current: current_streak(&distinct, today),
        longest: longest_streak(&distinct),
    };

    TaskStats {
        total: tasks.len(),
        by_status,
        timing,
        percentages,
        streaks,
        last_seven_days: last_seven_days(&completion_days, today),
        this_month: month_buckets(&completion_days, today),
    }
}

/// `part / whole` as a rounded percentage, 0 when `whole` is 0
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// Consecutive completion days ending today
///
/// Zero unless something was completed today.
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);

    while let Some(day) = cursor {
        if !days.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.pred_opt();
    }

    streak
}

/// Longest run of consecutive days in `days`
pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == *day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    longest
}

fn last_seven_days(completion_days: &[NaiveDate], today: NaiveDate) -> Vec<DailyCompletions> {
    (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            DailyCompletions {
                date,
                label: date.format("%a").to_string(),
                count: completion_days.iter().filter(|d| **d == date).count(),
            }
        })
        .collect()
}

fn month_buckets(completion_days: &[NaiveDate], today: NaiveDate) -> Vec<WeeklyCompletions> {
    let mut counts = [0usize; 5];

    for day in completion_days
        .iter()
        .filter(|d| d.year() == today.year() && d.month() == today.month())
    {
        let week = ((day.day() + 6) / 7) as usize;
        counts[week - 1] += 1;
    }

    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(i, count)| WeeklyCompletions {
            week: i as u32 + 1,
            label: format!("Week {}", i + 1),
            count: *count,
        })
        .collect()
}
