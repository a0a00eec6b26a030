/// Daily wall-clock scheduler
///
/// Fires a [`Job`] once a day at a fixed local time of a fixed UTC offset.
/// Runs are sequential: the next trigger is computed only after the current
/// run returns, and triggers missed while a run was in progress (or while
/// the worker was down) are not caught up.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use chrono::FixedOffset;
/// # use taskboard_worker::scheduler::{DailySchedule, Job, Scheduler};
/// # async fn example(job: Arc<dyn Job>) -> anyhow::Result<()> {
/// let offset = FixedOffset::east_opt(0).unwrap();
/// let scheduler = Scheduler::new(DailySchedule::new(9, 0, offset)?, job);
///
/// let token = scheduler.shutdown_token();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     token.cancel();
/// });
///
/// scheduler.run().await;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use taskboard_shared::reminders::job::ReminderJob;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Work fired by the scheduler
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl Job for ReminderJob {
    fn name(&self) -> &'static str {
        "task_reminders"
    }

    async fn run(&self) -> anyhow::Result<()> {
        let summary = ReminderJob::run(self).await?;
        tracing::info!(
            users = summary.users,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "Reminder run finished"
        );
        Ok(())
    }
}

/// A time of day at a fixed UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
    offset: FixedOffset,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32, offset: FixedOffset) -> anyhow::Result<Self> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
            anyhow::anyhow!("Invalid reminder time {:02}:{:02}", hour, minute)
        })?;
        Ok(Self { time, offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The first trigger strictly after `now`
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.offset).date_naive();
        let candidate = self
            .offset
            .from_local_datetime(&local_date.and_time(self.time))
            .single()
            .map(|local| local.with_timezone(&Utc))
            // A fixed offset always maps a local time to exactly one instant
            .unwrap_or(now);

        if candidate > now {
            candidate
        } else {
            candidate + Duration::days(1)
        }
    }
}

impl std::fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "daily at {} {}", self.time.format("%H:%M"), self.offset)
    }
}

pub struct Scheduler {
    schedule: DailySchedule,
    job: Arc<dyn Job>,
    run_on_startup: bool,
    shutdown_token: CancellationToken,
}

impl Scheduler {
    pub fn new(schedule: DailySchedule, job: Arc<dyn Job>) -> Self {
        Self {
            schedule,
            job,
            run_on_startup: false,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Runs the job once as soon as [`Scheduler::run`] starts
    pub fn with_run_on_startup(mut self, run_on_startup: bool) -> Self {
        self.run_on_startup = run_on_startup;
        self
    }

    /// Gets shutdown token
    ///
    /// Cancelling it stops the loop between runs; a run in progress is
    /// allowed to finish.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs until the shutdown token is cancelled
    pub async fn run(&self) {
        tracing::info!(
            job = self.job.name(),
            schedule = %self.schedule,
            "Scheduler starting"
        );

        if self.run_on_startup && !self.shutdown_token.is_cancelled() {
            self.fire().await;
        }

        // Never schedule at or before the previous trigger, even if the wall
        // clock reads slightly early when the sleep ends.
        let mut previous: Option<DateTime<Utc>> = None;

        loop {
            let now = Utc::now();
            let from = previous.map_or(now, |prev| prev.max(now));
            let next = self.schedule.next_run_after(from);
            let delay = (next - now).to_std().unwrap_or_default();

            tracing::debug!(job = self.job.name(), next_run = %next, "Waiting for next trigger");

            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = sleep(delay) => {}
            }

            previous = Some(next);
            self.fire().await;

            if self.shutdown_token.is_cancelled() {
                break;
            }
        }

        tracing::info!(job = self.job.name(), "Scheduler shut down");
    }

    async fn fire(&self) {
        tracing::info!(job = self.job.name(), "Running scheduled job");
        if let Err(e) = self.job.run().await {
            tracing::error!(job = self.job.name(), error = %e, "Scheduled job failed");
        }
    }
}
