/// Daily reminder email run
///
/// One run scans open tasks due before tomorrow, groups them by owner and
/// sends each owner a single email. A failure for one owner is counted and
/// logged; it never stops the run.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::format::reminder_message;
use super::group_for_notification;
use crate::calendar;
use crate::email::{EmailMessage, Mailer};
use crate::models::task::Task;
use crate::models::user::User;

/// Default number of emails in flight at once
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Outcome counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRunSummary {
    /// Owners with at least one overdue or due-today task
    pub users: usize,
    pub sent: usize,
    pub failed: usize,
    /// Owners that no longer exist or have no email address
    pub skipped: usize,
}

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Failed to load due tasks: {0}")]
    Database(#[from] sqlx::Error),
}

/// An email addressed to one owner
#[derive(Debug, Clone)]
pub struct OutgoingReminder {
    pub user_id: Uuid,
    pub message: EmailMessage,
}

/// The reminder run and its dependencies
#[derive(Clone)]
pub struct ReminderJob {
    db: PgPool,
    mailer: Arc<dyn Mailer>,
    offset: FixedOffset,
    max_in_flight: usize,
}

impl ReminderJob {
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>, offset: FixedOffset) -> Self {
        Self {
            db,
            mailer,
            offset,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Runs for today at the configured offset
    pub async fn run(&self) -> Result<ReminderRunSummary, ReminderError> {
        self.run_for(calendar::today(self.offset)).await
    }

    /// Runs as if `today` were the current day
    ///
    /// # Errors
    ///
    /// Only the initial task scan can fail the run. Owner lookups and sends
    /// are counted in the summary instead.
    pub async fn run_for(&self, today: NaiveDate) -> Result<ReminderRunSummary, ReminderError> {
        tracing::info!(%today, "Starting reminder run");

        let tomorrow = today.succ_opt().unwrap_or(today);
        let tasks = Task::list_due_before(&self.db, tomorrow).await?;
        let groups = group_for_notification(tasks, today);

        let mut summary = ReminderRunSummary {
            users: groups.len(),
            ..Default::default()
        };

        if groups.is_empty() {
            tracing::info!("No tasks due today or overdue, nothing to send");
            return Ok(summary);
        }

        let mut outgoing = Vec::with_capacity(groups.len());
        for (user_id, group) in groups {
            match User::find_by_id(&self.db, user_id).await {
                Ok(Some(user)) if !user.email.trim().is_empty() => {
                    outgoing.push(OutgoingReminder {
                        user_id,
                        message: reminder_message(&user.email, &user.name, &group),
                    });
                }
                Ok(_) => {
                    tracing::warn!(%user_id, "Reminder owner not found or has no email");
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(%user_id, error = %e, "Failed to load reminder owner");
                    summary.failed += 1;
                }
            }
        }

        let delivered = dispatch(self.mailer.as_ref(), outgoing, self.max_in_flight).await;
        summary.sent += delivered.sent;
        summary.failed += delivered.failed;

        tracing::info!(
            users = summary.users,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "Reminder run complete"
        );

        Ok(summary)
    }
}

/// Sends every reminder with at most `max_in_flight` requests outstanding
///
/// Only `sent` and `failed` are filled in.
pub async fn dispatch(
    mailer: &dyn Mailer,
    outgoing: Vec<OutgoingReminder>,
    max_in_flight: usize,
) -> ReminderRunSummary {
    let results: Vec<(Uuid, bool)> = stream::iter(outgoing)
        .map(|reminder| async move {
            match mailer.send(&reminder.message).await {
                Ok(receipt) => {
                    tracing::info!(
                        user_id = %reminder.user_id,
                        to = %reminder.message.to,
                        message_id = ?receipt.message_id,
                        "Reminder sent"
                    );
                    (reminder.user_id, true)
                }
                Err(e) => {
                    tracing::error!(
                        user_id = %reminder.user_id,
                        to = %reminder.message.to,
                        error = %e,
                        "Reminder send failed"
                    );
                    (reminder.user_id, false)
                }
            }
        })
        .buffer_unordered(max_in_flight.max(1))
        .collect()
        .await;

    let sent = results.iter().filter(|(_, ok)| *ok).count();
    ReminderRunSummary {
        sent,
        failed: results.len() - sent,
        ..Default::default()
    }
}
