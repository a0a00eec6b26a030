/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `APP_UTC_OFFSET_MINUTES`: Offset the daily trigger and "today" use (default: 0)
/// - `REMINDER_HOUR` / `REMINDER_MINUTE`: Trigger time of day (default: 09:00)
/// - `REMINDER_RUN_ON_STARTUP`: Run once before the first scheduled trigger (default: false)
/// - `REMINDER_MAX_IN_FLIGHT`: Concurrent reminder sends (default: 4)
/// - `SENDGRID_API_KEY` / `SENDER_EMAIL`: Email delivery

use chrono::FixedOffset;
use std::env;
use std::str::FromStr;
use taskboard_shared::calendar;
use taskboard_shared::email::EmailConfig;
use taskboard_shared::reminders::job::DEFAULT_MAX_IN_FLIGHT;

use crate::scheduler::DailySchedule;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub schedule: DailySchedule,
    pub run_on_startup: bool,
    pub max_in_flight: usize,
    pub email: EmailConfig,
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        None => Ok(default),
    }
}

fn parse_offset(minutes: i32) -> anyhow::Result<FixedOffset> {
    calendar::offset_from_minutes(minutes).ok_or_else(|| {
        anyhow::anyhow!(
            "APP_UTC_OFFSET_MINUTES must be between {} and {}, got {}",
            calendar::MIN_OFFSET_MINUTES,
            calendar::MAX_OFFSET_MINUTES,
            minutes
        )
    })
}

impl WorkerConfig {
    /// Loads configuration from environment variables (and `.env`)
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 10u32)?;

        let offset = parse_offset(parse_var("APP_UTC_OFFSET_MINUTES", 0i32)?)?;
        let hour = parse_var("REMINDER_HOUR", 9u32)?;
        let minute = parse_var("REMINDER_MINUTE", 0u32)?;
        let schedule = DailySchedule::new(hour, minute, offset)?;

        let run_on_startup = parse_var("REMINDER_RUN_ON_STARTUP", false)?;
        let max_in_flight = parse_var("REMINDER_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT)?;
        if max_in_flight == 0 {
            anyhow::bail!("REMINDER_MAX_IN_FLIGHT must be at least 1");
        }

        Ok(WorkerConfig {
            database_url,
            max_connections,
            schedule,
            run_on_startup,
            max_in_flight,
            email: EmailConfig::from_env(),
        })
    }
}
