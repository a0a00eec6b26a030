/// Reminder email rendering

use chrono::NaiveDate;

use super::UserReminders;
use crate::email::EmailMessage;
use crate::models::task::Task;

/// Product name used in email copy
pub const PRODUCT_NAME: &str = "Smart Task Manager";

/// "May 8, 2025"
pub fn display_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Escapes text for inclusion in HTML element content or attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Subject line, e.g. `Task Reminder: 2 Overdue Task(s) + 1 Due Today`
///
/// Parts with a zero count are left out.
pub fn format_subject(group: &UserReminders) -> String {
    let mut parts = Vec::with_capacity(2);
    if !group.overdue.is_empty() {
        parts.push(format!("{} Overdue Task(s)", group.overdue.len()));
    }
    if !group.due_today.is_empty() {
        parts.push(format!("{} Due Today", group.due_today.len()));
    }
    format!("Task Reminder: {}", parts.join(" + "))
}

fn task_section(heading: &str, tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return String::new();
    }

    let rows: String = tasks
        .iter()
        .map(|task| {
            let due = task.due_date.map(display_date).unwrap_or_default();
            format!(
                r#"
        <tr>
          <td style="padding: 12px; border-bottom: 1px solid #eee;">
            <strong>{title}</strong><br/>
            <small style="color: #666;">Due: {due}</small><br/>
            <small style="color: #999;">Priority: {priority}</small>
          </td>
        </tr>"#,
                title = escape_html(&task.title),
                due = due,
                priority = task.priority.as_str(),
            )
        })
        .collect();

    format!(
        r#"
    <div style="margin-bottom: 20px;">
      <h3 style="color: #3B82F6; margin-bottom: 10px;">{heading} ({count})</h3>
      <table style="width: 100%; border-collapse: collapse; background: #f9fafb;">{rows}
      </table>
    </div>"#,
        heading = heading,
        count = tasks.len(),
        rows = rows,
    )
}

/// HTML body of the daily reminder
pub fn format_email(user_name: &str, group: &UserReminders) -> String {
    let name = if user_name.trim().is_empty() {
        "User"
    } else {
        user_name
    };

    format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; background: #f5f5f5; border-radius: 8px;">
  <div style="background: white; padding: 30px; border-radius: 8px;">
    <h1 style="color: #1F2937; margin-bottom: 10px;">Task Reminder</h1>
    <p style="color: #666; margin-bottom: 20px;">Hello <strong>{name}</strong>,</p>
    <p style="color: #666; line-height: 1.6;">You have pending tasks that need your attention:</p>
    {overdue}
    {today}
    <p style="color: #333;">Log in to your <strong>{product}</strong> account to update your tasks.</p>
    <p style="color: #999; font-size: 12px; margin-top: 30px; border-top: 1px solid #eee; padding-top: 20px;">
      This is an automated notification from {product}. Do not reply to this email.
    </p>
  </div>
</div>"#,
        name = escape_html(name),
        overdue = task_section("Overdue Tasks", &group.overdue),
        today = task_section("Due Today", &group.due_today),
        product = PRODUCT_NAME,
    )
}

/// Builds the complete reminder message for one recipient
pub fn reminder_message(to: &str, user_name: &str, group: &UserReminders) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format_subject(group),
        html: format_email(user_name, group),
    }
}

/// Message sent by the "send test email" endpoint
pub fn test_message(to: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Test Notification from {}", PRODUCT_NAME),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; padding: 20px; border: 1px solid #eee; border-radius: 5px;">
  <h1 style="color: #3B82F6;">It works!</h1>
  <p>This is a test notification from your {} app.</p>
  <p>Email delivery is configured correctly.</p>
</div>"#,
            PRODUCT_NAME
        ),
    }
}
