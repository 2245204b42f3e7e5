use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::sync::{FlushOutcome, QueueStatus, QueuedAction, SkipReason, SyncReport};

/// Render how long ago `at` was
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(at);
    if age.num_days() > 0 {
        format!("{} days ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{} hours ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{} minutes ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Format queue status as pretty output
pub fn format_status_pretty(status: &QueueStatus, online: bool) -> String {
    let mut lines = Vec::new();

    lines.push("Offline Queue".bold().to_string());
    lines.push("─".repeat(40));

    let network = if online {
        "online".green()
    } else {
        "offline".yellow()
    };
    lines.push(format!("  Network:    {network}"));

    lines.push(format!(
        "  Pending:    {} {}",
        status.pending,
        if status.pending > 0 {
            "actions waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));

    lines.push(format!(
        "  Failing:    {} {}",
        status.failing,
        if status.failing > 0 {
            "actions need attention".red()
        } else {
            "".normal()
        }
    ));

    if let Some(oldest) = status.oldest_pending {
        lines.push(format!(
            "  Oldest:     {}",
            format_age(oldest, Utc::now()).dimmed()
        ));
    }

    if let Some(error) = &status.last_error {
        lines.push(format!("  Last error: {}", shorten(error, 60).red()));
    }

    if status.pending > 0 {
        lines.push(String::new());
        let hint = if online {
            "Run 'sitesync sync' to apply queued actions"
        } else {
            "Queued actions will be applied once the backend is reachable"
        };
        lines.push(hint.dimmed().to_string());
    }

    lines.join("\n")
}

/// Format queued actions as a table
pub fn format_actions_pretty(actions: &[QueuedAction], limit: usize) -> String {
    if actions.is_empty() {
        return "Queue (0 actions)\n  Nothing waiting to sync".to_string();
    }

    let mut lines = Vec::new();
    lines.push(format!("Queue ({} actions)", actions.len()));
    lines.push("─".repeat(72));
    lines.push(format!(
        "{:<4} {:<8} {:<14} {:<18} {}",
        "#", "Action", "Entity", "Queued", "Target"
    ));
    lines.push("─".repeat(72));

    for (position, action) in actions.iter().enumerate().take(limit) {
        let marker = if action.has_failed() {
            "✗".red()
        } else {
            "⏳".normal()
        };
        lines.push(format!(
            "{:<4} {:<8} {:<14} {:<18} {} {}",
            position + 1,
            action.action_type,
            action.entity_type,
            action.created_at.format("%Y-%m-%d %H:%M").to_string(),
            action.target_id().unwrap_or_else(|| "-".to_string()),
            marker
        ));

        if let Some(error) = &action.error_message {
            lines.push(format!("     {}", shorten(error, 66).red()));
        }
    }

    if actions.len() > limit {
        lines.push(
            format!("… {} more", actions.len() - limit)
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format a freshly queued action
pub fn format_queued_pretty(action: &QueuedAction, status: &QueueStatus) -> String {
    let mut output = format!(
        "{} {} {}\n",
        "Queued".green(),
        action.action_type,
        action.entity_type.bold()
    );
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), action.id));
    output.push_str(&format!("  {}: {}", "Pending".dimmed(), status.pending));
    output
}

fn format_report(report: &SyncReport) -> String {
    let mut lines = Vec::new();

    let failed = report.failed_count().to_string();
    lines.push(format!(
        "Sync finished: {} of {} applied, {} failed",
        report.succeeded().to_string().green(),
        report.total(),
        if report.all_succeeded() {
            failed.normal()
        } else {
            failed.red()
        }
    ));

    for action in &report.applied {
        lines.push(format!(
            "  {} {} {}",
            "✓".green(),
            action.action_type,
            action.entity_type
        ));
    }

    for action in &report.failed {
        lines.push(format!(
            "  {} {} {}: {}",
            "✗".red(),
            action.action_type,
            action.entity_type,
            action.error_message.as_deref().unwrap_or("unknown error").red()
        ));
    }

    lines.join("\n")
}

/// Format the outcome of a flush
pub fn format_outcome_pretty(outcome: &FlushOutcome) -> String {
    match outcome {
        FlushOutcome::Skipped {
            reason: SkipReason::Empty,
        } => "Nothing to sync.".to_string(),
        FlushOutcome::Skipped { reason } => {
            format!("{} {reason}", "Sync skipped:".yellow())
        },
        FlushOutcome::Aborted { reason } => {
            format!("{} {reason}", "Sync aborted:".red().bold())
        },
        FlushOutcome::Completed(report) => format_report(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{ActionType, UserId};
    use chrono::Duration;
    use serde_json::json;

    fn action(payload: serde_json::Value) -> QueuedAction {
        QueuedAction::new(UserId::new("u-1"), "ticket", ActionType::Update, payload)
    }

    #[test]
    fn test_format_age() {
        let now = Utc::now();
        assert_eq!(format_age(now, now), "just now");
        assert_eq!(format_age(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(format_age(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(format_age(now - Duration::days(2), now), "2 days ago");
    }

    #[test]
    fn test_shorten_is_char_safe() {
        assert_eq!(shorten("short", 10), "short");
        assert_eq!(shorten("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_empty_queue_listing() {
        assert!(format_actions_pretty(&[], 20).contains("Nothing waiting"));
    }

    #[test]
    fn test_listing_shows_target_and_error() {
        colored::control::set_override(false);
        let mut failing = action(json!({"id": "t-9"}));
        failing.record_failure("row is locked");

        let out = format_actions_pretty(&[failing, action(json!({"id": "t-10"}))], 1);

        assert!(out.contains("UPDATE"));
        assert!(out.contains("t-9"));
        assert!(out.contains("row is locked"));
        assert!(!out.contains("t-10"));
        assert!(out.contains("1 more"));
    }

    #[test]
    fn test_outcome_rendering() {
        colored::control::set_override(false);
        let empty = FlushOutcome::Skipped {
            reason: SkipReason::Empty,
        };
        assert_eq!(format_outcome_pretty(&empty), "Nothing to sync.");

        let offline = FlushOutcome::Skipped {
            reason: SkipReason::Offline,
        };
        assert_eq!(format_outcome_pretty(&offline), "Sync skipped: offline");

        let aborted = FlushOutcome::Aborted {
            reason: "no signed-in user".to_string(),
        };
        assert!(format_outcome_pretty(&aborted).contains("no signed-in user"));
    }

    #[test]
    fn test_completed_report_rendering() {
        colored::control::set_override(false);
        let user = UserId::new("user-1");
        let done = QueuedAction::new(user.clone(), "ticket", ActionType::Create, json!({"title": "a"}));
        let mut rejected = QueuedAction::new(user, "message", ActionType::Update, json!({"id": "m-1"}));
        rejected.record_failure("Backend rejected request (422): body is required");

        let report = SyncReport {
            applied: vec![done],
            failed: vec![rejected],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let out = format_outcome_pretty(&FlushOutcome::Completed(report));
        assert!(out.starts_with("Sync finished: 1 of 2 applied, 1 failed"));
        assert!(out.contains("✗ UPDATE message: Backend rejected request (422)"));
    }
}
