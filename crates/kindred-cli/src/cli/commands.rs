use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use kindred_core::{
    CleanupContext, IntakeOutcome, NotificationCenter, NotificationInput, NotificationType, Payload,
};
use serde_json::{json, Value};

/// One CLI invocation's worth of work against the notification center
#[derive(Debug, Clone)]
pub enum CliCommand {
    /// Run an event through the intake pipeline
    Emit {
        kind: String,
        title: String,
        body: String,
        payload: Payload,
    },
    /// Visible notifications
    List,
    /// Every stored entry, read/expired/hidden included
    Dump,
    /// Badge count
    Count,
    MarkRead { id: String },
    MarkAllRead,
    MarkKey { key: String },
    MarkGroup { group_id: String },
    RemoveCounterpart { counterpart_id: String, kind: String },
    /// Drop relationship entries whose counterpart is not in `valid`
    RemoveOrphaned { valid: Vec<String> },
    Sweep,
}

/// Parse a `key=value` payload field
pub fn parse_field(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Invalid field {:?}, expected key=value", raw);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid field {:?}, key is empty", raw);
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn execute(center: &NotificationCenter, command: CliCommand) -> Result<Value> {
    let result = match command {
        CliCommand::Emit {
            kind,
            title,
            body,
            payload,
        } => {
            let input = NotificationInput::new(NotificationType::from(kind.as_str()), title, body)
                .with_payload(payload);
            match center.emit_input(input) {
                IntakeOutcome::Created(id) => json!({ "outcome": "created", "id": id }),
                IntakeOutcome::Merged(id) => json!({ "outcome": "merged", "id": id }),
                IntakeOutcome::RateLimited => json!({ "outcome": "rate_limited" }),
                IntakeOutcome::PhaseBlocked => json!({ "outcome": "phase_blocked" }),
            }
        }
        CliCommand::List => {
            serde_json::to_value(center.list()).context("Failed to serialize notifications")?
        }
        CliCommand::Dump => serde_json::to_value(center.entries().as_ref())
            .context("Failed to serialize notifications")?,
        CliCommand::Count => json!({ "unseenCount": center.unseen_count() }),
        CliCommand::MarkRead { id } => {
            center.mark_read(&id);
            json!({ "unseenCount": center.unseen_count() })
        }
        CliCommand::MarkAllRead => {
            center.mark_all_read();
            json!({ "unseenCount": center.unseen_count() })
        }
        CliCommand::MarkKey { key } => {
            center.mark_read_by_dedupe_key(&key);
            json!({ "unseenCount": center.unseen_count() })
        }
        CliCommand::MarkGroup { group_id } => {
            center.mark_read_for_group(&group_id);
            json!({ "unseenCount": center.unseen_count() })
        }
        CliCommand::RemoveCounterpart { counterpart_id, kind } => {
            let kind = NotificationType::from(kind.as_str());
            let removed = center.remove_for_counterpart(&counterpart_id, kind);
            json!({ "removed": removed })
        }
        CliCommand::RemoveOrphaned { valid } => {
            let valid: HashSet<String> = valid.into_iter().collect();
            let removed = center.remove_orphaned(&valid, CleanupContext::Runtime);
            json!({ "removed": removed })
        }
        CliCommand::Sweep => json!({ "removed": center.sweep() }),
    };

    if let Some(e) = center.take_last_error() {
        bail!("Failed to persist notifications: {}", e);
    }
    Ok(result)
}

/// Serialize a command result for stdout
pub fn render(value: &Value, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    out.context("Failed to serialize output")
}
