// Append-only activity logs: audit trail, agent activities, reminders.

use anyhow::Result;
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::models::{AgentActivity, AgentActivityType, AuditLog, ReminderLog};

use super::AppState;

pub async fn log_audit_action(
    state: &AppState,
    admin_id: &str,
    action: &str,
    details: Option<Document>,
) -> Result<()> {
    state
        .audit_logs
        .insert_one(AuditLog {
            id: None,
            admin_id: admin_id.to_string(),
            action: action.to_string(),
            details,
            timestamp: DateTime::from_system_time(SystemTime::now()),
        })
        .await?;
    Ok(())
}

pub async fn list_audit_logs(state: &AppState, limit: i64) -> Result<Vec<AuditLog>> {
    let mut cursor = state
        .audit_logs
        .find(doc! {})
        .sort(doc! { "timestamp": -1 })
        .limit(limit)
        .await?;
    let mut items = Vec::new();
    while let Some(log) = cursor.try_next().await? {
        items.push(log);
    }
    Ok(items)
}

pub async fn log_agent_activity(
    state: &AppState,
    agent_id: &str,
    activity_type: AgentActivityType,
    trader_id: Option<String>,
    details: Option<Document>,
) -> Result<()> {
    state
        .agent_activities
        .insert_one(AgentActivity {
            id: None,
            agent_id: agent_id.to_string(),
            activity_type,
            trader_id,
            details,
            timestamp: DateTime::from_system_time(SystemTime::now()),
        })
        .await?;
    Ok(())
}

pub async fn list_agent_activities(
    state: &AppState,
    agent_id: &str,
    limit: i64,
) -> Result<Vec<AgentActivity>> {
    let mut cursor = state
        .agent_activities
        .find(doc! { "agent_id": agent_id })
        .sort(doc! { "timestamp": -1 })
        .limit(limit)
        .await?;
    let mut items = Vec::new();
    while let Some(activity) = cursor.try_next().await? {
        items.push(activity);
    }
    Ok(items)
}

#[allow(clippy::too_many_arguments)]
pub async fn log_reminder(
    state: &AppState,
    user_id: &str,
    debt_id: &ObjectId,
    recipient: &str,
    message: &str,
    send_type: &str,
    api_response: Option<String>,
) -> Result<()> {
    state
        .reminder_logs
        .insert_one(ReminderLog {
            id: None,
            user_id: user_id.to_string(),
            debt_id: *debt_id,
            recipient: recipient.to_string(),
            message: message.to_string(),
            send_type: send_type.to_string(),
            api_response,
            timestamp: DateTime::from_system_time(SystemTime::now()),
        })
        .await?;
    Ok(())
}
