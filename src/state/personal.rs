// Persistence for the personal-finance tools. One document per submission,
// owned by a user id or an anonymous session id.

use anyhow::Result;
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc};
use std::time::SystemTime;

use crate::models::{
    Bill, BillFrequency, BillStatus, Budget, EmergencyFundRecord, Feedback, HealthScoreRecord,
    LearningModule, LearningProgress, NetWorthRecord, QuizResult, ToolUsage,
};

use super::AppState;

/// Filter matching documents owned by the current visitor.
pub fn owner_filter(user_id: Option<&str>, session_id: &str) -> Document {
    match user_id {
        Some(uid) => doc! { "user_id": uid },
        None => doc! { "session_id": session_id },
    }
}

pub async fn log_tool_usage(
    state: &AppState,
    tool_name: &str,
    user_id: Option<&str>,
    session_id: &str,
    action: &str,
) -> Result<()> {
    state
        .tool_usage
        .insert_one(ToolUsage {
            id: None,
            tool_name: tool_name.to_string(),
            user_id: user_id.map(str::to_string),
            session_id: session_id.to_string(),
            action: action.to_string(),
            timestamp: DateTime::from_system_time(SystemTime::now()),
        })
        .await?;
    Ok(())
}

pub async fn insert_budget(state: &AppState, budget: &Budget) -> Result<()> {
    state.budgets.insert_one(budget).await?;
    Ok(())
}

pub async fn latest_budget(
    state: &AppState,
    user_id: Option<&str>,
    session_id: &str,
) -> Result<Option<Budget>> {
    state
        .budgets
        .find_one(owner_filter(user_id, session_id))
        .sort(doc! { "created_at": -1 })
        .await
        .map_err(Into::into)
}

pub async fn insert_bill(state: &AppState, bill: &Bill) -> Result<()> {
    state.bills.insert_one(bill).await?;
    Ok(())
}

pub async fn list_bills(
    state: &AppState,
    user_id: Option<&str>,
    session_id: &str,
) -> Result<Vec<Bill>> {
    let mut cursor = state
        .bills
        .find(owner_filter(user_id, session_id))
        .sort(doc! { "due_date": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(bill) = cursor.try_next().await? {
        items.push(bill);
    }
    Ok(items)
}

pub async fn get_bill(state: &AppState, id: &str) -> Result<Option<Bill>> {
    state
        .bills
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

/// Mark a bill paid. Recurring bills roll forward to the next due date and
/// return to unpaid; one-time bills stay paid.
pub async fn mark_bill_paid(state: &AppState, bill: &Bill) -> Result<()> {
    match bill.frequency {
        BillFrequency::OneTime => {
            state
                .bills
                .update_one(
                    doc! { "_id": &bill.id },
                    doc! { "$set": { "status": BillStatus::Paid.as_str() } },
                )
                .await?;
        }
        _ => {
            let next = next_due_date(bill.due_date, bill.frequency);
            state
                .bills
                .update_one(
                    doc! { "_id": &bill.id },
                    doc! { "$set": {
                        "status": BillStatus::Unpaid.as_str(),
                        "due_date": next,
                    } },
                )
                .await?;
        }
    }
    Ok(())
}

pub async fn delete_bill(state: &AppState, id: &str) -> Result<()> {
    state.bills.delete_one(doc! { "_id": id }).await?;
    Ok(())
}

pub fn next_due_date(due_date: DateTime, frequency: BillFrequency) -> DateTime {
    let days = match frequency {
        BillFrequency::Weekly => 7,
        BillFrequency::Monthly => 30,
        BillFrequency::Quarterly => 90,
        BillFrequency::OneTime => 0,
    };
    DateTime::from_millis(due_date.timestamp_millis() + days * 24 * 60 * 60 * 1000)
}

pub async fn insert_net_worth(state: &AppState, record: &NetWorthRecord) -> Result<()> {
    state.net_worth_data.insert_one(record).await?;
    Ok(())
}

pub async fn latest_net_worth(
    state: &AppState,
    user_id: Option<&str>,
    session_id: &str,
) -> Result<Option<NetWorthRecord>> {
    state
        .net_worth_data
        .find_one(owner_filter(user_id, session_id))
        .sort(doc! { "created_at": -1 })
        .await
        .map_err(Into::into)
}

pub async fn insert_emergency_fund(state: &AppState, record: &EmergencyFundRecord) -> Result<()> {
    state.emergency_funds.insert_one(record).await?;
    Ok(())
}

pub async fn insert_health_score(state: &AppState, record: &HealthScoreRecord) -> Result<()> {
    state.financial_health_scores.insert_one(record).await?;
    Ok(())
}

/// Average score across all stored results, for the comparison block on the
/// result page.
pub async fn average_health_score(state: &AppState) -> Result<Option<f64>> {
    let mut cursor = state
        .financial_health_scores
        .aggregate(vec![doc! { "$group": { "_id": null, "avg": { "$avg": "$score" } } }])
        .await?;
    if let Some(doc) = cursor.try_next().await? {
        Ok(doc.get_f64("avg").ok().or_else(|| {
            doc.get_i32("avg").ok().map(f64::from)
        }))
    } else {
        Ok(None)
    }
}

pub async fn insert_quiz_result(state: &AppState, record: &QuizResult) -> Result<()> {
    state.quiz_responses.insert_one(record).await?;
    Ok(())
}

pub async fn insert_feedback(state: &AppState, feedback: &Feedback) -> Result<()> {
    state.feedback.insert_one(feedback).await?;
    Ok(())
}

pub async fn list_learning_modules(state: &AppState) -> Result<Vec<LearningModule>> {
    let mut cursor = state
        .learning_materials
        .find(doc! {})
        .sort(doc! { "_id": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(module) = cursor.try_next().await? {
        items.push(module);
    }
    Ok(items)
}

pub async fn get_learning_module(state: &AppState, id: &str) -> Result<Option<LearningModule>> {
    state
        .learning_materials
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn mark_module_complete(
    state: &AppState,
    user_id: Option<&str>,
    session_id: &str,
    module_id: &str,
) -> Result<()> {
    let mut filter = owner_filter(user_id, session_id);
    filter.insert("module_id", module_id);
    let existing = state.learning_progress.find_one(filter.clone()).await?;
    if existing.is_some() {
        state
            .learning_progress
            .update_one(
                filter,
                doc! { "$set": {
                    "completed": true,
                    "updated_at": DateTime::from_system_time(SystemTime::now()),
                } },
            )
            .await?;
    } else {
        state
            .learning_progress
            .insert_one(LearningProgress {
                id: None,
                user_id: user_id.map(str::to_string),
                session_id: session_id.to_string(),
                module_id: module_id.to_string(),
                completed: true,
                updated_at: DateTime::from_system_time(SystemTime::now()),
            })
            .await?;
    }
    Ok(())
}

pub async fn completed_module_ids(
    state: &AppState,
    user_id: Option<&str>,
    session_id: &str,
) -> Result<Vec<String>> {
    let mut filter = owner_filter(user_id, session_id);
    filter.insert("completed", true);
    let mut cursor = state.learning_progress.find(filter).await?;
    let mut ids = Vec::new();
    while let Some(progress) = cursor.try_next().await? {
        ids.push(progress.module_id);
    }
    Ok(ids)
}
