// Centralized coin engine. Every balance mutation in the application goes
// through credit_coins or spend_coins; no route touches coin_balance with its
// own $inc. The debit filter carries `coin_balance >= cost` so the balance
// cannot go negative under concurrent requests.

use anyhow::Result;
use futures::stream::TryStreamExt;
use mongodb::{
    ClientSession,
    bson::{DateTime, doc},
};
use std::time::SystemTime;

use crate::error::AppError;
use crate::models::{AuditLog, CoinTransaction, CoinTxKind};

use super::AppState;

pub struct CoinCredit<'a> {
    pub user_id: &'a str,
    pub amount: i64,
    pub kind: CoinTxKind,
    pub reference: &'a str,
    /// Recorded on the audit entry: "system" for purchases, the acting admin
    /// or agent otherwise.
    pub actor: &'a str,
    pub payment_method: Option<String>,
    pub facilitated_by_agent: Option<String>,
}

pub async fn credit_coins(state: &AppState, credit: CoinCredit<'_>) -> Result<(), AppError> {
    if credit.amount <= 0 {
        return Err(AppError::Validation("credit amount must be positive".into()));
    }
    if state.supports_transactions {
        let mut session = state.client.start_session().await?;
        session.start_transaction().await?;
        match apply_credit(state, Some(&mut session), &credit).await {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(err) => {
                let _ = session.abort_transaction().await;
                Err(err)
            }
        }
    } else {
        apply_credit(state, None, &credit).await
    }
}

pub async fn spend_coins(
    state: &AppState,
    user_id: &str,
    cost: i64,
    reference: &str,
) -> Result<(), AppError> {
    if cost <= 0 {
        return Err(AppError::Validation("spend cost must be positive".into()));
    }
    if state.supports_transactions {
        let mut session = state.client.start_session().await?;
        session.start_transaction().await?;
        match apply_debit(state, Some(&mut session), user_id, cost, reference).await {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(err) => {
                let _ = session.abort_transaction().await;
                Err(err)
            }
        }
    } else {
        apply_debit(state, None, user_id, cost, reference).await
    }
}

/// Cheap pre-check used by handlers that want to refuse before doing work.
/// The authoritative guard stays inside spend_coins.
pub async fn has_coin_balance(state: &AppState, user_id: &str, required: i64) -> Result<bool> {
    let Some(user) = super::find_user(state, user_id).await? else {
        return Ok(false);
    };
    Ok(user.coin_balance >= required)
}

pub async fn get_balance(state: &AppState, user_id: &str) -> Result<Option<i64>> {
    Ok(super::find_user(state, user_id).await?.map(|u| u.coin_balance))
}

pub async fn list_coin_transactions(
    state: &AppState,
    user_id: &str,
    limit: i64,
) -> Result<Vec<CoinTransaction>> {
    let mut cursor = state
        .coin_transactions
        .find(doc! { "user_id": user_id })
        .sort(doc! { "date": -1 })
        .limit(limit)
        .await?;
    let mut items = Vec::new();
    while let Some(tx) = cursor.try_next().await? {
        items.push(tx);
    }
    Ok(items)
}

async fn apply_credit(
    state: &AppState,
    mut session: Option<&mut ClientSession>,
    credit: &CoinCredit<'_>,
) -> Result<(), AppError> {
    let now = DateTime::from_system_time(SystemTime::now());

    let mut update = state.users.update_one(
        doc! { "_id": credit.user_id },
        doc! { "$inc": { "coin_balance": credit.amount } },
    );
    if let Some(s) = session.as_deref_mut() {
        update = update.session(s);
    }
    if update.await?.matched_count == 0 {
        return Err(AppError::UserNotFound);
    }

    let tx = CoinTransaction {
        id: None,
        user_id: credit.user_id.to_string(),
        amount: credit.amount,
        kind: credit.kind,
        reference: credit.reference.to_string(),
        payment_method: credit.payment_method.clone(),
        facilitated_by_agent: credit.facilitated_by_agent.clone(),
        notes: None,
        date: now,
    };
    let mut insert = state.coin_transactions.insert_one(tx);
    if let Some(s) = session.as_deref_mut() {
        insert = insert.session(s);
    }
    insert.await?;

    let audit = AuditLog {
        id: None,
        admin_id: credit.actor.to_string(),
        action: format!("credit_coins_{}", credit.kind.as_str()),
        details: Some(doc! {
            "user_id": credit.user_id,
            "amount": credit.amount,
            "ref": credit.reference,
        }),
        timestamp: now,
    };
    let mut insert = state.audit_logs.insert_one(audit);
    if let Some(s) = session.as_deref_mut() {
        insert = insert.session(s);
    }
    insert.await?;

    Ok(())
}

async fn apply_debit(
    state: &AppState,
    mut session: Option<&mut ClientSession>,
    user_id: &str,
    cost: i64,
    reference: &str,
) -> Result<(), AppError> {
    let mut update = state.users.update_one(
        doc! { "_id": user_id, "coin_balance": { "$gte": cost } },
        doc! { "$inc": { "coin_balance": -cost } },
    );
    if let Some(s) = session.as_deref_mut() {
        update = update.session(s);
    }
    if update.await?.matched_count == 0 {
        // Distinguish a missing user from an underfunded one.
        return if super::find_user(state, user_id).await.map_err(AppError::Internal)?.is_some() {
            Err(AppError::InsufficientCoins)
        } else {
            Err(AppError::UserNotFound)
        };
    }

    let tx = CoinTransaction {
        id: None,
        user_id: user_id.to_string(),
        amount: -cost,
        kind: CoinTxKind::Spend,
        reference: reference.to_string(),
        payment_method: None,
        facilitated_by_agent: None,
        notes: None,
        date: DateTime::from_system_time(SystemTime::now()),
    };
    let mut insert = state.coin_transactions.insert_one(tx);
    if let Some(s) = session.as_deref_mut() {
        insert = insert.session(s);
    }
    insert.await?;

    Ok(())
}
