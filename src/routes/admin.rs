// Admin area: user management with cascade delete, coin crediting, the audit
// browser and generic item deletion.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use mongodb::bson::doc;
use serde::Deserialize;

use crate::error::AppError;
use crate::format::format_datetime;
use crate::models::CoinTxKind;
use crate::session::SessionUser;
use crate::state::{
    AppState, CoinCredit, credit_coins, delete_user_cascade, find_user, list_audit_logs,
    list_users, log_audit_action, set_suspended,
};

use super::helpers::{parse_i64_field, parse_object_id, render, require_admin};

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct AdminDashboardTemplate {
    users_count: u64,
    records_count: u64,
    cashflows_count: u64,
    inventory_count: u64,
    coin_tx_count: u64,
}

pub async fn admin_dashboard(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    require_admin(&session_user)?;
    let users_count = state.users.count_documents(doc! {}).await?;
    let records_count = state.records.count_documents(doc! {}).await?;
    let cashflows_count = state.cashflows.count_documents(doc! {}).await?;
    let inventory_count = state.inventory.count_documents(doc! {}).await?;
    let coin_tx_count = state.coin_transactions.count_documents(doc! {}).await?;
    render(AdminDashboardTemplate {
        users_count,
        records_count,
        cashflows_count,
        inventory_count,
        coin_tx_count,
    })
}

#[derive(Template)]
#[template(path = "admin/users.html")]
struct AdminUsersTemplate {
    rows: Vec<UserRow>,
}

struct UserRow {
    username: String,
    email: String,
    role: String,
    coin_balance: i64,
    suspended: bool,
    setup_complete: bool,
}

pub async fn manage_users(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    require_admin(&session_user)?;
    let rows = list_users(&state)
        .await?
        .into_iter()
        .map(|user| UserRow {
            username: user.username,
            email: user.email,
            role: user.role.as_str().to_string(),
            coin_balance: user.coin_balance,
            suspended: user.suspended,
            setup_complete: user.setup_complete,
        })
        .collect();
    render(AdminUsersTemplate { rows })
}

pub async fn suspend_user(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    require_admin(&session_user)?;
    if find_user(&state, &username).await?.is_none() {
        return Err(AppError::UserNotFound);
    }
    set_suspended(&state, &username, true).await?;
    log_audit_action(
        &state,
        session_user.username(),
        "suspend_user",
        Some(doc! { "user_id": &username }),
    )
    .await?;
    Ok(Redirect::to("/admin/users").into_response())
}

pub async fn unsuspend_user(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    require_admin(&session_user)?;
    if find_user(&state, &username).await?.is_none() {
        return Err(AppError::UserNotFound);
    }
    set_suspended(&state, &username, false).await?;
    log_audit_action(
        &state,
        session_user.username(),
        "unsuspend_user",
        Some(doc! { "user_id": &username }),
    )
    .await?;
    Ok(Redirect::to("/admin/users").into_response())
}

pub async fn delete_user(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    require_admin(&session_user)?;
    if find_user(&state, &username).await?.is_none() {
        return Err(AppError::UserNotFound);
    }
    if !delete_user_cascade(&state, &username).await? {
        return Err(AppError::UserNotFound);
    }
    tracing::info!("admin {} deleted user {username}", session_user.username());
    log_audit_action(
        &state,
        session_user.username(),
        "delete_user",
        Some(doc! { "user_id": &username }),
    )
    .await?;
    Ok(Redirect::to("/admin/users").into_response())
}

#[derive(Template)]
#[template(path = "admin/credit.html")]
struct CreditTemplate {
    username: String,
    amount: String,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct CreditForm {
    username: String,
    amount: String,
}

pub async fn credit_page(session_user: SessionUser) -> Result<Html<String>, AppError> {
    require_admin(&session_user)?;
    render(CreditTemplate {
        username: String::new(),
        amount: String::new(),
        errors: None,
    })
}

pub async fn credit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<CreditForm>,
) -> Result<Response, AppError> {
    require_admin(&session_user)?;

    let reshow = |errors: String| {
        render(CreditTemplate {
            username: form.username.clone(),
            amount: form.amount.clone(),
            errors: Some(errors),
        })
        .map(IntoResponse::into_response)
    };

    let amount = match parse_i64_field(&form.amount, "Amount") {
        Ok(amount) if amount > 0 => amount,
        Ok(_) => return reshow("Amount must be positive".to_string()),
        Err(msg) => return reshow(msg),
    };
    let username = form.username.trim().to_lowercase();
    if find_user(&state, &username).await?.is_none() {
        return reshow("User not found".to_string());
    }

    let reference = format!("ADMIN_CREDIT_{}", uuid::Uuid::new_v4());
    credit_coins(
        &state,
        CoinCredit {
            user_id: &username,
            amount,
            kind: CoinTxKind::AdminCredit,
            reference: &reference,
            actor: session_user.username(),
            payment_method: None,
            facilitated_by_agent: None,
        },
    )
    .await?;
    Ok(Redirect::to("/admin/users").into_response())
}

#[derive(Template)]
#[template(path = "admin/audit.html")]
struct AuditTemplate {
    rows: Vec<AuditRow>,
}

struct AuditRow {
    admin_id: String,
    action: String,
    details: String,
    timestamp: String,
}

pub async fn audit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    require_admin(&session_user)?;
    let rows = list_audit_logs(&state, 100)
        .await?
        .into_iter()
        .map(|log| AuditRow {
            admin_id: log.admin_id,
            action: log.action,
            details: log.details.map(|d| d.to_string()).unwrap_or_default(),
            timestamp: format_datetime(&log.timestamp),
        })
        .collect();
    render(AuditTemplate { rows })
}

const DELETABLE_COLLECTIONS: &[&str] = &["records", "cashflows", "inventory"];

pub async fn delete_item(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    require_admin(&session_user)?;
    if !DELETABLE_COLLECTIONS.contains(&collection.as_str()) {
        return Err(AppError::Validation("invalid collection".into()));
    }
    let object_id = parse_object_id(&id)?;
    let result = state
        .db
        .collection::<mongodb::bson::Document>(&collection)
        .delete_one(doc! { "_id": object_id })
        .await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound);
    }
    log_audit_action(
        &state,
        session_user.username(),
        "delete_item",
        Some(doc! { "collection": &collection, "item_id": &id }),
    )
    .await?;
    Ok(Redirect::to("/admin").into_response())
}
