// Role dashboard: ledger counts, coin balance and recent activity. Admins can
// view on behalf of another user with ?as_user=.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::format::{format_currency, format_date};
use crate::session::SessionUser;
use crate::state::{
    AppState, count_cashflows, count_inventory, count_records, find_user, recent_cashflows,
    recent_records,
};

use super::helpers::{effective_user_id, render};

#[derive(Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    as_user: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard/index.html")]
struct DashboardTemplate {
    display_name: String,
    role: String,
    records_count: u64,
    cashflows_count: u64,
    inventory_count: u64,
    coin_balance: i64,
    recent_records: Vec<RecentRow>,
    recent_cashflows: Vec<RecentRow>,
    admin_viewing: bool,
}

struct RecentRow {
    name: String,
    detail: String,
    amount: String,
    created: String,
}

pub async fn dashboard(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, AppError> {
    let effective = effective_user_id(&session_user, query.as_user.as_deref());
    let admin_viewing = effective != session_user.username();

    let user = find_user(&state, &effective)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let records_count = count_records(&state, &effective).await?;
    let cashflows_count = count_cashflows(&state, &effective).await?;
    let inventory_count = count_inventory(&state, &effective).await?;

    let recent_records = recent_records(&state, &effective, 5)
        .await?
        .into_iter()
        .map(|record| RecentRow {
            name: record.name,
            detail: record.record_type.as_str().to_string(),
            amount: format_currency(record.amount_owed),
            created: format_date(&record.created_at),
        })
        .collect();
    let recent_cashflows = recent_cashflows(&state, &effective, 5)
        .await?
        .into_iter()
        .map(|flow| RecentRow {
            name: flow.party_name,
            detail: flow.flow_type.as_str().to_string(),
            amount: format_currency(flow.amount),
            created: format_date(&flow.created_at),
        })
        .collect();

    render(DashboardTemplate {
        display_name: user.display_name.unwrap_or_else(|| user.username.clone()),
        role: user.role.as_str().to_string(),
        records_count,
        cashflows_count,
        inventory_count,
        coin_balance: user.coin_balance,
        recent_records,
        recent_cashflows,
        admin_viewing,
    })
}
