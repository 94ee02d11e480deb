// Profit/loss and inventory reports with PDF and CSV export. Each generation
// is metered once, whatever the output format.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::format::{format_currency, format_date};
use crate::models::{Cashflow, CashflowType};
use crate::pdf;
use crate::session::SessionUser;
use crate::state::{
    AppState, cashflows_in_range, has_coin_balance, list_inventory, spend_coins,
};

use super::helpers::{csv_response, parse_date_field, pdf_response, render};

pub const REPORT_COST: i64 = 1;

#[derive(Template)]
#[template(path = "reports/index.html")]
struct ReportsIndexTemplate {}

pub async fn reports_index(_session_user: SessionUser) -> Result<Html<String>, AppError> {
    render(ReportsIndexTemplate {})
}

#[derive(Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

struct FlowRow {
    date: String,
    party_name: String,
    flow_type: String,
    amount: String,
}

#[derive(Template)]
#[template(path = "reports/profit_loss.html")]
struct ProfitLossTemplate {
    rows: Vec<FlowRow>,
    total_income: String,
    total_expense: String,
    net_position: String,
}

fn totals(flows: &[Cashflow]) -> (f64, f64) {
    let mut income = 0.0;
    let mut expense = 0.0;
    for flow in flows {
        match flow.flow_type {
            CashflowType::Receipt => income += flow.amount,
            CashflowType::Payment => expense += flow.amount,
        }
    }
    (income, expense)
}

async fn charge_report(
    state: &AppState,
    session_user: &SessionUser,
    reference: &str,
) -> Result<(), AppError> {
    if !session_user.is_admin() {
        spend_coins(state, session_user.username(), REPORT_COST, reference).await?;
    }
    Ok(())
}

pub async fn profit_loss(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    if !session_user.is_admin()
        && !has_coin_balance(&state, session_user.username(), REPORT_COST).await?
    {
        return Ok(Redirect::to("/coins").into_response());
    }

    let from = match &query.start {
        Some(value) if !value.trim().is_empty() => {
            Some(parse_date_field(value, "Start date").map_err(AppError::Validation)?)
        }
        _ => None,
    };
    let to = match &query.end {
        Some(value) if !value.trim().is_empty() => {
            Some(parse_date_field(value, "End date").map_err(AppError::Validation)?)
        }
        _ => None,
    };

    let flows = cashflows_in_range(&state, session_user.username(), from, to).await?;
    let (total_income, total_expense) = totals(&flows);
    let reference = format!("REPORT_PROFIT_LOSS_{}", uuid::Uuid::new_v4());

    match query.format.as_deref() {
        Some("pdf") => {
            let bytes = pdf::profit_loss_report(&flows, total_income, total_expense)
                .map_err(AppError::Internal)?;
            charge_report(&state, &session_user, &reference).await?;
            Ok(pdf_response("profit-loss.pdf", bytes))
        }
        Some("csv") => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer
                .write_record(["date", "party_name", "type", "amount"])
                .map_err(|err| AppError::Internal(err.into()))?;
            for flow in &flows {
                writer
                    .write_record([
                        format_date(&flow.created_at),
                        flow.party_name.clone(),
                        flow.flow_type.as_str().to_string(),
                        format!("{:.2}", flow.amount),
                    ])
                    .map_err(|err| AppError::Internal(err.into()))?;
            }
            writer
                .write_record([
                    "net_position".to_string(),
                    String::new(),
                    String::new(),
                    format!("{:.2}", total_income - total_expense),
                ])
                .map_err(|err| AppError::Internal(err.into()))?;
            let bytes = writer
                .into_inner()
                .map_err(|err| AppError::Internal(err.into()))?;
            charge_report(&state, &session_user, &reference).await?;
            Ok(csv_response("profit-loss.csv", bytes))
        }
        _ => {
            let rows = flows
                .iter()
                .map(|flow| FlowRow {
                    date: format_date(&flow.created_at),
                    party_name: flow.party_name.clone(),
                    flow_type: flow.flow_type.as_str().to_string(),
                    amount: format_currency(flow.amount),
                })
                .collect();
            charge_report(&state, &session_user, &reference).await?;
            render(ProfitLossTemplate {
                rows,
                total_income: format_currency(total_income),
                total_expense: format_currency(total_expense),
                net_position: format_currency(total_income - total_expense),
            })
            .map(IntoResponse::into_response)
        }
    }
}

struct InventoryReportRow {
    item_name: String,
    qty: i64,
    buying_price: String,
    selling_price: String,
}

#[derive(Template)]
#[template(path = "reports/inventory.html")]
struct InventoryReportTemplate {
    rows: Vec<InventoryReportRow>,
}

pub async fn inventory_report(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    if !session_user.is_admin()
        && !has_coin_balance(&state, session_user.username(), REPORT_COST).await?
    {
        return Ok(Redirect::to("/coins").into_response());
    }

    let items = list_inventory(&state, session_user.username()).await?;
    let reference = format!("REPORT_INVENTORY_{}", uuid::Uuid::new_v4());

    match query.format.as_deref() {
        Some("pdf") => {
            let bytes = pdf::inventory_report(&items).map_err(AppError::Internal)?;
            charge_report(&state, &session_user, &reference).await?;
            Ok(pdf_response("inventory.pdf", bytes))
        }
        Some("csv") => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer
                .write_record(["item_name", "qty", "buying_price", "selling_price", "threshold"])
                .map_err(|err| AppError::Internal(err.into()))?;
            for item in &items {
                writer
                    .write_record([
                        item.item_name.clone(),
                        item.qty.to_string(),
                        item.buying_price.map(|p| format!("{p:.2}")).unwrap_or_default(),
                        item.selling_price.map(|p| format!("{p:.2}")).unwrap_or_default(),
                        item.threshold.to_string(),
                    ])
                    .map_err(|err| AppError::Internal(err.into()))?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|err| AppError::Internal(err.into()))?;
            charge_report(&state, &session_user, &reference).await?;
            Ok(csv_response("inventory.csv", bytes))
        }
        _ => {
            let rows = items
                .iter()
                .map(|item| InventoryReportRow {
                    item_name: item.item_name.clone(),
                    qty: item.qty,
                    buying_price: item.buying_price.map(format_currency).unwrap_or_default(),
                    selling_price: item.selling_price.map(format_currency).unwrap_or_default(),
                })
                .collect();
            charge_report(&state, &session_user, &reference).await?;
            render(InventoryReportTemplate { rows }).map(IntoResponse::into_response)
        }
    }
}
