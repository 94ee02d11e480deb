// Bill planner: upcoming obligations with recurrence and a mark-paid flow
// that rolls recurring bills forward.

use std::{sync::Arc, time::SystemTime};

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use mongodb::bson::DateTime;
use serde::Deserialize;

use crate::error::AppError;
use crate::format::{format_currency, format_date};
use crate::models::{Bill, BillFrequency, BillStatus};
use crate::routes::helpers::{SimpleOption, parse_date_field, parse_f64_field, render};
use crate::session::ToolVisitor;
use crate::state::{
    AppState, delete_bill, get_bill, insert_bill, list_bills, log_tool_usage, mark_bill_paid,
};

#[derive(Template)]
#[template(path = "personal/bills.html")]
struct BillsTemplate {
    rows: Vec<BillRow>,
    frequencies: Vec<SimpleOption>,
    errors: Option<String>,
}

struct BillRow {
    id: String,
    bill_name: String,
    amount: String,
    due_date: String,
    frequency: String,
    status: String,
    overdue: bool,
}

fn frequency_options(selected: &str) -> Vec<SimpleOption> {
    vec![
        SimpleOption {
            value: "one-time".into(),
            label: "One-time".into(),
            selected: selected == "one-time",
        },
        SimpleOption {
            value: "weekly".into(),
            label: "Weekly".into(),
            selected: selected == "weekly",
        },
        SimpleOption {
            value: "monthly".into(),
            label: "Monthly".into(),
            selected: selected == "monthly",
        },
        SimpleOption {
            value: "quarterly".into(),
            label: "Quarterly".into(),
            selected: selected == "quarterly",
        },
    ]
}

fn parse_frequency(value: &str) -> Result<BillFrequency, String> {
    match value {
        "one-time" => Ok(BillFrequency::OneTime),
        "weekly" => Ok(BillFrequency::Weekly),
        "monthly" => Ok(BillFrequency::Monthly),
        "quarterly" => Ok(BillFrequency::Quarterly),
        _ => Err("Select a valid frequency".to_string()),
    }
}

async fn bills_view(
    state: &AppState,
    visitor: &ToolVisitor,
    errors: Option<String>,
    frequency: &str,
) -> Result<Response, AppError> {
    let now = DateTime::from_system_time(SystemTime::now());
    let rows = list_bills(state, visitor.user_id(), &visitor.session_id)
        .await?
        .into_iter()
        .map(|bill| BillRow {
            overdue: bill.status != BillStatus::Paid && bill.due_date < now,
            id: bill.id,
            bill_name: bill.bill_name,
            amount: format_currency(bill.amount),
            due_date: format_date(&bill.due_date),
            frequency: bill.frequency.as_str().to_string(),
            status: bill.status.as_str().to_string(),
        })
        .collect();
    let mut response = render(BillsTemplate {
        rows,
        frequencies: frequency_options(frequency),
        errors,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

pub async fn bills_page(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
) -> Result<Response, AppError> {
    bills_view(&state, &visitor, None, "monthly").await
}

#[derive(Deserialize)]
pub struct BillForm {
    bill_name: String,
    amount: String,
    due_date: String,
    frequency: String,
}

pub async fn bills_create(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Form(form): Form<BillForm>,
) -> Result<Response, AppError> {
    let parsed = (|| -> Result<(f64, DateTime, BillFrequency), String> {
        if form.bill_name.trim().is_empty() {
            return Err("Bill name is required".to_string());
        }
        Ok((
            parse_f64_field(&form.amount, "Amount")?,
            parse_date_field(&form.due_date, "Due date")?,
            parse_frequency(&form.frequency)?,
        ))
    })();
    let (amount, due_date, frequency) = match parsed {
        Ok(values) => values,
        Err(msg) => return bills_view(&state, &visitor, Some(msg), &form.frequency).await,
    };

    let bill = Bill {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: visitor.user_id().map(str::to_string),
        session_id: visitor.session_id.clone(),
        bill_name: form.bill_name.trim().to_string(),
        amount,
        due_date,
        frequency,
        status: BillStatus::Unpaid,
        created_at: DateTime::from_system_time(SystemTime::now()),
    };
    insert_bill(&state, &bill).await?;
    log_tool_usage(
        &state,
        "bill",
        visitor.user_id(),
        &visitor.session_id,
        "create_bill",
    )
    .await?;
    Ok(Redirect::to("/personal/bills").into_response())
}

async fn load_owned_bill(
    state: &AppState,
    visitor: &ToolVisitor,
    id: &str,
) -> Result<Bill, AppError> {
    let bill = get_bill(state, id).await?.ok_or(AppError::NotFound)?;
    let owned = match (&bill.user_id, visitor.user_id()) {
        (Some(owner), Some(current)) => owner == current,
        (None, _) => bill.session_id == visitor.session_id,
        _ => false,
    };
    if !owned {
        return Err(AppError::Forbidden);
    }
    Ok(bill)
}

pub async fn bills_mark_paid(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let bill = load_owned_bill(&state, &visitor, &id).await?;
    mark_bill_paid(&state, &bill).await?;
    Ok(Redirect::to("/personal/bills").into_response())
}

pub async fn bills_delete(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let _bill = load_owned_bill(&state, &visitor, &id).await?;
    delete_bill(&state, &id).await?;
    Ok(Redirect::to("/personal/bills").into_response())
}
