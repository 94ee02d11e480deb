// Receipts and payments: the unified cashflow ledger plus per-entry receipt
// PDFs. Creating an entry and generating a PDF are metered.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::format::{format_currency, format_date};
use crate::models::{Cashflow, CashflowType};
use crate::pdf;
use crate::session::SessionUser;
use crate::state::{
    AppState, create_cashflow, delete_cashflow, get_cashflow_by_id, has_coin_balance,
    list_cashflows, spend_coins, update_cashflow,
};

use super::helpers::{
    SimpleOption, cashflow_type_options, clean_opt, ensure_owner, parse_cashflow_type,
    parse_f64_field, parse_object_id, parse_payment_method, payment_method_options, pdf_response,
    render,
};

pub const CREATE_CASHFLOW_COST: i64 = 1;
pub const RECEIPT_PDF_COST: i64 = 1;

#[derive(Deserialize)]
pub struct CashflowTypeQuery {
    #[serde(rename = "type")]
    flow_type: Option<String>,
}

fn query_type(query: &CashflowTypeQuery) -> Result<CashflowType, AppError> {
    match &query.flow_type {
        Some(value) => parse_cashflow_type(value).map_err(AppError::Validation),
        None => Ok(CashflowType::Receipt),
    }
}

#[derive(Template)]
#[template(path = "cashflows/index.html")]
struct CashflowsIndexTemplate {
    flow_type: String,
    rows: Vec<CashflowRow>,
}

struct CashflowRow {
    id: String,
    party_name: String,
    amount: String,
    method: String,
    category: String,
    created: String,
}

pub async fn cashflows_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CashflowTypeQuery>,
) -> Result<Html<String>, AppError> {
    let flow_type = query_type(&query)?;
    let rows = list_cashflows(&state, session_user.username(), flow_type)
        .await?
        .into_iter()
        .filter_map(|flow| {
            flow.id.map(|id| CashflowRow {
                id: id.to_hex(),
                party_name: flow.party_name,
                amount: format_currency(flow.amount),
                method: flow.method.map(|m| m.as_str().to_string()).unwrap_or_default(),
                category: flow.category.unwrap_or_default(),
                created: format_date(&flow.created_at),
            })
        })
        .collect();
    render(CashflowsIndexTemplate {
        flow_type: flow_type.as_str().to_string(),
        rows,
    })
}

#[derive(Template)]
#[template(path = "cashflows/form.html")]
struct CashflowFormTemplate {
    action: String,
    party_name: String,
    amount: String,
    category: String,
    types: Vec<SimpleOption>,
    methods: Vec<SimpleOption>,
    is_edit: bool,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct CashflowFormData {
    flow_type: String,
    party_name: String,
    amount: String,
    #[serde(default)]
    method: String,
    #[serde(default)]
    category: Option<String>,
}

pub async fn cashflows_new(
    _session_user: SessionUser,
    Query(query): Query<CashflowTypeQuery>,
) -> Result<Html<String>, AppError> {
    let flow_type = query_type(&query)?;
    render(CashflowFormTemplate {
        action: "/cashflows".into(),
        party_name: String::new(),
        amount: String::new(),
        category: String::new(),
        types: cashflow_type_options(flow_type),
        methods: payment_method_options(""),
        is_edit: false,
        errors: None,
    })
}

pub async fn cashflows_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<CashflowFormData>,
) -> Result<Response, AppError> {
    if !session_user.is_admin()
        && !has_coin_balance(&state, session_user.username(), CREATE_CASHFLOW_COST).await?
    {
        return Ok(Redirect::to("/coins").into_response());
    }

    let reshow = |errors: String| {
        render(CashflowFormTemplate {
            action: "/cashflows".into(),
            party_name: form.party_name.clone(),
            amount: form.amount.clone(),
            category: form.category.clone().unwrap_or_default(),
            types: cashflow_type_options(
                parse_cashflow_type(&form.flow_type).unwrap_or(CashflowType::Receipt),
            ),
            methods: payment_method_options(&form.method),
            is_edit: false,
            errors: Some(errors),
        })
        .map(IntoResponse::into_response)
    };

    let flow_type = match parse_cashflow_type(&form.flow_type) {
        Ok(t) => t,
        Err(msg) => return reshow(msg),
    };
    if form.party_name.trim().is_empty() {
        return reshow("Party name is required".to_string());
    }
    let amount = match parse_f64_field(&form.amount, "Amount") {
        Ok(v) => v,
        Err(msg) => return reshow(msg),
    };
    let method = match parse_payment_method(&form.method) {
        Ok(m) => m,
        Err(msg) => return reshow(msg),
    };

    let id = create_cashflow(
        &state,
        session_user.username(),
        flow_type,
        form.party_name.trim(),
        amount,
        method,
        clean_opt(form.category.clone()),
        None,
        None,
    )
    .await?;

    if !session_user.is_admin() {
        let reference = format!("CREATE_CASHFLOW_{}", id.to_hex());
        spend_coins(&state, session_user.username(), CREATE_CASHFLOW_COST, &reference).await?;
    }

    Ok(Redirect::to(&format!("/cashflows?type={}", flow_type.as_str())).into_response())
}

async fn load_owned_cashflow(
    state: &AppState,
    session_user: &SessionUser,
    id: &str,
) -> Result<Cashflow, AppError> {
    let object_id = parse_object_id(id)?;
    let flow = get_cashflow_by_id(state, &object_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(session_user, &flow.user_id)?;
    Ok(flow)
}

pub async fn cashflows_edit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let flow = load_owned_cashflow(&state, &session_user, &id).await?;
    render(CashflowFormTemplate {
        action: format!("/cashflows/{id}/update"),
        party_name: flow.party_name,
        amount: flow.amount.to_string(),
        category: flow.category.unwrap_or_default(),
        types: cashflow_type_options(flow.flow_type),
        methods: payment_method_options(
            flow.method.map(|m| m.as_str()).unwrap_or(""),
        ),
        is_edit: true,
        errors: None,
    })
}

pub async fn cashflows_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<CashflowFormData>,
) -> Result<Response, AppError> {
    let flow = load_owned_cashflow(&state, &session_user, &id).await?;

    let reshow = |errors: String| {
        render(CashflowFormTemplate {
            action: format!("/cashflows/{id}/update"),
            party_name: form.party_name.clone(),
            amount: form.amount.clone(),
            category: form.category.clone().unwrap_or_default(),
            types: cashflow_type_options(flow.flow_type),
            methods: payment_method_options(&form.method),
            is_edit: true,
            errors: Some(errors),
        })
        .map(IntoResponse::into_response)
    };

    let amount = match parse_f64_field(&form.amount, "Amount") {
        Ok(v) => v,
        Err(msg) => return reshow(msg),
    };
    let method = match parse_payment_method(&form.method) {
        Ok(m) => m,
        Err(msg) => return reshow(msg),
    };

    let object_id = parse_object_id(&id)?;
    update_cashflow(
        &state,
        &object_id,
        form.party_name.trim(),
        amount,
        method,
        clean_opt(form.category),
    )
    .await?;
    Ok(Redirect::to(&format!("/cashflows?type={}", flow.flow_type.as_str())).into_response())
}

pub async fn cashflows_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let flow = load_owned_cashflow(&state, &session_user, &id).await?;
    let object_id = parse_object_id(&id)?;
    delete_cashflow(&state, &object_id).await?;
    Ok(Redirect::to(&format!("/cashflows?type={}", flow.flow_type.as_str())).into_response())
}

pub async fn cashflows_receipt_pdf(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let flow = load_owned_cashflow(&state, &session_user, &id).await?;
    if !session_user.is_admin()
        && !has_coin_balance(&state, session_user.username(), RECEIPT_PDF_COST).await?
    {
        return Ok(Redirect::to("/coins").into_response());
    }

    let owner = session_user
        .user()
        .display_name
        .clone()
        .unwrap_or_else(|| session_user.username().to_string());
    let bytes = pdf::cashflow_receipt(&flow, &owner).map_err(AppError::Internal)?;

    if !session_user.is_admin() {
        let reference = format!("CASHFLOW_PDF_{id}");
        spend_coins(&state, session_user.username(), RECEIPT_PDF_COST, &reference).await?;
    }
    Ok(pdf_response(&format!("receipt-{id}.pdf"), bytes))
}
