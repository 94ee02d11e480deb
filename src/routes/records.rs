// Debtors and creditors: the unified records ledger, SMS reminders and the
// per-record receipt PDF. Creating a record and sending reminders are metered.

use std::sync::Arc;

use askama::Template;
use axum::{
    Json,
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::format::{format_currency, format_date};
use crate::i18n::trans;
use crate::models::{Record, RecordType};
use crate::pdf;
use crate::session::SessionUser;
use crate::sms;
use crate::state::{
    AppState, create_record, delete_record, get_record_by_id, has_coin_balance,
    increment_reminder_count, list_records, log_reminder, spend_coins, update_record,
};

use super::helpers::{
    SimpleOption, clean_opt, ensure_owner, parse_f64_field, parse_object_id, parse_record_type,
    pdf_response, record_type_options, render,
};

pub const CREATE_RECORD_COST: i64 = 1;
pub const REMINDER_COST: i64 = 2;
pub const RECEIPT_PDF_COST: i64 = 1;

#[derive(Deserialize)]
pub struct RecordTypeQuery {
    #[serde(rename = "type")]
    record_type: Option<String>,
}

fn query_type(query: &RecordTypeQuery) -> Result<RecordType, AppError> {
    match &query.record_type {
        Some(value) => parse_record_type(value).map_err(AppError::Validation),
        None => Ok(RecordType::Debtor),
    }
}

#[derive(Template)]
#[template(path = "records/index.html")]
struct RecordsIndexTemplate {
    record_type: String,
    rows: Vec<RecordRow>,
}

struct RecordRow {
    id: String,
    name: String,
    amount: String,
    reminders: i32,
    created: String,
}

pub async fn records_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecordTypeQuery>,
) -> Result<Html<String>, AppError> {
    let record_type = query_type(&query)?;
    let rows = list_records(&state, session_user.username(), record_type)
        .await?
        .into_iter()
        .filter_map(|record| {
            record.id.map(|id| RecordRow {
                id: id.to_hex(),
                name: record.name,
                amount: format_currency(record.amount_owed),
                reminders: record.reminder_count,
                created: format_date(&record.created_at),
            })
        })
        .collect();
    render(RecordsIndexTemplate {
        record_type: record_type.as_str().to_string(),
        rows,
    })
}

#[derive(Template)]
#[template(path = "records/form.html")]
struct RecordFormTemplate {
    action: String,
    name: String,
    contact: String,
    description: String,
    amount_owed: String,
    types: Vec<SimpleOption>,
    is_edit: bool,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct RecordFormData {
    record_type: String,
    name: String,
    #[serde(default)]
    contact: Option<String>,
    #[serde(default)]
    description: Option<String>,
    amount_owed: String,
}

pub async fn records_new(
    _session_user: SessionUser,
    Query(query): Query<RecordTypeQuery>,
) -> Result<Html<String>, AppError> {
    let record_type = query_type(&query)?;
    render(RecordFormTemplate {
        action: "/records".into(),
        name: String::new(),
        contact: String::new(),
        description: String::new(),
        amount_owed: String::new(),
        types: record_type_options(record_type),
        is_edit: false,
        errors: None,
    })
}

pub async fn records_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<RecordFormData>,
) -> Result<Response, AppError> {
    if !session_user.is_admin()
        && !has_coin_balance(&state, session_user.username(), CREATE_RECORD_COST).await?
    {
        return Ok(Redirect::to("/coins").into_response());
    }

    let reshow = |errors: String| {
        render(RecordFormTemplate {
            action: "/records".into(),
            name: form.name.clone(),
            contact: form.contact.clone().unwrap_or_default(),
            description: form.description.clone().unwrap_or_default(),
            amount_owed: form.amount_owed.clone(),
            types: record_type_options(
                parse_record_type(&form.record_type).unwrap_or(RecordType::Debtor),
            ),
            is_edit: false,
            errors: Some(errors),
        })
        .map(IntoResponse::into_response)
    };

    let record_type = match parse_record_type(&form.record_type) {
        Ok(t) => t,
        Err(msg) => return reshow(msg),
    };
    if form.name.trim().is_empty() {
        return reshow("Name is required".to_string());
    }
    let amount_owed = match parse_f64_field(&form.amount_owed, "Amount owed") {
        Ok(v) => v,
        Err(msg) => return reshow(msg),
    };

    let id = create_record(
        &state,
        session_user.username(),
        record_type,
        form.name.trim(),
        clean_opt(form.contact.clone()),
        clean_opt(form.description.clone()),
        amount_owed,
    )
    .await?;

    if !session_user.is_admin() {
        let reference = format!("CREATE_RECORD_{}", id.to_hex());
        spend_coins(&state, session_user.username(), CREATE_RECORD_COST, &reference).await?;
    }

    Ok(Redirect::to(&format!("/records?type={}", record_type.as_str())).into_response())
}

#[derive(Template)]
#[template(path = "records/view.html")]
struct RecordViewTemplate {
    id: String,
    record_type: String,
    name: String,
    contact: String,
    description: String,
    amount: String,
    reminders: i32,
    created: String,
    has_contact: bool,
}

async fn load_owned_record(
    state: &AppState,
    session_user: &SessionUser,
    id: &str,
) -> Result<Record, AppError> {
    let object_id = parse_object_id(id)?;
    let record = get_record_by_id(state, &object_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(session_user, &record.user_id)?;
    Ok(record)
}

pub async fn records_view(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let record = load_owned_record(&state, &session_user, &id).await?;
    render(RecordViewTemplate {
        id,
        record_type: record.record_type.as_str().to_string(),
        name: record.name,
        has_contact: record.contact.is_some(),
        contact: record.contact.unwrap_or_default(),
        description: record.description.unwrap_or_default(),
        amount: format_currency(record.amount_owed),
        reminders: record.reminder_count,
        created: format_date(&record.created_at),
    })
}

pub async fn records_edit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let record = load_owned_record(&state, &session_user, &id).await?;
    render(RecordFormTemplate {
        action: format!("/records/{id}/update"),
        name: record.name,
        contact: record.contact.unwrap_or_default(),
        description: record.description.unwrap_or_default(),
        amount_owed: record.amount_owed.to_string(),
        types: record_type_options(record.record_type),
        is_edit: true,
        errors: None,
    })
}

pub async fn records_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<RecordFormData>,
) -> Result<Response, AppError> {
    let record = load_owned_record(&state, &session_user, &id).await?;

    let amount_owed = match parse_f64_field(&form.amount_owed, "Amount owed") {
        Ok(v) => v,
        Err(msg) => {
            return render(RecordFormTemplate {
                action: format!("/records/{id}/update"),
                name: form.name.clone(),
                contact: form.contact.clone().unwrap_or_default(),
                description: form.description.clone().unwrap_or_default(),
                amount_owed: form.amount_owed.clone(),
                types: record_type_options(record.record_type),
                is_edit: true,
                errors: Some(msg),
            })
            .map(IntoResponse::into_response);
        }
    };

    let object_id = parse_object_id(&id)?;
    update_record(
        &state,
        &object_id,
        form.name.trim(),
        clean_opt(form.contact),
        clean_opt(form.description),
        amount_owed,
    )
    .await?;
    Ok(Redirect::to(&format!("/records?type={}", record.record_type.as_str())).into_response())
}

pub async fn records_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = load_owned_record(&state, &session_user, &id).await?;
    let object_id = parse_object_id(&id)?;
    delete_record(&state, &object_id).await?;
    Ok(Redirect::to(&format!("/records?type={}", record.record_type.as_str())).into_response())
}

// --- reminders ---

#[derive(Deserialize)]
pub struct ReminderRequest {
    record_id: String,
    #[serde(default = "default_send_type", rename = "type")]
    send_type: String,
    #[serde(default)]
    message: Option<String>,
}

fn default_send_type() -> String {
    "sms".to_string()
}

pub async fn send_reminder(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReminderRequest>,
) -> Response {
    match send_reminder_inner(&session_user, &state, body).await {
        Ok(response) => response,
        Err(err) => err.into_json_response(),
    }
}

async fn send_reminder_inner(
    session_user: &SessionUser,
    state: &AppState,
    body: ReminderRequest,
) -> Result<Response, AppError> {
    let lang = session_user.lang();
    let record = load_owned_record(state, session_user, &body.record_id).await?;
    let Some(recipient) = record.contact.clone() else {
        return Ok(Json(json!({
            "success": false,
            "message": trans("no_contact", lang),
        }))
        .into_response());
    };

    if !session_user.is_admin()
        && !has_coin_balance(state, session_user.username(), REMINDER_COST).await?
    {
        return Err(AppError::InsufficientCoins);
    }

    let message = body.message.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| {
        format!(
            "Hello {}, this is a friendly reminder about the {} of {} on record with FiCore.",
            record.name,
            record.record_type.as_str(),
            format_currency(record.amount_owed),
        )
    });

    let outcome = match body.send_type.as_str() {
        "whatsapp" => sms::send_whatsapp_reminder(&recipient, &message).await,
        _ => sms::send_sms_reminder(&recipient, &message).await,
    }
    .map_err(AppError::Internal)?;

    let record_id = parse_object_id(&body.record_id)?;
    log_reminder(
        state,
        session_user.username(),
        &record_id,
        &recipient,
        &message,
        &body.send_type,
        outcome.api_response.clone(),
    )
    .await?;

    if !outcome.success {
        tracing::warn!(
            "reminder for record {} failed: {:?}",
            body.record_id,
            outcome.api_response
        );
        return Ok(Json(json!({
            "success": false,
            "message": trans("reminder_failed", lang),
        }))
        .into_response());
    }

    increment_reminder_count(state, &record_id).await?;
    if !session_user.is_admin() {
        let reference = format!("REMINDER_{}", record_id.to_hex());
        spend_coins(state, session_user.username(), REMINDER_COST, &reference).await?;
    }

    Ok(Json(json!({
        "success": true,
        "message": trans("reminder_sent", lang),
    }))
    .into_response())
}

// --- receipt PDF ---

pub async fn records_receipt_pdf(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = load_owned_record(&state, &session_user, &id).await?;
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
    let bytes = pdf::record_receipt(&record, &owner).map_err(AppError::Internal)?;

    if !session_user.is_admin() {
        let reference = format!("RECORD_PDF_{id}");
        spend_coins(&state, session_user.username(), RECEIPT_PDF_COST, &reference).await?;
    }
    Ok(pdf_response(&format!("record-{id}.pdf"), bytes))
}
