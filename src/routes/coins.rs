// Coin purchase, history, the balance API and receipt upload. All balance
// mutations go through the engine in state::coins.

use std::sync::Arc;

use askama::Template;
use axum::{
    Json,
    extract::{Form, Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use mongodb::bson::doc;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::format::format_datetime;
use crate::models::CoinTxKind;
use crate::session::SessionUser;
use crate::state::{
    AppState, CoinCredit, credit_coins, get_balance, has_coin_balance, list_coin_transactions,
    log_audit_action, spend_coins, store_receipt_file,
};

use super::helpers::{SimpleOption, render};

pub const RECEIPT_UPLOAD_COST: i64 = 1;
const PURCHASE_AMOUNTS: &[i64] = &[10, 50, 100];

#[derive(Template)]
#[template(path = "coins/purchase.html")]
struct PurchaseTemplate {
    amounts: Vec<SimpleOption>,
    errors: Option<String>,
}

fn amount_options(selected: i64) -> Vec<SimpleOption> {
    PURCHASE_AMOUNTS
        .iter()
        .map(|amount| SimpleOption {
            value: amount.to_string(),
            label: format!("{amount} coins"),
            selected: *amount == selected,
        })
        .collect()
}

#[derive(Deserialize)]
pub struct PurchaseForm {
    amount: String,
    payment_method: String,
}

pub async fn purchase_page(_session_user: SessionUser) -> Result<Html<String>, AppError> {
    render(PurchaseTemplate {
        amounts: amount_options(10),
        errors: None,
    })
}

pub async fn purchase(
    State(state): State<Arc<AppState>>,
    session_user: SessionUser,
    Form(form): Form<PurchaseForm>,
) -> Result<Response, AppError> {
    let amount = match form.amount.trim().parse::<i64>() {
        Ok(amount) if PURCHASE_AMOUNTS.contains(&amount) => amount,
        _ => {
            return render(PurchaseTemplate {
                amounts: amount_options(10),
                errors: Some("Select a valid coin amount".to_string()),
            })
            .map(IntoResponse::into_response);
        }
    };

    let reference = format!("PAY_{}", uuid::Uuid::new_v4());
    credit_coins(
        &state,
        CoinCredit {
            user_id: session_user.username(),
            amount,
            kind: CoinTxKind::Purchase,
            reference: &reference,
            actor: "system",
            payment_method: Some(form.payment_method.clone()),
            facilitated_by_agent: None,
        },
    )
    .await?;
    tracing::info!(
        "user {} purchased {amount} coins via {}",
        session_user.username(),
        form.payment_method
    );
    Ok(Redirect::to("/coins/history").into_response())
}

#[derive(Template)]
#[template(path = "coins/history.html")]
struct HistoryTemplate {
    balance: i64,
    rows: Vec<CoinTxRow>,
}

struct CoinTxRow {
    date: String,
    kind: String,
    amount: i64,
    reference: String,
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    session_user: SessionUser,
) -> Result<Html<String>, AppError> {
    let balance = get_balance(&state, session_user.username())
        .await?
        .ok_or(AppError::UserNotFound)?;
    let rows = list_coin_transactions(&state, session_user.username(), 100)
        .await?
        .into_iter()
        .map(|tx| CoinTxRow {
            date: format_datetime(&tx.date),
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount,
            reference: tx.reference,
        })
        .collect();
    render(HistoryTemplate { balance, rows })
}

pub async fn balance(
    State(state): State<Arc<AppState>>,
    session_user: SessionUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let balance = get_balance(&state, session_user.username())
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(json!({ "balance": balance })))
}

#[derive(Template)]
#[template(path = "coins/receipt_upload.html")]
struct ReceiptUploadTemplate {
    errors: Option<String>,
}

pub async fn receipt_upload_page(_session_user: SessionUser) -> Result<Html<String>, AppError> {
    render(ReceiptUploadTemplate { errors: None })
}

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

pub async fn receipt_upload(
    State(state): State<Arc<AppState>>,
    session_user: SessionUser,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    if !session_user.is_admin()
        && !has_coin_balance(&state, session_user.username(), RECEIPT_UPLOAD_COST).await?
    {
        return Ok(Redirect::to("/coins").into_response());
    }

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(err.to_string()))?
    {
        if field.name() == Some("receipt") {
            let filename = field.file_name().unwrap_or("receipt").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|err| AppError::Validation(err.to_string()))?;
            file = Some((filename, data.to_vec()));
        }
    }

    let Some((filename, data)) = file else {
        return render(ReceiptUploadTemplate {
            errors: Some("Attach a receipt file".to_string()),
        })
        .map(IntoResponse::into_response);
    };
    let extension_ok = filename
        .rsplit('.')
        .next()
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false);
    if !extension_ok || data.is_empty() {
        return render(ReceiptUploadTemplate {
            errors: Some("Only JPG, PNG, or PDF files are allowed".to_string()),
        })
        .map(IntoResponse::into_response);
    }

    let file_id = store_receipt_file(&state, &filename, &data).await?;
    let reference = format!("RECEIPT_UPLOAD_{file_id}");
    if !session_user.is_admin() {
        spend_coins(&state, session_user.username(), RECEIPT_UPLOAD_COST, &reference).await?;
    }
    log_audit_action(
        &state,
        "system",
        "receipt_upload",
        Some(doc! {
            "user_id": session_user.username(),
            "file_id": file_id.to_hex(),
            "ref": &reference,
        }),
    )
    .await?;
    tracing::info!("user {} uploaded receipt {file_id}", session_user.username());
    Ok(Redirect::to("/coins/history").into_response())
}
