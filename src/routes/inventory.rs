// Inventory: stock list, low-stock view, and metered item creation.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::format::format_currency;
use crate::models::InventoryItem;
use crate::session::SessionUser;
use crate::state::{
    AppState, create_inventory_item, delete_inventory_item, get_inventory_item_by_id,
    has_coin_balance, list_inventory, list_low_stock, spend_coins, update_inventory_item,
};

use super::helpers::{
    clean_opt, ensure_owner, parse_i64_field, parse_object_id, parse_optional_f64_field,
    parse_optional_i64_field, render,
};

pub const ADD_ITEM_COST: i64 = 1;

#[derive(Template)]
#[template(path = "inventory/index.html")]
struct InventoryIndexTemplate {
    rows: Vec<InventoryRow>,
    low_stock_view: bool,
}

struct InventoryRow {
    id: String,
    item_name: String,
    qty: i64,
    unit: String,
    buying_price: String,
    selling_price: String,
    threshold: i64,
    low: bool,
}

fn to_rows(items: Vec<InventoryItem>) -> Vec<InventoryRow> {
    items
        .into_iter()
        .filter_map(|item| {
            item.id.map(|id| InventoryRow {
                id: id.to_hex(),
                low: item.qty <= item.threshold,
                item_name: item.item_name,
                qty: item.qty,
                unit: item.unit.unwrap_or_default(),
                buying_price: item.buying_price.map(format_currency).unwrap_or_default(),
                selling_price: item.selling_price.map(format_currency).unwrap_or_default(),
                threshold: item.threshold,
            })
        })
        .collect()
}

pub async fn inventory_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let items = list_inventory(&state, session_user.username()).await?;
    render(InventoryIndexTemplate {
        rows: to_rows(items),
        low_stock_view: false,
    })
}

pub async fn inventory_low_stock(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let items = list_low_stock(&state, session_user.username()).await?;
    render(InventoryIndexTemplate {
        rows: to_rows(items),
        low_stock_view: true,
    })
}

#[derive(Template)]
#[template(path = "inventory/form.html")]
struct InventoryFormTemplate {
    action: String,
    item_name: String,
    qty: String,
    unit: String,
    buying_price: String,
    selling_price: String,
    threshold: String,
    is_edit: bool,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct InventoryFormData {
    item_name: String,
    qty: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    buying_price: Option<String>,
    #[serde(default)]
    selling_price: Option<String>,
    #[serde(default)]
    threshold: Option<String>,
}

pub async fn inventory_new(_session_user: SessionUser) -> Result<Html<String>, AppError> {
    render(InventoryFormTemplate {
        action: "/inventory".into(),
        item_name: String::new(),
        qty: String::new(),
        unit: String::new(),
        buying_price: String::new(),
        selling_price: String::new(),
        threshold: String::new(),
        is_edit: false,
        errors: None,
    })
}

struct ParsedItem {
    qty: i64,
    unit: Option<String>,
    buying_price: Option<f64>,
    selling_price: Option<f64>,
    threshold: Option<i64>,
}

fn parse_item(form: &InventoryFormData) -> Result<ParsedItem, String> {
    if form.item_name.trim().is_empty() {
        return Err("Item name is required".to_string());
    }
    Ok(ParsedItem {
        qty: parse_i64_field(&form.qty, "Quantity")?,
        unit: clean_opt(form.unit.clone()),
        buying_price: parse_optional_f64_field(form.buying_price.clone(), "Buying price")?,
        selling_price: parse_optional_f64_field(form.selling_price.clone(), "Selling price")?,
        threshold: parse_optional_i64_field(form.threshold.clone(), "Low stock threshold")?,
    })
}

pub async fn inventory_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<InventoryFormData>,
) -> Result<Response, AppError> {
    if !session_user.is_admin()
        && !has_coin_balance(&state, session_user.username(), ADD_ITEM_COST).await?
    {
        return Ok(Redirect::to("/coins").into_response());
    }

    let parsed = match parse_item(&form) {
        Ok(parsed) => parsed,
        Err(msg) => {
            return render(InventoryFormTemplate {
                action: "/inventory".into(),
                item_name: form.item_name.clone(),
                qty: form.qty.clone(),
                unit: form.unit.clone().unwrap_or_default(),
                buying_price: form.buying_price.clone().unwrap_or_default(),
                selling_price: form.selling_price.clone().unwrap_or_default(),
                threshold: form.threshold.clone().unwrap_or_default(),
                is_edit: false,
                errors: Some(msg),
            })
            .map(IntoResponse::into_response);
        }
    };

    let id = create_inventory_item(
        &state,
        session_user.username(),
        form.item_name.trim(),
        parsed.qty,
        parsed.unit,
        parsed.buying_price,
        parsed.selling_price,
        parsed.threshold,
    )
    .await?;

    if !session_user.is_admin() {
        let reference = format!("ADD_ITEM_{}", id.to_hex());
        spend_coins(&state, session_user.username(), ADD_ITEM_COST, &reference).await?;
    }
    Ok(Redirect::to("/inventory").into_response())
}

async fn load_owned_item(
    state: &AppState,
    session_user: &SessionUser,
    id: &str,
) -> Result<InventoryItem, AppError> {
    let object_id = parse_object_id(id)?;
    let item = get_inventory_item_by_id(state, &object_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(session_user, &item.user_id)?;
    Ok(item)
}

pub async fn inventory_edit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let item = load_owned_item(&state, &session_user, &id).await?;
    render(InventoryFormTemplate {
        action: format!("/inventory/{id}/update"),
        item_name: item.item_name,
        qty: item.qty.to_string(),
        unit: item.unit.unwrap_or_default(),
        buying_price: item.buying_price.map(|p| p.to_string()).unwrap_or_default(),
        selling_price: item.selling_price.map(|p| p.to_string()).unwrap_or_default(),
        threshold: item.threshold.to_string(),
        is_edit: true,
        errors: None,
    })
}

pub async fn inventory_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<InventoryFormData>,
) -> Result<Response, AppError> {
    let _item = load_owned_item(&state, &session_user, &id).await?;

    let parsed = match parse_item(&form) {
        Ok(parsed) => parsed,
        Err(msg) => {
            return render(InventoryFormTemplate {
                action: format!("/inventory/{id}/update"),
                item_name: form.item_name.clone(),
                qty: form.qty.clone(),
                unit: form.unit.clone().unwrap_or_default(),
                buying_price: form.buying_price.clone().unwrap_or_default(),
                selling_price: form.selling_price.clone().unwrap_or_default(),
                threshold: form.threshold.clone().unwrap_or_default(),
                is_edit: true,
                errors: Some(msg),
            })
            .map(IntoResponse::into_response);
        }
    };

    let object_id = parse_object_id(&id)?;
    update_inventory_item(
        &state,
        &object_id,
        form.item_name.trim(),
        parsed.qty,
        parsed.unit,
        parsed.buying_price,
        parsed.selling_price,
        parsed.threshold,
    )
    .await?;
    Ok(Redirect::to("/inventory").into_response())
}

pub async fn inventory_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let _item = load_owned_item(&state, &session_user, &id).await?;
    let object_id = parse_object_id(&id)?;
    delete_inventory_item(&state, &object_id).await?;
    Ok(Redirect::to("/inventory").into_response())
}
