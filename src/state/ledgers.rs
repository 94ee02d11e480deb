// Bookkeeping ledgers: records (debtors/creditors), cashflows
// (receipts/payments) and inventory. All reads and writes are scoped to the
// owning user; admin handlers pass the effective user explicitly.

use anyhow::{Context, Result};
use futures::{io::AsyncWriteExt, stream::TryStreamExt};
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::models::{
    Cashflow, CashflowType, InventoryItem, PaymentMethod, Record, RecordType,
};

use super::AppState;

pub const DEFAULT_STOCK_THRESHOLD: i64 = 5;

// --- records ---

pub async fn list_records(
    state: &AppState,
    user_id: &str,
    record_type: RecordType,
) -> Result<Vec<Record>> {
    let mut cursor = state
        .records
        .find(doc! { "user_id": user_id, "type": record_type.as_str() })
        .sort(doc! { "created_at": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(record) = cursor.try_next().await? {
        items.push(record);
    }
    Ok(items)
}

pub async fn recent_records(state: &AppState, user_id: &str, limit: i64) -> Result<Vec<Record>> {
    let mut cursor = state
        .records
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .limit(limit)
        .await?;
    let mut items = Vec::new();
    while let Some(record) = cursor.try_next().await? {
        items.push(record);
    }
    Ok(items)
}

pub async fn count_records(state: &AppState, user_id: &str) -> Result<u64> {
    state
        .records
        .count_documents(doc! { "user_id": user_id })
        .await
        .map_err(Into::into)
}

pub async fn get_record_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Record>> {
    state
        .records
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_record(
    state: &AppState,
    user_id: &str,
    record_type: RecordType,
    name: &str,
    contact: Option<String>,
    description: Option<String>,
    amount_owed: f64,
) -> Result<ObjectId> {
    let res = state
        .records
        .insert_one(Record {
            id: None,
            user_id: user_id.to_string(),
            record_type,
            name: name.to_string(),
            contact,
            description,
            amount_owed,
            reminder_count: 0,
            created_at: DateTime::from_system_time(SystemTime::now()),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("record insert missing _id")
}

pub async fn update_record(
    state: &AppState,
    id: &ObjectId,
    name: &str,
    contact: Option<String>,
    description: Option<String>,
    amount_owed: f64,
) -> Result<()> {
    state
        .records
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "name": name,
                "contact": contact,
                "description": description,
                "amount_owed": amount_owed,
            } },
        )
        .await?;
    Ok(())
}

pub async fn delete_record(state: &AppState, id: &ObjectId) -> Result<()> {
    state.records.delete_one(doc! { "_id": id }).await?;
    Ok(())
}

pub async fn increment_reminder_count(state: &AppState, id: &ObjectId) -> Result<()> {
    state
        .records
        .update_one(doc! { "_id": id }, doc! { "$inc": { "reminder_count": 1 } })
        .await?;
    Ok(())
}

// --- cashflows ---

pub async fn list_cashflows(
    state: &AppState,
    user_id: &str,
    flow_type: CashflowType,
) -> Result<Vec<Cashflow>> {
    let mut cursor = state
        .cashflows
        .find(doc! { "user_id": user_id, "type": flow_type.as_str() })
        .sort(doc! { "created_at": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(flow) = cursor.try_next().await? {
        items.push(flow);
    }
    Ok(items)
}

/// Cashflows in an optional closed date range, both directions, oldest first.
pub async fn cashflows_in_range(
    state: &AppState,
    user_id: &str,
    from: Option<DateTime>,
    to: Option<DateTime>,
) -> Result<Vec<Cashflow>> {
    let mut filter = doc! { "user_id": user_id };
    let mut range = doc! {};
    if let Some(from) = from {
        range.insert("$gte", from);
    }
    if let Some(to) = to {
        range.insert("$lte", to);
    }
    if !range.is_empty() {
        filter.insert("created_at", range);
    }
    let mut cursor = state
        .cashflows
        .find(filter)
        .sort(doc! { "created_at": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(flow) = cursor.try_next().await? {
        items.push(flow);
    }
    Ok(items)
}

pub async fn recent_cashflows(state: &AppState, user_id: &str, limit: i64) -> Result<Vec<Cashflow>> {
    let mut cursor = state
        .cashflows
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .limit(limit)
        .await?;
    let mut items = Vec::new();
    while let Some(flow) = cursor.try_next().await? {
        items.push(flow);
    }
    Ok(items)
}

pub async fn count_cashflows(state: &AppState, user_id: &str) -> Result<u64> {
    state
        .cashflows
        .count_documents(doc! { "user_id": user_id })
        .await
        .map_err(Into::into)
}

pub async fn get_cashflow_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Cashflow>> {
    state
        .cashflows
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

#[allow(clippy::too_many_arguments)]
pub async fn create_cashflow(
    state: &AppState,
    user_id: &str,
    flow_type: CashflowType,
    party_name: &str,
    amount: f64,
    method: Option<PaymentMethod>,
    category: Option<String>,
    file_id: Option<ObjectId>,
    filename: Option<String>,
) -> Result<ObjectId> {
    let res = state
        .cashflows
        .insert_one(Cashflow {
            id: None,
            user_id: user_id.to_string(),
            flow_type,
            party_name: party_name.to_string(),
            amount,
            method,
            category,
            file_id,
            filename,
            created_at: DateTime::from_system_time(SystemTime::now()),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("cashflow insert missing _id")
}

pub async fn update_cashflow(
    state: &AppState,
    id: &ObjectId,
    party_name: &str,
    amount: f64,
    method: Option<PaymentMethod>,
    category: Option<String>,
) -> Result<()> {
    state
        .cashflows
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "party_name": party_name,
                "amount": amount,
                "method": method.map(|m| m.as_str()),
                "category": category,
            } },
        )
        .await?;
    Ok(())
}

pub async fn delete_cashflow(state: &AppState, id: &ObjectId) -> Result<()> {
    state.cashflows.delete_one(doc! { "_id": id }).await?;
    Ok(())
}

/// Store an uploaded receipt image in GridFS and return its file id.
pub async fn store_receipt_file(
    state: &AppState,
    filename: &str,
    data: &[u8],
) -> Result<ObjectId> {
    let bucket = state.db.gridfs_bucket(None);
    let mut upload = bucket.open_upload_stream(filename).await?;
    upload.write_all(data).await?;
    upload.close().await?;
    upload
        .id()
        .as_object_id()
        .context("gridfs upload missing object id")
}

// --- inventory ---

pub async fn list_inventory(state: &AppState, user_id: &str) -> Result<Vec<InventoryItem>> {
    let mut cursor = state
        .inventory
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(item) = cursor.try_next().await? {
        items.push(item);
    }
    Ok(items)
}

pub async fn list_low_stock(state: &AppState, user_id: &str) -> Result<Vec<InventoryItem>> {
    let mut cursor = state
        .inventory
        .find(doc! {
            "user_id": user_id,
            "$expr": { "$lte": ["$qty", "$threshold"] },
        })
        .sort(doc! { "qty": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(item) = cursor.try_next().await? {
        items.push(item);
    }
    Ok(items)
}

pub async fn count_inventory(state: &AppState, user_id: &str) -> Result<u64> {
    state
        .inventory
        .count_documents(doc! { "user_id": user_id })
        .await
        .map_err(Into::into)
}

pub async fn get_inventory_item_by_id(
    state: &AppState,
    id: &ObjectId,
) -> Result<Option<InventoryItem>> {
    state
        .inventory
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

#[allow(clippy::too_many_arguments)]
pub async fn create_inventory_item(
    state: &AppState,
    user_id: &str,
    item_name: &str,
    qty: i64,
    unit: Option<String>,
    buying_price: Option<f64>,
    selling_price: Option<f64>,
    threshold: Option<i64>,
) -> Result<ObjectId> {
    let res = state
        .inventory
        .insert_one(InventoryItem {
            id: None,
            user_id: user_id.to_string(),
            item_name: item_name.to_string(),
            qty,
            unit,
            buying_price,
            selling_price,
            threshold: threshold.unwrap_or(DEFAULT_STOCK_THRESHOLD),
            created_at: DateTime::from_system_time(SystemTime::now()),
            updated_at: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("inventory insert missing _id")
}

#[allow(clippy::too_many_arguments)]
pub async fn update_inventory_item(
    state: &AppState,
    id: &ObjectId,
    item_name: &str,
    qty: i64,
    unit: Option<String>,
    buying_price: Option<f64>,
    selling_price: Option<f64>,
    threshold: Option<i64>,
) -> Result<()> {
    state
        .inventory
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "item_name": item_name,
                "qty": qty,
                "unit": unit,
                "buying_price": buying_price,
                "selling_price": selling_price,
                "threshold": threshold.unwrap_or(DEFAULT_STOCK_THRESHOLD),
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;
    Ok(())
}

pub async fn delete_inventory_item(state: &AppState, id: &ObjectId) -> Result<()> {
    state.inventory.delete_one(doc! { "_id": id }).await?;
    Ok(())
}
