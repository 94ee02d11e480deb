// Collection bootstrap: creation, indexes, and the default admin account plus
// the learning-hub content. Index set mirrors the production deployment.

use anyhow::Result;
use mongodb::{
    Database, IndexModel,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use std::{env, time::SystemTime};

use crate::i18n::Lang;
use crate::models::{LearningModule, User, UserRole};

const COLLECTIONS: &[&str] = &[
    "users",
    "sessions",
    "records",
    "cashflows",
    "inventory",
    "coin_transactions",
    "audit_logs",
    "agent_activities",
    "reminder_logs",
    "feedback",
    "tool_usage",
    "budgets",
    "bills",
    "net_worth_data",
    "emergency_funds",
    "financial_health_scores",
    "quiz_responses",
    "learning_materials",
    "learning_progress",
];

pub(super) async fn ensure_collections(db: &Database) -> Result<()> {
    let existing = db.list_collection_names().await?;
    for name in COLLECTIONS {
        if !existing.iter().any(|c| c == name) {
            db.create_collection(*name).await?;
        }
    }
    Ok(())
}

fn unique_index(keys: mongodb::bson::Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(name.to_string())
                .build(),
        )
        .build()
}

fn index(keys: mongodb::bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

pub(super) async fn ensure_indexes(db: &Database) -> Result<()> {
    db.collection::<User>("users")
        .create_indexes(vec![
            unique_index(doc! { "email": 1 }, "email_unique"),
            index(doc! { "role": 1 }),
        ])
        .await
        .ok();
    db.collection::<mongodb::bson::Document>("sessions")
        .create_indexes(vec![unique_index(doc! { "token": 1 }, "token_unique")])
        .await
        .ok();
    db.collection::<mongodb::bson::Document>("records")
        .create_indexes(vec![
            index(doc! { "user_id": 1, "type": 1 }),
            index(doc! { "created_at": -1 }),
        ])
        .await
        .ok();
    db.collection::<mongodb::bson::Document>("cashflows")
        .create_indexes(vec![
            index(doc! { "user_id": 1, "type": 1 }),
            index(doc! { "created_at": -1 }),
        ])
        .await
        .ok();
    db.collection::<mongodb::bson::Document>("inventory")
        .create_indexes(vec![index(doc! { "user_id": 1 })])
        .await
        .ok();
    db.collection::<mongodb::bson::Document>("coin_transactions")
        .create_indexes(vec![
            index(doc! { "user_id": 1 }),
            index(doc! { "date": -1 }),
        ])
        .await
        .ok();
    db.collection::<mongodb::bson::Document>("audit_logs")
        .create_indexes(vec![index(doc! { "timestamp": -1 })])
        .await
        .ok();
    db.collection::<mongodb::bson::Document>("agent_activities")
        .create_indexes(vec![
            index(doc! { "agent_id": 1 }),
            index(doc! { "timestamp": -1 }),
        ])
        .await
        .ok();
    Ok(())
}

/// Seed one admin account when none exists, credentials from the environment.
/// Skipped entirely unless ADMIN_PASSWORD is set.
pub(super) async fn seed_admin_user(db: &Database) -> Result<()> {
    let Ok(password) = env::var("ADMIN_PASSWORD") else {
        return Ok(());
    };
    let users = db.collection::<User>("users");
    if users.find_one(doc! { "role": "admin" }).await?.is_some() {
        return Ok(());
    }
    let username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@ficore.local".to_string());
    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;
    users
        .insert_one(User {
            username,
            email,
            password_hash,
            role: UserRole::Admin,
            coin_balance: 0,
            language: Lang::En,
            display_name: None,
            setup_complete: true,
            suspended: false,
            email_notifications: true,
            sms_notifications: false,
            otp: None,
            otp_expiry: None,
            reset_token: None,
            reset_token_expiry: None,
            business_details: None,
            personal_details: None,
            agent_details: None,
            created_at: DateTime::from_system_time(SystemTime::now()),
        })
        .await?;
    Ok(())
}

pub(super) async fn seed_learning_materials(db: &Database) -> Result<()> {
    let materials = db.collection::<LearningModule>("learning_materials");
    if materials.find_one(doc! {}).await?.is_some() {
        return Ok(());
    }
    let now = DateTime::from_system_time(SystemTime::now());
    let modules = vec![
        LearningModule {
            id: "budgeting-basics".to_string(),
            title: "Budgeting Basics".to_string(),
            summary: "Plan your monthly income and expenses.".to_string(),
            sections: vec![
                "A budget is a plan for every naira you earn. Start by listing your income, then your fixed costs like rent and transport.".to_string(),
                "Pay yourself first: move savings out before discretionary spending begins.".to_string(),
                "Review the plan at the end of each month and adjust categories that were over or under.".to_string(),
            ],
            created_at: now,
        },
        LearningModule {
            id: "emergency-funds".to_string(),
            title: "Why You Need an Emergency Fund".to_string(),
            summary: "Protect yourself against income shocks.".to_string(),
            sections: vec![
                "An emergency fund covers three to twelve months of expenses, depending on how stable your income is.".to_string(),
                "Keep it separate from your spending account so it is not quietly consumed.".to_string(),
            ],
            created_at: now,
        },
        LearningModule {
            id: "debt-management".to_string(),
            title: "Managing Debt".to_string(),
            summary: "Track debtors and creditors without losing friendships.".to_string(),
            sections: vec![
                "Write every debt down the day it happens. Memory is the most expensive ledger.".to_string(),
                "Send polite reminders on a schedule rather than waiting until the relationship is strained.".to_string(),
            ],
            created_at: now,
        },
    ];
    materials.insert_many(modules).await?;
    Ok(())
}
