// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;
use mongodb::{Client, Collection, Database, bson::doc};
use std::env;

use crate::models::{
    AgentActivity, AuditLog, Bill, Budget, Cashflow, CoinTransaction, EmergencyFundRecord,
    Feedback, HealthScoreRecord, InventoryItem, LearningModule, LearningProgress, NetWorthRecord,
    QuizResult, Record, ReminderLog, Session, ToolUsage, User,
};

mod coins;
mod ledgers;
mod logs;
mod personal;
mod seed;
mod users;

pub use coins::*;
pub use ledgers::*;
pub use logs::*;
pub use personal::*;
pub use users::*;

pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 24; // 1 day
pub const OTP_TTL_SECONDS: u64 = 60 * 5;
pub const RESET_TOKEN_TTL_SECONDS: u64 = 60 * 60;

/// Coins granted once at signup.
pub const SIGNUP_BONUS_COINS: i64 = 10;

#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub db: Database,
    /// Multi-document transactions need a replica set or mongos; standalone
    /// deployments fall back to sequential writes.
    pub supports_transactions: bool,
    pub users: Collection<User>,
    pub sessions: Collection<Session>,
    pub records: Collection<Record>,
    pub cashflows: Collection<Cashflow>,
    pub inventory: Collection<InventoryItem>,
    pub coin_transactions: Collection<CoinTransaction>,
    pub audit_logs: Collection<AuditLog>,
    pub agent_activities: Collection<AgentActivity>,
    pub reminder_logs: Collection<ReminderLog>,
    pub feedback: Collection<Feedback>,
    pub tool_usage: Collection<ToolUsage>,
    pub budgets: Collection<Budget>,
    pub bills: Collection<Bill>,
    pub net_worth_data: Collection<NetWorthRecord>,
    pub emergency_funds: Collection<EmergencyFundRecord>,
    pub financial_health_scores: Collection<HealthScoreRecord>,
    pub quiz_responses: Collection<QuizResult>,
    pub learning_materials: Collection<LearningModule>,
    pub learning_progress: Collection<LearningProgress>,
}

pub async fn init_state() -> Result<AppState> {
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| "ficore".to_string());

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&db_name);

    seed::ensure_collections(&db).await?;
    seed::ensure_indexes(&db).await?;
    seed::seed_admin_user(&db).await?;
    seed::seed_learning_materials(&db).await?;

    let hello = db.run_command(doc! { "hello": 1 }).await?;
    let supports_transactions = hello.get_str("setName").is_ok()
        || hello.get_str("msg").map(|m| m == "isdbgrid").unwrap_or(false);

    Ok(AppState {
        client,
        supports_transactions,
        users: db.collection::<User>("users"),
        sessions: db.collection::<Session>("sessions"),
        records: db.collection::<Record>("records"),
        cashflows: db.collection::<Cashflow>("cashflows"),
        inventory: db.collection::<InventoryItem>("inventory"),
        coin_transactions: db.collection::<CoinTransaction>("coin_transactions"),
        audit_logs: db.collection::<AuditLog>("audit_logs"),
        agent_activities: db.collection::<AgentActivity>("agent_activities"),
        reminder_logs: db.collection::<ReminderLog>("reminder_logs"),
        feedback: db.collection::<Feedback>("feedback"),
        tool_usage: db.collection::<ToolUsage>("tool_usage"),
        budgets: db.collection::<Budget>("budgets"),
        bills: db.collection::<Bill>("bills"),
        net_worth_data: db.collection::<NetWorthRecord>("net_worth_data"),
        emergency_funds: db.collection::<EmergencyFundRecord>("emergency_funds"),
        financial_health_scores: db.collection::<HealthScoreRecord>("financial_health_scores"),
        quiz_responses: db.collection::<QuizResult>("quiz_responses"),
        learning_materials: db.collection::<LearningModule>("learning_materials"),
        learning_progress: db.collection::<LearningProgress>("learning_progress"),
        db,
    })
}
